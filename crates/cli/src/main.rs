use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alphasignal_core::analyze::Analyzer;
use alphasignal_core::domain::report::{AnalysisReport, CheckStatus};
use alphasignal_core::llm::error::AnalysisError;

#[derive(Debug, Parser)]
#[command(name = "alphasignal_cli")]
struct Args {
    /// US stock ticker to analyze (e.g. NVDA).
    ticker: String,

    /// Print the raw report JSON instead of the text rendering.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = alphasignal_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let analyzer = Analyzer::from_settings(&settings)?;

    match analyzer.analyze(&args.ticker).await {
        Ok(report) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("serialize report failed")?
                );
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Err(err) => {
            let err_report = anyhow::Error::new(err.clone());
            sentry_anyhow::capture_anyhow(&err_report);
            match &err {
                AnalysisError::AllTargetsExhausted {
                    quota_exceeded: true,
                    ..
                } => {
                    tracing::error!(error = %err, "all model tiers hit quota limits; wait ~30s and retry")
                }
                _ => tracing::error!(error = %err, "analysis failed"),
            }
            Err(err_report)
        }
    }
}

fn print_report(report: &AnalysisReport) {
    println!("== {} ({}) ==", report.ticker, report.timestamp);
    println!(
        "{} {} ({})  cap={} vol={} pe={} rating={}",
        report.metrics.current_price,
        report.metrics.change_amount,
        report.metrics.change_percent,
        report.metrics.market_cap,
        report.metrics.volume,
        report.metrics.pe_ratio,
        report.metrics.rating,
    );

    let setup = &report.trade_setup;
    println!();
    println!(
        "Verdict: {:?} (confidence {})",
        setup.verdict, setup.confidence_score
    );
    println!("  {}", setup.verdict_reason);
    println!(
        "  entry={}  target={}  stop={}",
        setup.entry_zone, setup.target_price, setup.stop_loss
    );

    if !report.checklist.is_empty() {
        println!();
        println!("Checklist:");
        for item in &report.checklist {
            let mark = match item.status {
                CheckStatus::Pass => "✅",
                CheckStatus::Warn => "⚠️",
                CheckStatus::Fail => "❌",
            };
            println!("  {mark} {}: {}", item.name, item.detail);
        }
    }

    println!();
    println!("Summary:\n{}", report.summary);
    println!();
    println!("Technical analysis:\n{}", report.technical_analysis);

    if !report.news.is_empty() {
        println!();
        println!("News:");
        for item in &report.news {
            println!("  - {} ({})", item.title, item.source);
            println!("    {}", item.snippet);
            if let Some(url) = &item.url {
                println!("    {url}");
            }
        }
    }

    if !report.grounding_sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &report.grounding_sources {
            println!("  - {} <{}>", source.title, source.uri);
        }
    }
}

fn init_sentry(settings: &alphasignal_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
