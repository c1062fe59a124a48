use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alphasignal_core::analyze::Analyzer;
use alphasignal_core::domain::report::AnalysisReport;
use alphasignal_core::llm::error::AnalysisError;
use alphasignal_core::storage::watchlist::{WatchlistStore, DEFAULT_SLOT_PATH};

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

    // Missing credential is fatal configuration: refuse to start rather than fail on the
    // first search.
    let analyzer = match Analyzer::from_settings(&settings) {
        Ok(analyzer) => Arc::new(analyzer),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "analyzer configuration failed; refusing to start");
            return Err(e);
        }
    };

    let slot_path = settings
        .watchlist_path
        .clone()
        .unwrap_or_else(|| DEFAULT_SLOT_PATH.to_string());
    let watchlist = WatchlistStore::load(slot_path.as_str())?;
    tracing::info!(slot = %slot_path, tickers = watchlist.list().len(), "watchlist loaded");

    let state = AppState {
        analyzer,
        watchlist: Arc::new(Mutex::new(watchlist)),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/analyze/:ticker", get(get_analysis))
        .route("/watchlist", get(get_watchlist))
        .route(
            "/watchlist/:ticker",
            post(add_to_watchlist).delete(remove_from_watchlist),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    analyzer: Arc<Analyzer>,
    watchlist: Arc<Mutex<WatchlistStore>>,
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<AnalysisReport>, ApiError> {
    state
        .analyzer
        .analyze(&ticker)
        .await
        .map(Json)
        .map_err(ApiError::from_analysis)
}

async fn get_watchlist(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.watchlist.lock().await.list().to_vec())
}

async fn add_to_watchlist(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.watchlist.lock().await.add(&ticker) {
        Ok(true) => Ok(StatusCode::CREATED),
        Ok(false) => Ok(StatusCode::OK),
        Err(e) => Err(ApiError::internal(e)),
    }
}

async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.watchlist.lock().await.remove(&ticker) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Ok(StatusCode::NOT_FOUND),
        Err(e) => Err(ApiError::internal(e)),
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn from_analysis(err: AnalysisError) -> Self {
        let (status, message) = match &err {
            AnalysisError::EmptyTicker => {
                (StatusCode::BAD_REQUEST, "请输入有效的股票代码。".to_string())
            }
            AnalysisError::MissingApiKey => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "API Key is missing. Check the GEMINI_API_KEY environment variable.".to_string(),
            ),
            AnalysisError::AllTargetsExhausted {
                quota_exceeded: true,
                ..
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "API 调用过于频繁 (Quota Exceeded)。所有备用模型均繁忙，请等待 30 秒后再次尝试。"
                    .to_string(),
            ),
            AnalysisError::AllTargetsExhausted { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AI 服务繁忙，请稍后重试。".to_string(),
            ),
            AnalysisError::UnparseableResponse { .. } => (
                StatusCode::BAD_GATEWAY,
                "获取分析失败，请稍后重试或检查股票代码。".to_string(),
            ),
        };

        if status.is_server_error() {
            sentry_anyhow::capture_anyhow(&anyhow::Error::new(err.clone()));
            tracing::error!(error = %err, "analysis failed");
        } else {
            tracing::warn!(error = %err, "analysis rejected");
        }

        Self { status, message }
    }

    fn internal(err: anyhow::Error) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "watchlist persistence failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "watchlist update failed".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
