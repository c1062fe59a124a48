use anyhow::Context;
use std::path::PathBuf;

/// Fixed slot name, mirroring the dashboard's `user_watchlist` storage key.
pub const DEFAULT_SLOT_PATH: &str = "user_watchlist.json";

const DEFAULT_TICKERS: [&str; 3] = ["AAPL", "NVDA", "TSLA"];

/// Ordered, duplicate-free set of tickers persisted to a local JSON slot. Loaded once at
/// startup; every mutation rewrites the file. Single-writer discipline only; multi-writer
/// coordination is out of scope.
#[derive(Debug)]
pub struct WatchlistStore {
    path: PathBuf,
    tickers: Vec<String>,
}

impl WatchlistStore {
    /// A missing slot yields the documented default set (persisted on first mutation).
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let tickers = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<Vec<String>>(&raw)
                .with_context(|| format!("watchlist slot is not valid JSON: {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect()
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read watchlist slot: {}", path.display()))
            }
        };
        Ok(Self { path, tickers })
    }

    pub fn list(&self) -> &[String] {
        &self.tickers
    }

    /// Returns false when the ticker was already present (no write happens).
    pub fn add(&mut self, ticker: &str) -> anyhow::Result<bool> {
        let ticker = ticker.trim().to_uppercase();
        anyhow::ensure!(!ticker.is_empty(), "ticker must be non-empty");
        if self.tickers.iter().any(|t| t == &ticker) {
            return Ok(false);
        }
        self.tickers.push(ticker);
        self.persist()?;
        Ok(true)
    }

    /// Returns false when the ticker was not present.
    pub fn remove(&mut self, ticker: &str) -> anyhow::Result<bool> {
        let ticker = ticker.trim().to_uppercase();
        let before = self.tickers.len();
        self.tickers.retain(|t| t != &ticker);
        if self.tickers.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(&self.tickers)
            .context("failed to serialize watchlist")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write watchlist slot: {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlotFile(PathBuf);

    impl SlotFile {
        fn new(label: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "alphasignal-watchlist-{label}-{}.json",
                std::process::id()
            ));
            let _ = std::fs::remove_file(&path);
            Self(path)
        }
    }

    impl Drop for SlotFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn missing_slot_loads_the_default_set() {
        let slot = SlotFile::new("defaults");
        let store = WatchlistStore::load(&slot.0).unwrap();
        assert_eq!(store.list(), ["AAPL", "NVDA", "TSLA"]);
    }

    #[test]
    fn mutations_persist_across_reload() {
        let slot = SlotFile::new("reload");
        {
            let mut store = WatchlistStore::load(&slot.0).unwrap();
            assert!(store.add("msft").unwrap());
            assert!(store.remove("TSLA").unwrap());
        }
        let store = WatchlistStore::load(&slot.0).unwrap();
        assert_eq!(store.list(), ["AAPL", "NVDA", "MSFT"]);
    }

    #[test]
    fn duplicates_are_rejected_without_reordering() {
        let slot = SlotFile::new("dup");
        let mut store = WatchlistStore::load(&slot.0).unwrap();
        assert!(!store.add("aapl").unwrap());
        assert_eq!(store.list(), ["AAPL", "NVDA", "TSLA"]);
    }

    #[test]
    fn removing_an_absent_ticker_is_a_noop() {
        let slot = SlotFile::new("absent");
        let mut store = WatchlistStore::load(&slot.0).unwrap();
        assert!(!store.remove("GME").unwrap());
        assert_eq!(store.list().len(), 3);
    }

    #[test]
    fn corrupt_slot_is_an_error_not_a_silent_reset() {
        let slot = SlotFile::new("corrupt");
        std::fs::write(&slot.0, "not json").unwrap();
        assert!(WatchlistStore::load(&slot.0).is_err());
    }
}
