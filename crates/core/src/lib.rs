pub mod analyze;
pub mod domain;
pub mod llm;
pub mod storage;

pub mod config {
    #[derive(Debug, Clone)]
    pub struct Settings {
        pub gemini_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub watchlist_path: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                watchlist_path: std::env::var("WATCHLIST_PATH").ok(),
            })
        }

        /// The credential, only when it is actually usable. Deployment plumbing has been
        /// observed to inject an empty string or the literal word "undefined"; both count
        /// as missing.
        pub fn usable_gemini_api_key(&self) -> Option<&str> {
            self.gemini_api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty() && *k != "undefined")
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn settings_with_key(key: Option<&str>) -> Settings {
            Settings {
                gemini_api_key: key.map(str::to_string),
                sentry_dsn: None,
                watchlist_path: None,
            }
        }

        #[test]
        fn unusable_key_spellings_count_as_missing() {
            assert_eq!(settings_with_key(None).usable_gemini_api_key(), None);
            assert_eq!(settings_with_key(Some("")).usable_gemini_api_key(), None);
            assert_eq!(settings_with_key(Some("  ")).usable_gemini_api_key(), None);
            assert_eq!(settings_with_key(Some("undefined")).usable_gemini_api_key(), None);
            assert_eq!(
                settings_with_key(Some("sk-live")).usable_gemini_api_key(),
                Some("sk-live")
            );
        }
    }
}
