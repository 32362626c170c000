pub mod advisor;
pub mod datasets;
pub mod domain;
pub mod llm;
pub mod site;
pub mod strumenti;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    const DEFAULT_DATA_DIR: &str = "data";
    const DEFAULT_SITE_BASE_URL: &str = "https://www.patrimonioadvisory.it";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub anthropic_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub data_dir: PathBuf,
        pub fallback_dir: Option<PathBuf>,
        pub site_base_url: String,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                data_dir: std::env::var("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
                fallback_dir: std::env::var("FALLBACK_DIR").ok().map(PathBuf::from),
                site_base_url: std::env::var("SITE_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_SITE_BASE_URL.to_string()),
            })
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }
    }
}
