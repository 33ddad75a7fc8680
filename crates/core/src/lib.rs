pub mod domain;
pub mod llm;
pub mod time;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub api_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let api_key = first_non_blank([
                std::env::var("API_KEY").ok(),
                std::env::var("GEMINI_API_KEY").ok(),
            ]);

            Ok(Self {
                api_key,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_api_key(&self) -> anyhow::Result<&str> {
            self.api_key
                .as_deref()
                .context("API_KEY (or GEMINI_API_KEY) is required")
        }
    }

    fn first_non_blank<const N: usize>(values: [Option<String>; N]) -> Option<String> {
        values
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }

}
