pub mod apply;
pub mod error;
pub mod format;
pub mod panels;
pub mod render;
pub mod snapshot;
pub mod time;
pub mod valuation;

pub mod config {
    use anyhow::Context;

    const DEFAULT_LOCATIONS: [&str; 2] = ["data.json", "data-3.json"];
    const DEFAULT_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_PORT: u16 = 3000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub snapshot_base_url: Option<String>,
        pub snapshot_locations: Vec<String>,
        pub snapshot_timeout_secs: u64,
        pub sentry_dsn: Option<String>,
        pub port: u16,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let snapshot_locations = std::env::var("SNAPSHOT_LOCATIONS")
                .ok()
                .map(|s| parse_locations(&s))
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_LOCATIONS.iter().map(|s| s.to_string()).collect());

            let snapshot_timeout_secs = match std::env::var("SNAPSHOT_TIMEOUT_SECS") {
                Ok(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("SNAPSHOT_TIMEOUT_SECS is not a number: {s}"))?,
                Err(_) => DEFAULT_TIMEOUT_SECS,
            };

            let port = std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT);

            Ok(Self {
                snapshot_base_url: std::env::var("SNAPSHOT_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                snapshot_locations,
                snapshot_timeout_secs,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                port,
            })
        }

        pub fn require_snapshot_base_url(&self) -> anyhow::Result<&str> {
            self.snapshot_base_url
                .as_deref()
                .context("SNAPSHOT_BASE_URL is required")
        }
    }

    pub fn parse_locations(s: &str) -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }

}
