use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Cap on simultaneously active notifications. `None` = unlimited.
    pub notification_max_active: Option<usize>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            notification_max_active: parse_max_active(
                std::env::var("NOTIFICATION_MAX_ACTIVE").ok().as_deref(),
            )?,
        })
    }
}

fn parse_max_active(raw: Option<&str>) -> Result<Option<usize>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            let max = value
                .parse::<usize>()
                .with_context(|| format!("NOTIFICATION_MAX_ACTIVE must be a positive integer, got '{value}'"))?;
            anyhow::ensure!(max > 0, "NOTIFICATION_MAX_ACTIVE must be greater than zero");
            Ok(Some(max))
        }
    }
}
