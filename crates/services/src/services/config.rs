//! Environment-derived configuration.

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite:data.db?mode=rwc";
const DEFAULT_LIFF_URL: &str = "https://liff.line.me/app";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Bearer token for the LINE push API. When absent, every outbound send
    /// fails locally without a network call; primary workflows are unaffected.
    pub line_channel_access_token: Option<String>,
    /// Base URL of the web client, used to build deep links in cards.
    pub liff_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let line_channel_access_token = std::env::var("LINE_CHANNEL_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        let liff_url = std::env::var("LIFF_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_LIFF_URL.to_string());

        Self {
            port,
            database_url,
            line_channel_access_token,
            liff_url,
        }
    }
}
