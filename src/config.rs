use std::time::Duration;

use url::Url;

const API_URL_VAR: &str = "NEWSROOM_API_URL";
const WS_URL_VAR: &str = "NEWSROOM_WS_URL";
const TOKEN_VAR: &str = "NEWSROOM_TOKEN";
const TIMEOUT_VAR: &str = "NEWSROOM_REQUEST_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the remote notification store.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub ws_url: Url,
    pub token: String,
    pub request_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid url in {0}: {1}")]
    InvalidUrl(&'static str, url::ParseError),

    #[error("invalid value in {0}: {1}")]
    InvalidTimeout(&'static str, String),
}

impl ClientConfig {
    pub fn new(api_url: Url, ws_url: Url, token: String, request_timeout: Duration) -> Self {
        Self {
            api_url,
            ws_url,
            token,
            request_timeout,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_base_url(API_URL_VAR, required(API_URL_VAR)?)?;
        let ws_url = required(WS_URL_VAR)?
            .parse()
            .map_err(|err| ConfigError::InvalidUrl(WS_URL_VAR, err))?;
        let token = required(TOKEN_VAR)?;

        let request_timeout = match std::env::var(TIMEOUT_VAR) {
            Ok(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout(TIMEOUT_VAR, raw))?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            ws_url,
            token,
            request_timeout,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

/// A base URL joins cleanly only with a trailing slash; add one if missing.
fn parse_base_url(name: &'static str, mut raw: String) -> Result<Url, ConfigError> {
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|err| ConfigError::InvalidUrl(name, err))
}
