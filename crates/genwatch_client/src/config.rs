use std::time::Duration;

use genwatch_core::IndicatorSettings;
use url::Url;

use crate::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

const API_URL_VAR: &str = "GENWATCH_API_URL";
const ACTIVE_POLL_VAR: &str = "GENWATCH_ACTIVE_POLL_SECS";
const JOB_POLL_VAR: &str = "GENWATCH_JOB_POLL_SECS";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// REST base, including the API version segment.
    pub api_base_url: Url,
    pub request_timeout: Duration,
    pub active_poll_interval: Duration,
    pub job_poll_interval: Duration,
    pub reconnect_delay: Duration,
    pub indicator: IndicatorSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_URL).expect("default api url is valid"),
            request_timeout: Duration::from_secs(900),
            active_poll_interval: Duration::from_secs(5),
            job_poll_interval: Duration::from_secs(2),
            reconnect_delay: Duration::from_secs(1),
            indicator: IndicatorSettings::default(),
        }
    }
}

impl ClientSettings {
    pub fn with_api_url(url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_http_url(url)?,
            ..Self::default()
        })
    }

    /// Reads overrides from the process environment; unset variables keep defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = match std::env::var(API_URL_VAR) {
            Ok(url) => Self::with_api_url(&url)?,
            Err(_) => Self::default(),
        };
        if let Some(secs) = env_secs(ACTIVE_POLL_VAR)? {
            settings.active_poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_secs(JOB_POLL_VAR)? {
            settings.job_poll_interval = Duration::from_secs(secs);
        }
        Ok(settings)
    }

    /// Push channel endpoint: the REST base without its `/api/vN` suffix,
    /// on the matching WebSocket scheme.
    pub fn push_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.api_base_url.clone();
        let path = url.path().trim_end_matches('/').to_string();
        let stripped = match path.rsplit_once('/') {
            Some((head, last)) if is_api_version(last) && head.ends_with("/api") => {
                head.trim_end_matches("/api").to_string()
            }
            _ => path,
        };
        url.set_path(if stripped.is_empty() { "/" } else { &stripped });

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        url.set_scheme(scheme)
            .map_err(|()| ConfigError::UnsupportedScheme(scheme.to_string()))?;
        Ok(url)
    }
}

fn parse_http_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

fn is_api_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

fn env_secs(name: &'static str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}
