use std::time::Duration;

use crate::util::join_base_path;

pub const PRODUCTION_BASE_URL: &str = "https://public.api.socio.events";
pub const SANDBOX_BASE_URL: &str = "https://public.sandbox-api.socio.events";
pub const LOCAL_BASE_URL: &str = "http://localhost:8080";
pub const GRAPHQL_PATH: &str = "/graphql";

const LIVE_TOKEN_PREFIX: &str = "sk_live";
const TEST_TOKEN_PREFIX: &str = "sk_test";

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_RETRY_BACKOFF_UNIT: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Production,
    Sandbox,
    Local,
}

impl Platform {
    /// Live keys go to production, test keys to the sandbox, anything else
    /// to a local server.
    pub fn from_access_token(access_token: &str) -> Self {
        if access_token.starts_with(LIVE_TOKEN_PREFIX) {
            Self::Production
        } else if access_token.starts_with(TEST_TOKEN_PREFIX) {
            Self::Sandbox
        } else {
            Self::Local
        }
    }

    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_BASE_URL,
            Self::Sandbox => SANDBOX_BASE_URL,
            Self::Local => LOCAL_BASE_URL,
        }
    }
}

/// Client-wide settings, read-only once a [`crate::Client`] is built.
#[derive(Clone, Debug)]
pub struct Config {
    access_token: String,
    read_timeout: Duration,
    connect_timeout: Duration,
    max_retries: usize,
    retry_backoff_unit: Duration,
    base_url: Option<String>,
}

impl Config {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_unit: DEFAULT_RETRY_BACKOFF_UNIT,
            base_url: None,
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout.max(Duration::from_millis(1));
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout.max(Duration::from_millis(1));
        self
    }

    /// Upper bound on network calls per query, clamped to at least one.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_retry_backoff_unit(mut self, retry_backoff_unit: Duration) -> Self {
        self.retry_backoff_unit = retry_backoff_unit;
        self
    }

    /// Routes every call to `base_url` instead of the token-derived platform.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn retry_backoff_unit(&self) -> Duration {
        self.retry_backoff_unit
    }

    pub fn platform(&self) -> Platform {
        Platform::from_access_token(&self.access_token)
    }

    pub fn endpoint(&self) -> String {
        let base_url = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.platform().base_url());
        join_base_path(base_url, GRAPHQL_PATH)
    }
}
