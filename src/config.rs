//! Immutable dispatcher configuration.
//!
//! Built once at startup, typically from the process environment through a
//! [`Runtime`], and never mutated afterwards.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::header::HeaderValue;

use crate::http::RetryPolicy;
use crate::runtime::Runtime;

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "QASE_API_TOKEN";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "QASE_API_URL";

pub const DEFAULT_API_URL: &str = "https://api.qase.io/v1";

/// Per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Opaque API token sent in the `Token` header.
#[derive(Clone)]
pub struct Credential {
    header: HeaderValue,
    masked: String,
}

impl Credential {
    /// Returns `Ok(None)` for an empty token, which counts as not configured.
    pub fn new(token: &str) -> Result<Option<Self>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        let mut header = HeaderValue::from_str(token)
            .context("API token contains characters that are not valid in an HTTP header")?;
        header.set_sensitive(true);

        Ok(Some(Self {
            header,
            masked: mask(token),
        }))
    }

    pub fn header_value(&self) -> &HeaderValue {
        &self.header
    }

    /// Masked form safe for logs, e.g. `qase****6789`.
    pub fn masked(&self) -> &str {
        &self.masked
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked).finish()
    }
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token: Option<Credential>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Load the configuration from the environment.
    ///
    /// A missing token is not an error here: every dispatch reports it instead.
    #[tracing::instrument(skip(runtime))]
    pub fn from_runtime<R: Runtime + ?Sized>(runtime: &R) -> Result<Self> {
        let mut config = Config::default();

        if let Ok(url) = runtime.env_var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config = config.with_api_url(&url);
            }
        }

        if let Ok(token) = runtime.env_var(TOKEN_ENV) {
            config.token =
                Credential::new(&token).with_context(|| format!("Invalid {}", TOKEN_ENV))?;
        }

        match &config.token {
            Some(token) => debug!("Using {} for authentication: {}", TOKEN_ENV, token.masked()),
            None => debug!("{} is not set; requests will fail until it is", TOKEN_ENV),
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: &str) -> Result<Self> {
        self.token = Credential::new(token)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Full URL for an API path such as `/case/DEMO`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}
