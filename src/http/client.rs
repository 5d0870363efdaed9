//! Request dispatcher: authentication, sending, and rate-limit backoff.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};

use super::error::DispatchError;
use super::request::Request;
use super::response::{Response, into_tool_output};
use super::retry::RetryState;
use crate::config::{Config, Credential};
use crate::runtime::{RealRuntime, Runtime};

pub const USER_AGENT: &str = concat!("qase-cli/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API token.
const TOKEN_HEADER: &str = "Token";

/// Turns a [`Request`] into exactly one terminal [`Response`].
///
/// Holds no per-call state, so one dispatcher can serve any number of
/// concurrent calls. Cloning is cheap.
pub struct Dispatcher<R: Runtime = RealRuntime> {
    client: Client,
    config: Arc<Config>,
    runtime: Arc<R>,
}

impl<R: Runtime> Clone for Dispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl Dispatcher<RealRuntime> {
    /// Build a dispatcher configured from `QASE_API_TOKEN` / `QASE_API_URL`.
    pub fn from_env() -> Result<Self> {
        let runtime = RealRuntime;
        let config = Config::from_runtime(&runtime)?;
        Self::new(config, runtime)
    }
}

impl<R: Runtime> Dispatcher<R> {
    pub fn new(config: Config, runtime: R) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            // Redirects are not followed: a 3xx is a terminal HTTP error.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            config: Arc::new(config),
            runtime: Arc::new(runtime),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Send `request`, retrying only on HTTP 429 while the budget lasts.
    #[tracing::instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    pub async fn dispatch(&self, request: &Request) -> Response {
        let Some(token) = self.config.token.as_ref() else {
            warn!(
                "{} {}: credential not configured, request not sent",
                request.method(),
                request.path()
            );
            return Err(DispatchError::CredentialNotConfigured);
        };

        let url = self.config.url_for(request.path());
        let mut retry = RetryState::new(self.config.retry);

        loop {
            debug!(
                "{} {} (attempt {}/{})...",
                request.method(),
                url,
                retry.attempts(),
                retry.max_retries() + 1
            );

            let response = self.send_once(request, &url, token).await?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return interpret(response).await;
            }

            let delay = retry.on_rate_limited(response.headers());
            drop(response);

            match delay {
                Some(delay) => {
                    warn!(
                        "{} {}: rate limited, retry {}/{} in {}s...",
                        request.method(),
                        request.path(),
                        retry.retries(),
                        retry.max_retries(),
                        delay.as_secs_f64()
                    );
                    self.runtime.sleep(delay).await;
                }
                None => {
                    warn!(
                        "{} {}: still rate limited after {} attempts, giving up",
                        request.method(),
                        request.path(),
                        retry.attempts()
                    );
                    return Err(DispatchError::RateLimitExhausted {
                        attempts: retry.attempts(),
                    });
                }
            }
        }
    }

    /// Dispatch and fold the outcome into the JSON a tool hands to its host.
    pub async fn dispatch_to_tool_output(&self, request: &Request) -> Value {
        into_tool_output(self.dispatch(request).await)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.dispatch(&Request::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Map<String, Value>) -> Response {
        self.dispatch(&Request::post(path).json_body(body)).await
    }

    pub async fn patch(&self, path: &str, body: Map<String, Value>) -> Response {
        self.dispatch(&Request::patch(path).json_body(body)).await
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.dispatch(&Request::delete(path)).await
    }

    /// One network attempt. Only transport failures are errors here.
    async fn send_once(
        &self,
        request: &Request,
        url: &str,
        token: &Credential,
    ) -> Result<reqwest::Response, DispatchError> {
        let mut builder = self
            .client
            .request(request.method().into(), url)
            .header(TOKEN_HEADER, token.header_value().clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| {
            debug!("{} {}: transport failure: {}", request.method(), url, e);
            DispatchError::from(e)
        })
    }
}

/// Map a non-429 response to its terminal outcome.
async fn interpret(response: reqwest::Response) -> Response {
    let status = response.status();

    if !status.is_success() {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("HTTP {}: failed to read error body: {}", status.as_u16(), e);
                String::new()
            }
        };
        debug!("HTTP {}: {}", status.as_u16(), body);
        return Err(DispatchError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    let body = serde_json::from_slice::<Value>(&bytes)?;
    Ok(body)
}
