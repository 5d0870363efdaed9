use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use qase::config::{API_URL_ENV, Config, TOKEN_ENV};
use qase::http::{Dispatcher, Method, Request, into_tool_output};
use qase::runtime::RealRuntime;
use serde_json::Value;

/// qase - send one request to the Qase API
///
/// The API token is read from QASE_API_TOKEN (or --token) and sent in the
/// `Token` header. Rate-limited requests (HTTP 429) are retried up to three
/// times, honoring Retry-After.
///
/// The response body is printed as JSON. Failures print {"error": "..."} and
/// exit with status 1.
///
/// Examples:
///   qase GET /project -q limit=10
///   qase GET /case/DEMO -f priority=high -f automation=is-not-automated
///   qase POST /case/DEMO -d '{"title": "Login works"}'
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// HTTP method: GET, POST, PATCH or DELETE
    #[arg(value_name = "METHOD")]
    pub method: Method,

    /// API path, e.g. /case/DEMO
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Query parameter (repeatable)
    #[arg(short = 'q', long = "query", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// List filter sent as filters[NAME] (repeatable)
    #[arg(short = 'f', long = "filter", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub filters: Vec<(String, String)>,

    /// JSON object request body
    #[arg(short = 'd', long = "data", value_name = "JSON")]
    pub data: Option<String>,

    /// Qase API URL (defaults to https://api.qase.io/v1)
    #[arg(long = "api-url", value_name = "URL", env = API_URL_ENV)]
    pub api_url: Option<String>,

    /// Qase API token
    #[arg(long = "token", value_name = "TOKEN", env = TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,
}

impl Cli {
    fn request(&self) -> Result<Request> {
        let mut request = Request::new(self.method, self.path.clone());

        for (key, value) in &self.query {
            request = request.query(key.as_str(), value);
        }
        for (name, value) in &self.filters {
            request = request.filter(name, Some(value));
        }

        if let Some(data) = &self.data {
            let body: Value = serde_json::from_str(data).context("Request body is not valid JSON")?;
            let Value::Object(body) = body else {
                bail!("Request body must be a JSON object");
            };
            request = request.json_body(body);
        }

        Ok(request)
    }

    fn config(&self) -> Result<Config> {
        let mut config = Config::default();
        if let Some(api_url) = &self.api_url {
            config = config.with_api_url(api_url);
        }
        if let Some(token) = &self.token {
            config = config
                .with_token(token)
                .with_context(|| format!("Invalid {}", TOKEN_ENV))?;
        }
        Ok(config)
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let request = cli.request()?;
    let dispatcher = Dispatcher::new(cli.config()?, RealRuntime)?;

    let response = dispatcher.dispatch(&request).await;
    let failed = response.is_err();

    let output = into_tool_output(response);
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
