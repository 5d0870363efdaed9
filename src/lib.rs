//! Request dispatcher for the Qase test-management REST API.
//!
//! Every tool call goes through [`http::Dispatcher`], which injects the
//! `Token` header, marshals query parameters and JSON bodies, and absorbs
//! HTTP 429 throttling with a bounded backoff.

pub mod config;
pub mod http;
pub mod runtime;

pub use config::{Config, Credential};
pub use http::{DispatchError, Dispatcher, FailureKind, Method, Request, Response, RetryPolicy};
