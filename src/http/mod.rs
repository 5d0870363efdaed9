//! HTTP dispatch with authentication, marshaling, and rate-limit backoff.

mod client;
mod error;
mod request;
mod response;
mod retry;

pub use client::{Dispatcher, USER_AGENT};
pub use error::{DispatchError, FailureKind};
pub use request::{Method, Request, filter_key};
pub use response::{Response, ToolError, into_tool_output};
pub use retry::{MAX_RETRIES, RETRY_DELAY, RetryPolicy, RetryState, retry_after};
