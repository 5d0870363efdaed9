//! Runtime abstraction for process-level side effects.
//!
//! The dispatcher never reads the environment or sleeps directly; it goes
//! through [`Runtime`] so tests can inject credentials and observe backoff
//! delays without waiting for them.
//!
//! # Structure
//!
//! - `env` - Environment variable lookup
//! - `time` - Suspension of the calling task during backoff

mod env;
mod time;

use async_trait::async_trait;
use std::env as std_env;
use std::time::Duration;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // Time
    /// Suspend the calling task for `duration`. Must not block the thread.
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    async fn sleep(&self, duration: Duration) {
        self.sleep_impl(duration).await
    }
}
