//! Task suspension.

use std::time::Duration;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn sleep_impl(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_real_runtime_sleep_advances_clock() {
        let runtime = RealRuntime;
        let start = tokio::time::Instant::now();

        runtime.sleep(Duration::from_secs(60)).await;

        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_real_runtime_sleep_does_not_block_other_tasks() {
        let runtime = RealRuntime;

        let other = tokio::spawn(async { 42 });
        runtime.sleep(Duration::from_millis(10)).await;

        assert_eq!(other.await.unwrap(), 42);
    }
}
