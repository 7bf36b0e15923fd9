use std::time::Duration;

use async_trait::async_trait;

/// Suspends the polling loop between manifest refreshes.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
impl<T: Sleeper + ?Sized> Sleeper for &T {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await
    }
}

/// [`Sleeper`] on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_waits_on_timer() {
        let started = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(8)).await;
        assert!(started.elapsed() >= Duration::from_secs(8));
    }
}
