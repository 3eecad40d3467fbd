use crate::utils::error::Result;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次呼叫之後額外重試的次數
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retry_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            retry_attempts,
            retry_delay,
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_millis(500))
    }
}

/// 只重試暫時性錯誤；永久性錯誤立即回傳
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt <= policy.retry_attempts => {
                tracing::warn!(
                    "🔄 {} attempt {}/{} failed with transient error: {}",
                    label,
                    attempt,
                    policy.retry_attempts + 1,
                    e
                );
                if !policy.retry_delay.is_zero() {
                    tokio::time::sleep(policy.retry_delay).await;
                }
            }
            Err(e) => {
                if attempt > 1 {
                    tracing::error!("❌ {} gave up after {} attempts", label, attempt);
                }
                return Err(e);
            }
        }
    }
}
