//! Exponential backoff for throttled table writes.

use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Returned once the retry budget for a throttled write is spent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("backoff: max backoff reached")]
pub struct MaxBackoffReached;

/// Delay schedule for resending the unprocessed residue of a partial
/// batch write.
///
/// Retry  Delay(ms)  Total elapsed(s)
/// 0      0          0
/// 1      200        0.2
/// 2      400        0.6
/// 3      800        1.4
/// 4      1600       3.0
/// 5      3200       6.2
/// 6      6400       12.6
/// 7      12800      25.4
#[derive(Debug, Clone)]
pub struct Backoff {
    max_retries: u32,
    base_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(7)
    }
}

impl Backoff {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(100),
        }
    }

    /// Delay before retry attempt `retry`. `None` means resend
    /// immediately; the counter starts at 0 for the first resend.
    pub fn delay(&self, retry: u32) -> Result<Option<Duration>, MaxBackoffReached> {
        if retry > self.max_retries {
            return Err(MaxBackoffReached);
        }
        if retry == 0 {
            return Ok(None);
        }
        let factor = 1u64 << retry.min(32);
        let delay_ms = (self.base_delay.as_millis() as u64).saturating_mul(factor);
        Ok(Some(Duration::from_millis(delay_ms)))
    }

    /// Sleeps out the delay for `retry`, or fails once the budget is
    /// spent.
    pub async fn wait(&self, retry: u32) -> Result<(), MaxBackoffReached> {
        if let Some(delay) = self.delay(retry)? {
            sleep(delay).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_doubles_from_200ms() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(0).unwrap(), None);
        assert_eq!(
            backoff.delay(1).unwrap(),
            Some(Duration::from_millis(200))
        );
        assert_eq!(
            backoff.delay(2).unwrap(),
            Some(Duration::from_millis(400))
        );
        assert_eq!(
            backoff.delay(7).unwrap(),
            Some(Duration::from_millis(12_800))
        );
    }

    #[test]
    fn exceeding_max_retries_fails() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(8), Err(MaxBackoffReached));

        let backoff = Backoff::new(2);
        assert!(backoff.delay(2).is_ok());
        assert_eq!(backoff.delay(3), Err(MaxBackoffReached));
    }

    #[test]
    fn total_elapsed_for_default_budget() {
        let backoff = Backoff::default();
        let total: Duration = (0..=7)
            .map(|r| backoff.delay(r).unwrap().unwrap_or(Duration::ZERO))
            .sum();
        assert_eq!(total, Duration::from_millis(25_400));
    }
}
