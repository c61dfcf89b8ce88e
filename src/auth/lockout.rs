use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;

/// Failed-login bookkeeping keyed by [`attempt_key`].
#[async_trait]
pub trait LoginAttemptStore: Send + Sync {
    /// Whole minutes left on an active lockout, rounded up.
    async fn locked_for(&self, key: &str) -> Option<u64>;
    /// Counts a failure; returns the lockout minutes if this one tripped it.
    async fn record_failure(&self, key: &str) -> Option<u64>;
    async fn clear(&self, key: &str);
}

pub fn attempt_key(username: &str, ip: &str) -> String {
    format!("{}|{}", username.trim().to_lowercase(), ip)
}

#[derive(Debug, Clone, Copy)]
struct Attempts {
    failures: u32,
    locked_until: Option<Instant>,
}

fn minutes_left(until: Instant) -> Option<u64> {
    let left = until.checked_duration_since(Instant::now())?;
    if left.is_zero() {
        return None;
    }
    Some(left.as_secs().div_ceil(60).max(1))
}

/// In-process store; entries expire one lockout window after their last failure.
pub struct MokaAttemptStore {
    attempts: Cache<String, Attempts>,
    max_failures: u32,
    lockout: Duration,
}

impl MokaAttemptStore {
    pub fn new(max_failures: u32, lockout: Duration) -> Self {
        Self {
            attempts: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(lockout)
                .build(),
            max_failures: max_failures.max(1),
            lockout,
        }
    }
}

#[async_trait]
impl LoginAttemptStore for MokaAttemptStore {
    async fn locked_for(&self, key: &str) -> Option<u64> {
        let attempts = self.attempts.get(key).await?;
        minutes_left(attempts.locked_until?)
    }

    async fn record_failure(&self, key: &str) -> Option<u64> {
        let previous = self.attempts.get(key).await;
        let failures = previous.map(|a| a.failures).unwrap_or(0) + 1;
        let locked_until = (failures >= self.max_failures).then(|| Instant::now() + self.lockout);

        self.attempts
            .insert(key.to_string(), Attempts { failures, locked_until })
            .await;

        locked_until.and_then(minutes_left)
    }

    async fn clear(&self, key: &str) {
        self.attempts.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn locks_after_the_configured_failures() {
        let store = MokaAttemptStore::new(5, Duration::from_secs(30 * 60));
        let key = attempt_key("Anna", "10.0.0.1");

        for _ in 0..4 {
            assert_eq!(store.record_failure(&key).await, None);
            assert_eq!(store.locked_for(&key).await, None);
        }
        assert_eq!(store.record_failure(&key).await, Some(30));
        assert_eq!(store.locked_for(&key).await, Some(30));

        // other addresses keep their own count
        assert_eq!(store.locked_for(&attempt_key("anna", "10.0.0.2")).await, None);
    }

    #[actix_web::test]
    async fn clearing_resets_the_count() {
        let store = MokaAttemptStore::new(2, Duration::from_secs(60));
        let key = attempt_key("anna", "ip");
        store.record_failure(&key).await;
        store.clear(&key).await;
        assert_eq!(store.record_failure(&key).await, None);
        assert_eq!(store.record_failure(&key).await, Some(1));
    }

    #[test]
    fn keys_ignore_username_case() {
        assert_eq!(attempt_key(" Anna ", "1.2.3.4"), "anna|1.2.3.4");
    }
}
