//! Per-user cart locks.
//!
//! Cart writes are load-modify-save over the whole cart, so two concurrent
//! writers for the same user would lose an update. Every cart writer in this
//! process takes the user's lock first. Writers on other instances are not
//! covered.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};

use stride_core::UserId;

/// Idle time after which an unused lock entry is dropped.
const LOCK_IDLE: Duration = Duration::from_secs(600);

/// Keyed async mutex table, one entry per active user.
#[derive(Clone)]
pub struct CartLocks {
    locks: Cache<UserId, Arc<Mutex<()>>>,
}

impl CartLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder().time_to_idle(LOCK_IDLE).build(),
        }
    }

    /// Wait for exclusive access to `user_id`'s cart.
    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .get_with(user_id, async { Arc::new(Mutex::new(())) })
            .await;
        mutex.lock_owned().await
    }
}

impl Default for CartLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_user_is_serialized() {
        let locks = CartLocks::new();
        let user = UserId::generate();

        let guard = locks.lock(user).await;
        let contended =
            tokio::time::timeout(Duration::from_millis(50), locks.lock(user)).await;
        assert!(contended.is_err());

        drop(guard);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(50), locks.lock(user)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let locks = CartLocks::new();
        let _alice = locks.lock(UserId::generate()).await;
        let bob = tokio::time::timeout(Duration::from_millis(50), locks.lock(UserId::generate()))
            .await;
        assert!(bob.is_ok());
    }
}
