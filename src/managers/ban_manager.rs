use chrono::{DateTime, Duration, Utc};
use poise::serenity_prelude::UserId;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use crate::state::{BanLedger, BanStatus, JsonStore};

/// Shared ban ledger document
pub type SharedBanStore = Arc<JsonStore<BanLedger>>;

/// Longest accepted ban/cooldown duration (10 years)
pub const MAX_BAN_HOURS: u64 = 24 * 365 * 10;

/// Reapplication bans with lazy expiry: stale entries are removed (and the
/// removal persisted) as a side effect of being queried
pub struct BanManager {
    store: SharedBanStore,
}

impl BanManager {
    pub fn new(store: SharedBanStore) -> Self {
        Self { store }
    }

    /// Return the active ban expiry for a user, if any.
    ///
    /// A past expiry is treated as no ban; the stale entry is removed and
    /// persisted before returning. Checking twice yields the same answer.
    pub async fn active_ban(&self, user_id: UserId) -> Result<Option<DateTime<Utc>>> {
        let key = user_id.to_string();
        let now = Utc::now();

        match self.store.read(|ledger| ledger.status(&key, now)).await {
            BanStatus::Active(expiry) => Ok(Some(expiry)),
            BanStatus::Absent => Ok(None),
            BanStatus::Expired => {
                debug!("Removing stale apply ban for user {}", user_id);
                self.store
                    .update(|ledger| {
                        ledger.remove(&key);
                        Ok(())
                    })
                    .await?;
                Ok(None)
            }
        }
    }

    pub async fn is_banned(&self, user_id: UserId) -> Result<bool> {
        Ok(self.active_ban(user_id).await?.is_some())
    }

    /// Ban a user from applying until now + hours, overwriting any entry.
    ///
    /// Durations above [`MAX_BAN_HOURS`] clamp so the `i64` cast below can
    /// never wrap into a past expiry.
    pub async fn ban(&self, user_id: UserId, hours: u64) -> Result<DateTime<Utc>> {
        let hours = hours.min(MAX_BAN_HOURS);
        let expiry = Utc::now() + Duration::hours(hours as i64);
        self.store
            .update(|ledger| {
                ledger.insert(&user_id.to_string(), expiry);
                Ok(())
            })
            .await?;
        info!("User {} banned from applying until {}", user_id, expiry);
        Ok(expiry)
    }

    /// Lift a ban; no error if none exists
    pub async fn unban(&self, user_id: UserId) -> Result<()> {
        self.store
            .update(|ledger| {
                ledger.remove(&user_id.to_string());
                Ok(())
            })
            .await?;
        info!("Apply ban removed for user {}", user_id);
        Ok(())
    }
}

/// Shared ban manager type
pub type SharedBanManager = Arc<BanManager>;

pub fn create_shared_ban_manager(store: SharedBanStore) -> SharedBanManager {
    Arc::new(BanManager::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_manager(name: &str) -> (BanManager, String) {
        let path = std::env::temp_dir()
            .join(format!("intake-bans-{}-{}.json", std::process::id(), name))
            .to_string_lossy()
            .into_owned();
        let _ = tokio::fs::remove_file(&path).await;
        let store = Arc::new(JsonStore::open(&path).await.unwrap());
        (BanManager::new(store), path)
    }

    #[tokio::test]
    async fn ban_sets_expiry_hours_from_now() {
        let (manager, path) = temp_manager("arm").await;
        let user = UserId::new(42);

        let expiry = manager.ban(user, 48).await.unwrap();
        let expected = Utc::now() + Duration::hours(48);
        assert!((expected - expiry).num_seconds().abs() < 5);
        assert!(manager.is_banned(user).await.unwrap());

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn stale_entry_is_removed_on_query_idempotently() {
        let (manager, path) = temp_manager("stale").await;
        let user = UserId::new(42);

        // Seed an already-expired entry directly
        manager
            .store
            .update(|ledger| {
                ledger.insert(&user.to_string(), Utc::now() - Duration::hours(1));
                Ok(())
            })
            .await
            .unwrap();

        assert!(!manager.is_banned(user).await.unwrap());
        assert_eq!(
            manager
                .store
                .read(|ledger| ledger.entries.len())
                .await,
            0
        );

        // Second query after cleanup behaves identically
        assert!(!manager.is_banned(user).await.unwrap());

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn absurd_ban_durations_clamp_instead_of_wrapping() {
        let (manager, path) = temp_manager("clamp").await;
        let user = UserId::new(42);

        let expiry = manager.ban(user, u64::MAX).await.unwrap();
        assert!(expiry > Utc::now());
        assert!(manager.is_banned(user).await.unwrap());

        let expected = Utc::now() + Duration::hours(MAX_BAN_HOURS as i64);
        assert!((expected - expiry).num_seconds().abs() < 5);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn unban_is_a_no_op_when_absent() {
        let (manager, path) = temp_manager("unban").await;
        let user = UserId::new(42);

        manager.unban(user).await.unwrap();

        manager.ban(user, 2).await.unwrap();
        manager.unban(user).await.unwrap();
        assert!(!manager.is_banned(user).await.unwrap());

        let _ = tokio::fs::remove_file(&path).await;
    }
}
