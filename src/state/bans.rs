use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of checking a user against the ledger at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BanStatus {
    /// A ban exists and its expiry is still in the future
    Active(DateTime<Utc>),
    /// A ban exists but its expiry has passed; the entry is stale
    Expired,
    /// No entry for this user
    Absent,
}

/// Reapplication bans, keyed by user id, value is the absolute expiry.
///
/// Entries are only trustworthy after comparing against the current time;
/// stale entries are cleaned lazily by the manager when queried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BanLedger {
    pub entries: HashMap<String, DateTime<Utc>>,
}

impl BanLedger {
    pub fn status(&self, user_id: &str, now: DateTime<Utc>) -> BanStatus {
        match self.entries.get(user_id) {
            Some(expiry) if *expiry > now => BanStatus::Active(*expiry),
            Some(_) => BanStatus::Expired,
            None => BanStatus::Absent,
        }
    }

    /// Overwrite any existing entry with the given expiry
    pub fn insert(&mut self, user_id: &str, expiry: DateTime<Utc>) {
        self.entries.insert(user_id.to_string(), expiry);
    }

    /// Remove an entry; no error if absent
    pub fn remove(&mut self, user_id: &str) {
        self.entries.remove(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn future_expiry_is_active() {
        let mut ledger = BanLedger::default();
        let now = Utc::now();
        let expiry = now + Duration::hours(1);
        ledger.insert("123", expiry);

        assert_eq!(ledger.status("123", now), BanStatus::Active(expiry));
    }

    #[test]
    fn past_expiry_is_expired_until_removed() {
        let mut ledger = BanLedger::default();
        let now = Utc::now();
        ledger.insert("123", now - Duration::hours(1));

        assert_eq!(ledger.status("123", now), BanStatus::Expired);

        ledger.remove("123");
        assert_eq!(ledger.status("123", now), BanStatus::Absent);

        // Removing again is a no-op
        ledger.remove("123");
        assert_eq!(ledger.status("123", now), BanStatus::Absent);
    }

    #[test]
    fn insert_overwrites_existing_expiry() {
        let mut ledger = BanLedger::default();
        let now = Utc::now();
        ledger.insert("123", now + Duration::hours(1));
        ledger.insert("123", now + Duration::hours(48));

        match ledger.status("123", now) {
            BanStatus::Active(expiry) => assert_eq!(expiry, now + Duration::hours(48)),
            other => panic!("expected active ban, got {:?}", other),
        }
    }
}
