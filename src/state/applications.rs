use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A completed submission awaiting (or past) review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    /// Name of the form this was submitted against
    pub form: String,

    /// Answers aligned positionally with the form's questions at submission time
    pub answers: Vec<String>,
}

/// Submitted applications, keyed by applicant user id.
///
/// At most one record per user; a new submission overwrites the prior one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationStore {
    pub records: HashMap<String, ApplicationRecord>,
}

impl ApplicationStore {
    pub fn get(&self, user_id: &str) -> Option<&ApplicationRecord> {
        self.records.get(user_id)
    }

    /// Last write wins; no merging with a prior record
    pub fn insert(&mut self, user_id: &str, record: ApplicationRecord) {
        self.records.insert(user_id.to_string(), record);
    }

    pub fn remove(&mut self, user_id: &str) -> Option<ApplicationRecord> {
        self.records.remove(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_submission_overwrites_first() {
        let mut store = ApplicationStore::default();
        store.insert(
            "123",
            ApplicationRecord {
                form: "mod".to_string(),
                answers: vec!["Because".to_string(), "5 years".to_string()],
            },
        );
        store.insert(
            "123",
            ApplicationRecord {
                form: "helper".to_string(),
                answers: vec!["Sure".to_string()],
            },
        );

        let record = store.get("123").unwrap();
        assert_eq!(record.form, "helper");
        assert_eq!(record.answers, vec!["Sure".to_string()]);
    }

    #[test]
    fn remove_returns_record_once() {
        let mut store = ApplicationStore::default();
        store.insert(
            "123",
            ApplicationRecord {
                form: "mod".to_string(),
                answers: vec![],
            },
        );

        assert!(store.remove("123").is_some());
        assert!(store.remove("123").is_none());
    }
}
