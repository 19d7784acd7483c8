use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use poise::serenity_prelude::{ChannelId, RoleId, UserId};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{BotError, Result};
use crate::managers::{SharedBanManager, SharedFormStore};
use crate::state::{ApplicationRecord, ApplicationStore, JsonStore};

/// Shared application record document
pub type SharedApplicationStore = Arc<JsonStore<ApplicationStore>>;

/// An in-flight DM question walk for one applicant.
///
/// Questions are snapshotted at start so answers stay positionally aligned
/// even if the form is edited mid-flight.
#[derive(Debug, Clone)]
pub struct ApplySession {
    pub form_name: String,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
    pub started_at: u64,
    pub last_activity: u64,
}

impl ApplySession {
    fn new(form_name: &str, questions: Vec<String>) -> Self {
        let now = current_timestamp();
        Self {
            form_name: form_name.to_string(),
            questions,
            answers: Vec::new(),
            started_at: now,
            last_activity: now,
        }
    }
}

/// Outcome of a panel-button activation
#[derive(Debug, Clone)]
pub enum BeginApplication {
    /// Reapplication ban still active; no session created, no DM sent
    Banned { until: DateTime<Utc> },
    /// The user already has a session in flight (at most one per user)
    InFlight,
    /// Session created; the caller sends the first question over DM
    Started { question: String },
}

/// Outcome of recording one DM answer
#[derive(Debug, Clone)]
pub enum AnswerOutcome {
    NextQuestion(String),
    Completed(CompletedApplication),
}

/// A finished question walk, ready to be persisted and posted for review
#[derive(Debug, Clone)]
pub struct CompletedApplication {
    pub form_name: String,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
}

/// Everything Accept needs resolved before touching Discord
#[derive(Debug, Clone)]
pub struct ReviewResolution {
    pub form_name: String,
    pub role: RoleId,
    pub category: ChannelId,
    pub cooldown_hours: u64,
}

/// Drives applicants through the form question sequence and hands results
/// to staff review
pub struct ApplicationManager {
    forms: SharedFormStore,
    bans: SharedBanManager,
    applications: SharedApplicationStore,

    /// In-flight sessions (user id -> session); doubles as the per-user
    /// exclusivity guard
    sessions: DashMap<UserId, ApplySession>,

    /// Seconds of DM inactivity before a session expires
    session_timeout_secs: u64,
}

impl ApplicationManager {
    pub fn new(
        forms: SharedFormStore,
        bans: SharedBanManager,
        applications: SharedApplicationStore,
        session_timeout_secs: u64,
    ) -> Self {
        Self {
            forms,
            bans,
            applications,
            sessions: DashMap::new(),
            session_timeout_secs,
        }
    }

    /// Entry guard plus session creation for a panel-button activation.
    ///
    /// Errors if the form is unknown or has no questions; otherwise reports
    /// whether the user is banned, already in flight, or started.
    pub async fn try_begin(&self, user_id: UserId, form_name: &str) -> Result<BeginApplication> {
        if let Some(until) = self.bans.active_ban(user_id).await? {
            debug!("User {} tried to apply while banned until {}", user_id, until);
            return Ok(BeginApplication::Banned { until });
        }

        if self.sessions.contains_key(&user_id) {
            return Ok(BeginApplication::InFlight);
        }

        let questions = self
            .forms
            .read(|registry| registry.get(form_name).map(|f| f.questions.clone()))
            .await
            .ok_or_else(|| BotError::FormNotFound {
                name: form_name.to_string(),
            })?;

        if questions.is_empty() {
            return Err(BotError::FormHasNoQuestions {
                name: form_name.to_string(),
            });
        }

        // Claim the slot atomically: a second click from the same user may
        // have won the race while the registry read above was in flight
        match self.sessions.entry(user_id) {
            Entry::Occupied(_) => Ok(BeginApplication::InFlight),
            Entry::Vacant(slot) => {
                let first = questions[0].clone();
                slot.insert(ApplySession::new(form_name, questions));
                info!("User {} started applying for '{}'", user_id, form_name);
                Ok(BeginApplication::Started { question: first })
            }
        }
    }

    /// Drop a session without recording anything (e.g. the first DM failed)
    pub fn cancel(&self, user_id: UserId) {
        if self.sessions.remove(&user_id).is_some() {
            debug!("Cancelled application session for user {}", user_id);
        }
    }

    pub fn has_session(&self, user_id: UserId) -> bool {
        self.sessions.contains_key(&user_id)
    }

    /// Record one DM message as the answer to the current question.
    ///
    /// Returns `None` when the user has no session (the message is not ours).
    /// On the last answer the session is removed and returned as completed.
    pub fn record_answer(&self, user_id: UserId, content: &str) -> Option<AnswerOutcome> {
        let mut session = self.sessions.get_mut(&user_id)?;
        session.answers.push(content.to_string());
        session.last_activity = current_timestamp();

        if session.answers.len() < session.questions.len() {
            let next = session.questions[session.answers.len()].clone();
            return Some(AnswerOutcome::NextQuestion(next));
        }
        drop(session);

        let (_, session) = self.sessions.remove(&user_id)?;
        info!(
            "User {} completed the '{}' application ({} answers)",
            user_id,
            session.form_name,
            session.answers.len()
        );
        Some(AnswerOutcome::Completed(CompletedApplication {
            form_name: session.form_name,
            questions: session.questions,
            answers: session.answers,
        }))
    }

    /// Persist the completed application (overwriting any prior record for
    /// this user) and return the form's staff review channel
    pub async fn submit(
        &self,
        user_id: UserId,
        completed: &CompletedApplication,
    ) -> Result<ChannelId> {
        self.applications
            .update(|store| {
                store.insert(
                    &user_id.to_string(),
                    ApplicationRecord {
                        form: completed.form_name.clone(),
                        answers: completed.answers.clone(),
                    },
                );
                Ok(())
            })
            .await?;

        let form = self
            .forms
            .read(|registry| registry.get(&completed.form_name).cloned())
            .await
            .ok_or_else(|| BotError::FormNotFound {
                name: completed.form_name.clone(),
            })?;

        form.channel.ok_or_else(|| BotError::ChannelNotConfigured {
            name: completed.form_name.clone(),
        })
    }

    /// Resolve everything Accept needs from the stored record and its form.
    ///
    /// Any missing piece (record gone, form deleted, role or category unset)
    /// is an error; acceptance never proceeds partially configured.
    pub async fn resolve_review(&self, user_id: UserId) -> Result<ReviewResolution> {
        let record = self
            .applications
            .read(|store| store.get(&user_id.to_string()).cloned())
            .await
            .ok_or_else(|| BotError::ApplicationNotFound {
                user_id: user_id.to_string(),
            })?;

        let form = self
            .forms
            .read(|registry| registry.get(&record.form).cloned())
            .await
            .ok_or_else(|| BotError::FormNotFound {
                name: record.form.clone(),
            })?;

        Ok(ReviewResolution {
            form_name: record.form.clone(),
            role: form.role.ok_or_else(|| BotError::RoleNotConfigured {
                name: record.form.clone(),
            })?,
            category: form
                .category
                .ok_or_else(|| BotError::CategoryNotConfigured {
                    name: record.form.clone(),
                })?,
            cooldown_hours: form.cooldown_hours,
        })
    }

    /// After the Discord side effects succeeded: re-arm the reapply ban with
    /// the form's cooldown and drop the resolved record
    pub async fn finalize_accept(&self, user_id: UserId, cooldown_hours: u64) -> Result<()> {
        self.bans.ban(user_id, cooldown_hours).await?;
        self.applications
            .update(|store| {
                store.remove(&user_id.to_string());
                Ok(())
            })
            .await?;
        info!("Application for user {} accepted", user_id);
        Ok(())
    }

    /// Drop the record on denial; never touches the ban ledger
    pub async fn finalize_deny(&self, user_id: UserId) -> Result<String> {
        let record = self
            .applications
            .update(|store| {
                store
                    .remove(&user_id.to_string())
                    .ok_or_else(|| BotError::ApplicationNotFound {
                        user_id: user_id.to_string(),
                    })
            })
            .await?;
        info!("Application for user {} denied", user_id);
        Ok(record.form)
    }

    /// Remove sessions idle past the configured expiry and return them so
    /// the caller can notify the applicants
    pub fn expire_stale_sessions(&self) -> Vec<(UserId, String)> {
        let now = current_timestamp();
        let cutoff = now.saturating_sub(self.session_timeout_secs);
        let mut expired = Vec::new();

        self.sessions.retain(|user_id, session| {
            if session.last_activity < cutoff {
                info!(
                    "Application session for user {} ('{}') timed out after {}s",
                    user_id,
                    session.form_name,
                    now.saturating_sub(session.started_at)
                );
                expired.push((*user_id, session.form_name.clone()));
                false
            } else {
                true
            }
        });

        expired
    }
}

/// Shared application manager type
pub type SharedApplicationManager = Arc<ApplicationManager>;

pub fn create_shared_application_manager(
    forms: SharedFormStore,
    bans: SharedBanManager,
    applications: SharedApplicationStore,
    session_timeout_secs: u64,
) -> SharedApplicationManager {
    Arc::new(ApplicationManager::new(
        forms,
        bans,
        applications,
        session_timeout_secs,
    ))
}

fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::ban_manager::{BanManager, SharedBanStore};
    use chrono::Duration;

    async fn temp_manager(name: &str, timeout_secs: u64) -> (ApplicationManager, Vec<String>) {
        let mut paths = Vec::new();
        let mut open = |suffix: &str| {
            let path = std::env::temp_dir()
                .join(format!(
                    "intake-apps-{}-{}-{}.json",
                    std::process::id(),
                    name,
                    suffix
                ))
                .to_string_lossy()
                .into_owned();
            paths.push(path.clone());
            path
        };
        let forms_path = open("forms");
        let bans_path = open("bans");
        let apps_path = open("applications");
        for path in &paths {
            let _ = tokio::fs::remove_file(path).await;
        }

        let forms: SharedFormStore = Arc::new(JsonStore::open(&forms_path).await.unwrap());
        let bans: SharedBanStore = Arc::new(JsonStore::open(&bans_path).await.unwrap());
        let applications: SharedApplicationStore =
            Arc::new(JsonStore::open(&apps_path).await.unwrap());

        forms
            .update(|registry| {
                registry.create("mod")?;
                registry.add_question("mod", "Why?")?;
                registry.add_question("mod", "Experience?")?;
                registry.set_role("mod", RoleId::new(1))?;
                registry.set_channel("mod", ChannelId::new(2))?;
                registry.set_category("mod", ChannelId::new(3))?;
                registry.set_cooldown("mod", 48)
            })
            .await
            .unwrap();

        let ban_manager = Arc::new(BanManager::new(bans));
        let manager = ApplicationManager::new(forms, ban_manager, applications, timeout_secs);
        (manager, paths)
    }

    async fn cleanup(paths: &[String]) {
        for path in paths {
            let _ = tokio::fs::remove_file(path).await;
        }
    }

    #[tokio::test]
    async fn full_walk_records_one_answer_per_question() {
        let (manager, paths) = temp_manager("walk", 3600).await;
        let user = UserId::new(10);

        let begin = manager.try_begin(user, "mod").await.unwrap();
        match begin {
            BeginApplication::Started { question } => assert_eq!(question, "Why?"),
            other => panic!("expected start, got {:?}", other),
        }

        match manager.record_answer(user, "Because").unwrap() {
            AnswerOutcome::NextQuestion(q) => assert_eq!(q, "Experience?"),
            other => panic!("expected next question, got {:?}", other),
        }

        let completed = match manager.record_answer(user, "5 years").unwrap() {
            AnswerOutcome::Completed(c) => c,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(completed.answers.len(), completed.questions.len());
        assert_eq!(completed.answers, vec!["Because", "5 years"]);
        assert!(!manager.has_session(user));

        let channel = manager.submit(user, &completed).await.unwrap();
        assert_eq!(channel, ChannelId::new(2));

        // The record is persisted under the applicant id
        let stored = manager
            .applications
            .read(|store| store.get(&user.to_string()).cloned())
            .await
            .unwrap();
        assert_eq!(stored.form, "mod");
        assert_eq!(stored.answers.len(), 2);

        cleanup(&paths).await;
    }

    #[tokio::test]
    async fn second_click_while_in_flight_is_refused() {
        let (manager, paths) = temp_manager("exclusive", 3600).await;
        let user = UserId::new(10);

        assert!(matches!(
            manager.try_begin(user, "mod").await.unwrap(),
            BeginApplication::Started { .. }
        ));
        assert!(matches!(
            manager.try_begin(user, "mod").await.unwrap(),
            BeginApplication::InFlight
        ));

        cleanup(&paths).await;
    }

    #[tokio::test]
    async fn banned_user_gets_no_session() {
        let (manager, paths) = temp_manager("banned", 3600).await;
        let user = UserId::new(10);
        manager.bans.ban(user, 1).await.unwrap();

        match manager.try_begin(user, "mod").await.unwrap() {
            BeginApplication::Banned { until } => {
                assert!(until > Utc::now());
            }
            other => panic!("expected ban refusal, got {:?}", other),
        }
        assert!(!manager.has_session(user));

        cleanup(&paths).await;
    }

    #[tokio::test]
    async fn unknown_or_empty_forms_error_out() {
        let (manager, paths) = temp_manager("guards", 3600).await;
        let user = UserId::new(10);

        assert!(matches!(
            manager.try_begin(user, "ghost").await.unwrap_err(),
            BotError::FormNotFound { .. }
        ));

        manager
            .forms
            .update(|registry| registry.create("empty"))
            .await
            .unwrap();
        assert!(matches!(
            manager.try_begin(user, "empty").await.unwrap_err(),
            BotError::FormHasNoQuestions { .. }
        ));

        cleanup(&paths).await;
    }

    #[tokio::test]
    async fn accept_rearms_ban_with_form_cooldown_and_drops_record() {
        let (manager, paths) = temp_manager("accept", 3600).await;
        let user = UserId::new(10);

        manager.try_begin(user, "mod").await.unwrap();
        let _ = manager.record_answer(user, "Because");
        let completed = match manager.record_answer(user, "5 years").unwrap() {
            AnswerOutcome::Completed(c) => c,
            _ => unreachable!(),
        };
        manager.submit(user, &completed).await.unwrap();

        let resolution = manager.resolve_review(user).await.unwrap();
        assert_eq!(resolution.role, RoleId::new(1));
        assert_eq!(resolution.category, ChannelId::new(3));
        assert_eq!(resolution.cooldown_hours, 48);

        manager
            .finalize_accept(user, resolution.cooldown_hours)
            .await
            .unwrap();

        let expiry = manager.bans.active_ban(user).await.unwrap().unwrap();
        let expected = Utc::now() + Duration::hours(48);
        assert!((expected - expiry).num_seconds().abs() < 5);

        // Record is gone, so a second resolution fails
        assert!(matches!(
            manager.resolve_review(user).await.unwrap_err(),
            BotError::ApplicationNotFound { .. }
        ));

        cleanup(&paths).await;
    }

    #[tokio::test]
    async fn deny_never_touches_the_ban_ledger() {
        let (manager, paths) = temp_manager("deny", 3600).await;
        let user = UserId::new(10);

        manager.try_begin(user, "mod").await.unwrap();
        let _ = manager.record_answer(user, "Because");
        let completed = match manager.record_answer(user, "5 years").unwrap() {
            AnswerOutcome::Completed(c) => c,
            _ => unreachable!(),
        };
        manager.submit(user, &completed).await.unwrap();

        let form = manager.finalize_deny(user).await.unwrap();
        assert_eq!(form, "mod");
        assert!(!manager.bans.is_banned(user).await.unwrap());

        // Denying again fails: the record was removed
        assert!(matches!(
            manager.finalize_deny(user).await.unwrap_err(),
            BotError::ApplicationNotFound { .. }
        ));

        cleanup(&paths).await;
    }

    #[tokio::test]
    async fn resolve_review_fails_when_role_is_unset() {
        let (manager, paths) = temp_manager("norole", 3600).await;
        let user = UserId::new(10);

        // Rebuild the form without an accepted role
        manager
            .forms
            .update(|registry| {
                registry.recreate("mod");
                registry.add_question("mod", "Why?")?;
                registry.add_question("mod", "Experience?")?;
                registry.set_channel("mod", ChannelId::new(2))?;
                registry.set_category("mod", ChannelId::new(3))
            })
            .await
            .unwrap();

        manager.try_begin(user, "mod").await.unwrap();
        let _ = manager.record_answer(user, "Because");
        let completed = match manager.record_answer(user, "5 years").unwrap() {
            AnswerOutcome::Completed(c) => c,
            _ => unreachable!(),
        };
        manager.submit(user, &completed).await.unwrap();

        assert!(matches!(
            manager.resolve_review(user).await.unwrap_err(),
            BotError::RoleNotConfigured { .. }
        ));

        cleanup(&paths).await;
    }

    #[tokio::test]
    async fn second_submission_overwrites_the_first_record() {
        let (manager, paths) = temp_manager("overwrite", 3600).await;
        let user = UserId::new(10);

        manager.try_begin(user, "mod").await.unwrap();
        let _ = manager.record_answer(user, "First");
        let completed = match manager.record_answer(user, "Walk").unwrap() {
            AnswerOutcome::Completed(c) => c,
            _ => unreachable!(),
        };
        manager.submit(user, &completed).await.unwrap();

        manager.try_begin(user, "mod").await.unwrap();
        let _ = manager.record_answer(user, "Second");
        let completed = match manager.record_answer(user, "Walk").unwrap() {
            AnswerOutcome::Completed(c) => c,
            _ => unreachable!(),
        };
        manager.submit(user, &completed).await.unwrap();

        let stored = manager
            .applications
            .read(|store| store.get(&user.to_string()).cloned())
            .await
            .unwrap();
        assert_eq!(stored.answers, vec!["Second", "Walk"]);

        cleanup(&paths).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn simultaneous_apply_clicks_claim_one_session() {
        let (manager, paths) = temp_manager("race", 3600).await;
        let manager = Arc::new(manager);
        let user = UserId::new(10);

        for _ in 0..200 {
            let barrier = Arc::new(tokio::sync::Barrier::new(2));
            let mut handles = Vec::new();
            for _ in 0..2 {
                let manager = manager.clone();
                let barrier = barrier.clone();
                handles.push(tokio::spawn(async move {
                    barrier.wait().await;
                    manager.try_begin(user, "mod").await.unwrap()
                }));
            }

            let mut started = 0;
            for handle in handles {
                if matches!(handle.await.unwrap(), BeginApplication::Started { .. }) {
                    started += 1;
                }
            }
            assert_eq!(started, 1, "exactly one click may claim the session");
            manager.cancel(user);
        }

        cleanup(&paths).await;
    }

    #[tokio::test]
    async fn idle_sessions_expire_and_release_resources() {
        let (manager, paths) = temp_manager("expire", 0).await;
        let user = UserId::new(10);

        manager.try_begin(user, "mod").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        let expired = manager.expire_stale_sessions();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, user);
        assert_eq!(expired[0].1, "mod");
        assert!(!manager.has_session(user));

        // A DM after expiry is not treated as an answer
        assert!(manager.record_answer(user, "late").is_none());

        // The user may start over
        assert!(matches!(
            manager.try_begin(user, "mod").await.unwrap(),
            BeginApplication::Started { .. }
        ));

        cleanup(&paths).await;
    }
}
