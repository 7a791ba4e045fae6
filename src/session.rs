// src/session.rs

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{error::AppError, models::event::ConversationId};

/// Where a conversation is in its dialogue. Working fields live in the
/// variant that needs them and are dropped on every return to `Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Step {
    #[default]
    Idle,
    AwaitingTestName,
    AwaitingAnswerKey {
        test_name: String,
    },
    AwaitingLearnerName {
        username: String,
    },
    AwaitingLearnerAnswers {
        username: String,
        student_name: String,
    },
    AwaitingDeleteSelection,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Idle => "idle",
            Step::AwaitingTestName => "awaiting_test_name",
            Step::AwaitingAnswerKey { .. } => "awaiting_answer_key",
            Step::AwaitingLearnerName { .. } => "awaiting_learner_name",
            Step::AwaitingLearnerAnswers { .. } => "awaiting_learner_answers",
            Step::AwaitingDeleteSelection => "awaiting_delete_selection",
        }
    }
}

/// Per-conversation dialogue state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    step: Step,
}

impl Session {
    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn is_idle(&self) -> bool {
        self.step == Step::Idle
    }

    /// Unconditional return to `Idle` ("back", completion, abort).
    pub fn reset(&mut self) {
        self.step = Step::Idle;
    }

    pub fn start_authoring(&mut self) -> Result<(), AppError> {
        self.expect_idle("start authoring")?;
        self.step = Step::AwaitingTestName;
        Ok(())
    }

    pub fn accept_test_name(&mut self, test_name: impl Into<String>) -> Result<(), AppError> {
        match self.step {
            Step::AwaitingTestName => {
                self.step = Step::AwaitingAnswerKey {
                    test_name: test_name.into(),
                };
                Ok(())
            }
            _ => Err(self.wrong_step("accept a test name")),
        }
    }

    /// Name captured in the previous authoring step.
    pub fn pending_test_name(&self) -> Result<&str, AppError> {
        match &self.step {
            Step::AwaitingAnswerKey { test_name } => Ok(test_name),
            _ => Err(self.wrong_step("accept an answer key")),
        }
    }

    pub fn begin_identification(&mut self, username: impl Into<String>) -> Result<(), AppError> {
        self.expect_idle("begin identification")?;
        self.step = Step::AwaitingLearnerName {
            username: username.into(),
        };
        Ok(())
    }

    pub fn accept_student_name(&mut self, student_name: impl Into<String>) -> Result<(), AppError> {
        let username = match &self.step {
            Step::AwaitingLearnerName { username } => username.clone(),
            _ => return Err(self.wrong_step("accept a student name")),
        };
        self.step = Step::AwaitingLearnerAnswers {
            username,
            student_name: student_name.into(),
        };
        Ok(())
    }

    /// `(username, student_name)` of the learner about to submit.
    pub fn learner(&self) -> Result<(&str, &str), AppError> {
        match &self.step {
            Step::AwaitingLearnerAnswers {
                username,
                student_name,
            } => Ok((username, student_name)),
            _ => Err(self.wrong_step("accept answers")),
        }
    }

    pub fn start_deletion(&mut self) -> Result<(), AppError> {
        self.expect_idle("start deletion")?;
        self.step = Step::AwaitingDeleteSelection;
        Ok(())
    }

    pub fn expect_delete_selection(&self) -> Result<(), AppError> {
        match self.step {
            Step::AwaitingDeleteSelection => Ok(()),
            _ => Err(self.wrong_step("accept a delete selection")),
        }
    }

    fn expect_idle(&self, action: &str) -> Result<(), AppError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(self.wrong_step(action))
        }
    }

    fn wrong_step(&self, action: &str) -> AppError {
        AppError::InvalidState(format!("cannot {} while {}", action, self.step.name()))
    }
}

#[derive(Debug)]
struct SessionSlot {
    session: Session,
    touched: Instant,
}

/// Exclusive access to one conversation's session. Other events for the same
/// conversation wait until the guard is dropped.
pub struct SessionGuard {
    slot: OwnedMutexGuard<SessionSlot>,
}

impl Deref for SessionGuard {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.slot.session
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.slot.session
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.slot.touched = Instant::now();
    }
}

/// In-memory sessions keyed by conversation id.
///
/// Slots that are idle, or untouched for longer than `ttl`, are evicted on the
/// next acquire unless someone currently holds them.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    slots: Mutex<HashMap<ConversationId, Arc<Mutex<SessionSlot>>>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, conversation_id: ConversationId) -> SessionGuard {
        let slot = {
            let mut slots = self.slots.lock().await;
            self.evict(&mut slots);
            slots
                .entry(conversation_id)
                .or_insert_with(|| {
                    Arc::new(Mutex::new(SessionSlot {
                        session: Session::default(),
                        touched: Instant::now(),
                    }))
                })
                .clone()
        };

        let mut guard = slot.lock_owned().await;
        if guard.touched.elapsed() > self.ttl && !guard.session.is_idle() {
            tracing::debug!(conversation_id, "Session expired");
            guard.session.reset();
        }
        SessionGuard { slot: guard }
    }

    /// Number of live slots, including idle ones not yet swept.
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn evict(&self, slots: &mut HashMap<ConversationId, Arc<Mutex<SessionSlot>>>) {
        let before = slots.len();
        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(inner) => !inner.session.is_idle() && inner.touched.elapsed() <= self.ttl,
                Err(_) => true,
            }
        });

        let evicted = before - slots.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authoring_transitions() {
        let mut session = Session::default();
        session.start_authoring().unwrap();
        assert_eq!(session.step(), &Step::AwaitingTestName);

        session.accept_test_name("Algebra").unwrap();
        assert_eq!(session.pending_test_name().unwrap(), "Algebra");

        session.reset();
        assert!(session.is_idle());
    }

    #[test]
    fn test_learner_transitions() {
        let mut session = Session::default();
        session.begin_identification("ann").unwrap();
        session.accept_student_name("Ann Lee").unwrap();
        assert_eq!(session.learner().unwrap(), ("ann", "Ann Lee"));
    }

    #[test]
    fn test_wrong_step_rejected() {
        let mut session = Session::default();
        assert!(matches!(session.accept_test_name("x"), Err(AppError::InvalidState(_))));
        assert!(session.pending_test_name().is_err());
        assert!(session.learner().is_err());
        assert!(session.expect_delete_selection().is_err());

        session.start_deletion().unwrap();
        assert!(session.start_authoring().is_err());
        assert!(session.begin_identification("ann").is_err());
        assert_eq!(session.step(), &Step::AwaitingDeleteSelection);
    }

    #[test]
    fn test_reset_discards_working_fields() {
        let mut session = Session::default();
        session.begin_identification("ann").unwrap();
        session.accept_student_name("Ann").unwrap();
        session.reset();

        session.begin_identification("bob").unwrap();
        assert_eq!(
            session.step(),
            &Step::AwaitingLearnerName { username: "bob".into() }
        );
    }

    #[tokio::test]
    async fn test_store_keeps_state_between_acquires() {
        let store = SessionStore::new(Duration::from_secs(60));
        {
            let mut session = store.acquire(1).await;
            session.start_authoring().unwrap();
        }
        let session = store.acquire(1).await;
        assert_eq!(session.step(), &Step::AwaitingTestName);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_swept() {
        let store = SessionStore::new(Duration::from_secs(60));
        drop(store.acquire(1).await);
        {
            let mut session = store.acquire(2).await;
            session.start_deletion().unwrap();
        }
        // Acquiring sweeps the idle slot for conversation 1.
        drop(store.acquire(2).await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_evicted() {
        let store = SessionStore::new(Duration::ZERO);
        {
            let mut session = store.acquire(1).await;
            session.start_authoring().unwrap();
        }
        tokio::time::sleep(Duration::from_millis(5)).await;

        let session = store.acquire(1).await;
        assert!(session.is_idle());
    }

    #[tokio::test]
    async fn test_same_conversation_is_serialized() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let guard = store.acquire(7).await;

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut session = store.acquire(7).await;
                session.start_authoring()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        waiter.await.unwrap().unwrap();
    }
}
