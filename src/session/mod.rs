use crate::database::types::{FieldPatch, FormField};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// A session untouched for this long is dropped on next access and the user
/// has to start over.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    AwaitingId,
    AwaitingAmount,
    AwaitingScreenshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    New,
    Correcting { request_id: String, field: FormField },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Amount must be a number")]
    InvalidAmount,
    #[error("Amount cannot be negative")]
    NegativeAmount,
    #[error("Identifier cannot be empty")]
    EmptyId,
    #[error("A photo is not expected at this step")]
    PhotoTooEarly,
    #[error("Text is not expected at this step")]
    TextAtScreenshotStep,
}

/// What a finished form asks the workflow to do.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletedForm {
    New {
        external_id: String,
        amount: Decimal,
        evidence_ref: String,
    },
    Correction {
        request_id: String,
        patch: FieldPatch,
    },
}

#[derive(Debug, PartialEq)]
pub enum SessionOutcome {
    /// Advanced; prompt the user for this step next.
    Prompt(Step),
    /// Input rejected; prompt the same step again, nothing advanced.
    Reprompt { step: Step, error: ValidationError },
    /// Form finished; the session has been destroyed.
    Completed(CompletedForm),
    /// No live session for this user (never started, cancelled, or expired).
    NoSession,
}

#[derive(Debug)]
struct ConversationSession {
    mode: Mode,
    step: Step,
    external_id: Option<String>,
    amount: Option<Decimal>,
    evidence_ref: Option<String>,
    last_activity: Instant,
}

impl ConversationSession {
    /// First field slot still empty, in submission order. In correction mode
    /// the two untouched slots are pre-filled, truncating the sequence to
    /// the single flagged field.
    fn next_step(&self) -> Option<Step> {
        if self.external_id.is_none() {
            Some(Step::AwaitingId)
        } else if self.amount.is_none() {
            Some(Step::AwaitingAmount)
        } else if self.evidence_ref.is_none() {
            Some(Step::AwaitingScreenshot)
        } else {
            None
        }
    }

    fn complete(self) -> CompletedForm {
        match self.mode {
            Mode::New => CompletedForm::New {
                external_id: self.external_id.unwrap_or_default(),
                amount: self.amount.unwrap_or_default(),
                evidence_ref: self.evidence_ref.unwrap_or_default(),
            },
            Mode::Correcting { request_id, field } => {
                let patch = match field {
                    FormField::ExternalId => {
                        FieldPatch::ExternalId(self.external_id.unwrap_or_default())
                    }
                    FormField::Amount => FieldPatch::Amount(self.amount.unwrap_or_default()),
                    FormField::Evidence => {
                        FieldPatch::Evidence(self.evidence_ref.unwrap_or_default())
                    }
                };
                CompletedForm::Correction { request_id, patch }
            }
        }
    }
}

/// Per-user conversation state. One session per user; `begin` overwrites any
/// unfinished one. Access is serialized through the internal lock, which is
/// the only coordination sessions need since every event targets one user.
pub struct SessionManager {
    sessions: Mutex<HashMap<i64, ConversationSession>>,
    timeout: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_timeout(SESSION_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Starts a fresh submission flow, discarding any prior session.
    pub async fn begin(&self, user_id: i64) -> Step {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            user_id,
            ConversationSession {
                mode: Mode::New,
                step: Step::AwaitingId,
                external_id: None,
                amount: None,
                evidence_ref: None,
                last_activity: Instant::now(),
            },
        );
        Step::AwaitingId
    }

    /// Starts a correction flow for one flagged field, pre-filling the other
    /// two from the existing request row.
    pub async fn begin_correction(
        &self,
        user_id: i64,
        request_id: String,
        field: FormField,
        external_id: String,
        amount: Decimal,
        evidence_ref: String,
    ) -> Step {
        let (step, external_id, amount, evidence_ref) = match field {
            FormField::ExternalId => (Step::AwaitingId, None, Some(amount), Some(evidence_ref)),
            FormField::Amount => (Step::AwaitingAmount, Some(external_id), None, Some(evidence_ref)),
            FormField::Evidence => (Step::AwaitingScreenshot, Some(external_id), Some(amount), None),
        };

        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            user_id,
            ConversationSession {
                mode: Mode::Correcting { request_id, field },
                step,
                external_id,
                amount,
                evidence_ref,
                last_activity: Instant::now(),
            },
        );
        step
    }

    pub async fn submit_text(&self, user_id: i64, text: &str) -> SessionOutcome {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = live_session(&mut sessions, user_id, self.timeout) else {
            return SessionOutcome::NoSession;
        };

        let step = session.step;
        match step {
            Step::AwaitingId => {
                let id = text.trim();
                if id.is_empty() {
                    return SessionOutcome::Reprompt {
                        step,
                        error: ValidationError::EmptyId,
                    };
                }
                session.external_id = Some(id.to_string());
            }
            Step::AwaitingAmount => {
                let amount = match Decimal::from_str(text.trim()) {
                    Ok(amount) => amount,
                    Err(_) => {
                        return SessionOutcome::Reprompt {
                            step,
                            error: ValidationError::InvalidAmount,
                        }
                    }
                };
                if amount.is_sign_negative() {
                    return SessionOutcome::Reprompt {
                        step,
                        error: ValidationError::NegativeAmount,
                    };
                }
                session.amount = Some(amount);
            }
            Step::AwaitingScreenshot => {
                return SessionOutcome::Reprompt {
                    step,
                    error: ValidationError::TextAtScreenshotStep,
                }
            }
        }

        advance(&mut sessions, user_id)
    }

    pub async fn submit_photo(&self, user_id: i64, evidence_ref: &str) -> SessionOutcome {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = live_session(&mut sessions, user_id, self.timeout) else {
            return SessionOutcome::NoSession;
        };

        if session.step != Step::AwaitingScreenshot {
            return SessionOutcome::Reprompt {
                step: session.step,
                error: ValidationError::PhotoTooEarly,
            };
        }
        session.evidence_ref = Some(evidence_ref.to_string());

        advance(&mut sessions, user_id)
    }

    /// Destroys the session if one exists; reports whether it did.
    pub async fn cancel(&self, user_id: i64) -> bool {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(&user_id).is_some()
    }
}

/// Looks up the user's session, dropping it first if it has gone stale.
fn live_session<'a>(
    sessions: &'a mut HashMap<i64, ConversationSession>,
    user_id: i64,
    timeout: Duration,
) -> Option<&'a mut ConversationSession> {
    if let Some(session) = sessions.get(&user_id) {
        if session.last_activity.elapsed() > timeout {
            sessions.remove(&user_id);
            return None;
        }
    }
    let session = sessions.get_mut(&user_id)?;
    session.last_activity = Instant::now();
    Some(session)
}

fn advance(sessions: &mut HashMap<i64, ConversationSession>, user_id: i64) -> SessionOutcome {
    let Some(session) = sessions.get_mut(&user_id) else {
        return SessionOutcome::NoSession;
    };
    match session.next_step() {
        Some(step) => {
            session.step = step;
            SessionOutcome::Prompt(step)
        }
        None => match sessions.remove(&user_id) {
            Some(session) => SessionOutcome::Completed(session.complete()),
            None => SessionOutcome::NoSession,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn new_submission_collects_id_then_amount_then_photo() {
        let manager = SessionManager::new();
        assert_eq!(manager.begin(1).await, Step::AwaitingId);

        assert_eq!(
            manager.submit_text(1, "123456").await,
            SessionOutcome::Prompt(Step::AwaitingAmount)
        );
        assert_eq!(
            manager.submit_text(1, "20000").await,
            SessionOutcome::Prompt(Step::AwaitingScreenshot)
        );
        assert_eq!(
            manager.submit_photo(1, "p1").await,
            SessionOutcome::Completed(CompletedForm::New {
                external_id: "123456".to_string(),
                amount: dec!(20000),
                evidence_ref: "p1".to_string(),
            })
        );

        // Session destroyed on completion.
        assert_eq!(manager.submit_text(1, "again").await, SessionOutcome::NoSession);
    }

    #[tokio::test]
    async fn photo_before_amount_reprompts_without_advancing() {
        let manager = SessionManager::new();
        manager.begin(1).await;
        manager.submit_text(1, "123456").await;

        assert_eq!(
            manager.submit_photo(1, "p1").await,
            SessionOutcome::Reprompt {
                step: Step::AwaitingAmount,
                error: ValidationError::PhotoTooEarly,
            }
        );
        // Still at the amount step.
        assert_eq!(
            manager.submit_text(1, "500").await,
            SessionOutcome::Prompt(Step::AwaitingScreenshot)
        );
    }

    #[tokio::test]
    async fn bad_amount_reprompts_same_step() {
        let manager = SessionManager::new();
        manager.begin(1).await;
        manager.submit_text(1, "123456").await;

        assert_eq!(
            manager.submit_text(1, "not a number").await,
            SessionOutcome::Reprompt {
                step: Step::AwaitingAmount,
                error: ValidationError::InvalidAmount,
            }
        );
        assert_eq!(
            manager.submit_text(1, "-5").await,
            SessionOutcome::Reprompt {
                step: Step::AwaitingAmount,
                error: ValidationError::NegativeAmount,
            }
        );
        assert_eq!(
            manager.submit_text(1, "10000").await,
            SessionOutcome::Prompt(Step::AwaitingScreenshot)
        );
    }

    #[tokio::test]
    async fn correction_asks_only_the_flagged_field() {
        let manager = SessionManager::new();
        let step = manager
            .begin_correction(
                1,
                "DEP-AB12Q9".to_string(),
                FormField::Amount,
                "u1".to_string(),
                dec!(10000),
                "p1".to_string(),
            )
            .await;
        assert_eq!(step, Step::AwaitingAmount);

        assert_eq!(
            manager.submit_text(1, "15000").await,
            SessionOutcome::Completed(CompletedForm::Correction {
                request_id: "DEP-AB12Q9".to_string(),
                patch: FieldPatch::Amount(dec!(15000)),
            })
        );
    }

    #[tokio::test]
    async fn begin_overwrites_unfinished_session() {
        let manager = SessionManager::new();
        manager.begin(1).await;
        manager.submit_text(1, "old-id").await;

        manager.begin(1).await;
        assert_eq!(
            manager.submit_text(1, "new-id").await,
            SessionOutcome::Prompt(Step::AwaitingAmount)
        );
    }

    #[tokio::test]
    async fn cancel_destroys_session() {
        let manager = SessionManager::new();
        manager.begin(1).await;
        assert!(manager.cancel(1).await);
        assert!(!manager.cancel(1).await);
        assert_eq!(manager.submit_text(1, "123").await, SessionOutcome::NoSession);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_expires_lazily() {
        let manager = SessionManager::new();
        manager.begin(1).await;
        manager.submit_text(1, "123456").await;

        tokio::time::advance(Duration::from_secs(601)).await;

        // No residual fields: the next event sees no session at all.
        assert_eq!(manager.submit_text(1, "20000").await, SessionOutcome::NoSession);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_keeps_session_alive() {
        let manager = SessionManager::new();
        manager.begin(1).await;

        tokio::time::advance(Duration::from_secs(599)).await;
        assert_eq!(
            manager.submit_text(1, "123456").await,
            SessionOutcome::Prompt(Step::AwaitingAmount)
        );

        tokio::time::advance(Duration::from_secs(599)).await;
        assert_eq!(
            manager.submit_text(1, "20000").await,
            SessionOutcome::Prompt(Step::AwaitingScreenshot)
        );
    }
}
