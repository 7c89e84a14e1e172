mod claim;
mod decision;
mod errors;
mod resubmit;

pub use errors::WorkflowError;

use crate::database::{DepositRequest, RequestStore, User};
use crate::events::{ButtonCommand, InboundEvent};
use crate::notify::{self, render, AdminNotice, Controls, MessageHandle, Notifier};
use crate::session::{CompletedForm, SessionManager, SessionOutcome};
use rand::distr::{Alphanumeric, SampleString};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_ID_PREFIX: &str = "DEP";
const REQUEST_ID_SUFFIX_LEN: usize = 6;
const REQUEST_ID_ATTEMPTS: usize = 5;

/// The deposit-request lifecycle engine: routes inbound events into the
/// per-user form, the claim arbiter, the decision engine, and the
/// resubmission controller. Generic over the store and the notifier so the
/// whole lifecycle runs against in-memory fakes in tests.
pub struct DepositWorkflow<S, N> {
    pub(crate) store: Arc<S>,
    pub(crate) notifier: Arc<N>,
    pub(crate) sessions: SessionManager,
    admin_channel: i64,
}

impl<S: RequestStore, N: Notifier> DepositWorkflow<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>, admin_channel: i64) -> Self {
        Self {
            store,
            notifier,
            sessions: SessionManager::new(),
            admin_channel,
        }
    }

    pub fn with_session_timeout(
        store: Arc<S>,
        notifier: Arc<N>,
        admin_channel: i64,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            sessions: SessionManager::with_timeout(timeout),
            admin_channel,
        }
    }

    /// Entry point for the transport. Returns optional feedback for the
    /// actor who triggered the event (shown as a callback answer).
    pub async fn handle_event(&self, event: InboundEvent) -> Result<Option<String>, WorkflowError> {
        match event {
            InboundEvent::Text {
                user_id,
                username,
                text,
            } => {
                self.handle_text(user_id, username.as_deref(), &text).await?;
                Ok(None)
            }
            InboundEvent::Photo {
                user_id,
                username,
                evidence_ref,
            } => {
                self.handle_photo(user_id, username.as_deref(), &evidence_ref)
                    .await?;
                Ok(None)
            }
            InboundEvent::Button { actor_id, token } => self.handle_button(actor_id, &token).await,
        }
    }

    pub async fn handle_text(
        &self,
        user_id: i64,
        username: Option<&str>,
        text: &str,
    ) -> Result<(), WorkflowError> {
        if text.trim() == "/cancel" {
            let had_session = self.sessions.cancel(user_id).await;
            self.dm(user_id, &render::cancelled(had_session)).await;
            return Ok(());
        }

        let outcome = self.sessions.submit_text(user_id, text).await;
        self.apply_session_outcome(user_id, username, outcome).await
    }

    pub async fn handle_photo(
        &self,
        user_id: i64,
        username: Option<&str>,
        evidence_ref: &str,
    ) -> Result<(), WorkflowError> {
        let outcome = self.sessions.submit_photo(user_id, evidence_ref).await;
        self.apply_session_outcome(user_id, username, outcome).await
    }

    pub async fn handle_button(
        &self,
        actor_id: i64,
        token: &str,
    ) -> Result<Option<String>, WorkflowError> {
        match ButtonCommand::parse(token) {
            ButtonCommand::DepositStart => {
                let step = self.sessions.begin(actor_id).await;
                self.dm(actor_id, &render::prompt_for(step)).await;
                Ok(None)
            }
            ButtonCommand::Lock(request_id) => {
                self.claim(&request_id, actor_id).await.map(Some)
            }
            ButtonCommand::Approve(request_id) => {
                self.approve(&request_id, actor_id).await.map(Some)
            }
            ButtonCommand::Reject(request_id) => {
                self.reject_menu(&request_id, actor_id).await.map(Some)
            }
            ButtonCommand::Resubmit(reason, request_id) => self
                .reject(&request_id, actor_id, reason, None)
                .await
                .map(Some),
            ButtonCommand::Ignored => {
                debug!(token, "Ignoring unrecognized button token");
                Ok(None)
            }
        }
    }

    async fn apply_session_outcome(
        &self,
        user_id: i64,
        username: Option<&str>,
        outcome: SessionOutcome,
    ) -> Result<(), WorkflowError> {
        match outcome {
            SessionOutcome::Prompt(step) => {
                self.dm(user_id, &render::prompt_for(step)).await;
                Ok(())
            }
            SessionOutcome::Reprompt { step, error } => {
                self.dm(user_id, &render::reprompt(step, &error)).await;
                Ok(())
            }
            SessionOutcome::NoSession => {
                self.dm(user_id, &render::no_session_hint()).await;
                Ok(())
            }
            SessionOutcome::Completed(CompletedForm::New {
                external_id,
                amount,
                evidence_ref,
            }) => {
                self.finalize_submission(user_id, username, external_id, amount, evidence_ref)
                    .await
            }
            SessionOutcome::Completed(CompletedForm::Correction { request_id, patch }) => {
                self.finalize_correction(user_id, &request_id, patch).await
            }
        }
    }

    /// Creates the durable request row and announces it in the admin channel.
    async fn finalize_submission(
        &self,
        user_id: i64,
        username: Option<&str>,
        external_id: String,
        amount: Decimal,
        evidence_ref: String,
    ) -> Result<(), WorkflowError> {
        let user = self.store.ensure_user(user_id, username).await?;
        let request = self
            .insert_with_fresh_id(user_id, external_id, amount, evidence_ref)
            .await?;

        let notice = self.admin_notice(&request, Some(&user));
        match self.notifier.post(self.admin_channel, &notice).await {
            Ok(handle) => {
                self.store
                    .set_notification_handle(
                        &request.request_id,
                        Some((handle.chat_id, handle.message_id)),
                    )
                    .await?;
            }
            Err(e) => {
                warn!(request_id = %request.request_id, error = %e,
                    "Could not announce new request in admin channel");
            }
        }

        self.dm(user_id, &render::submission_received(&request)).await;
        Ok(())
    }

    async fn insert_with_fresh_id(
        &self,
        user_id: i64,
        external_id: String,
        amount: Decimal,
        evidence_ref: String,
    ) -> Result<DepositRequest, WorkflowError> {
        for _ in 0..REQUEST_ID_ATTEMPTS {
            let request = DepositRequest::new(
                new_request_id(),
                user_id,
                external_id.clone(),
                amount,
                evidence_ref.clone(),
            );
            match self.store.insert_request(&request).await {
                Ok(()) => return Ok(request),
                Err(crate::database::DatabaseError::DuplicateRequestId) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(crate::database::DatabaseError::DuplicateRequestId.into())
    }

    pub(crate) fn admin_notice(
        &self,
        request: &DepositRequest,
        user: Option<&User>,
    ) -> AdminNotice {
        AdminNotice {
            caption: render::admin_caption(request, user),
            photo_ref: Some(request.evidence_ref.clone()),
            controls: controls_for(request),
        }
    }

    /// Re-renders the admin-channel message after a transition and keeps the
    /// stored handle in sync. Best-effort: a delivery failure is logged and
    /// the committed transition stands.
    pub(crate) async fn refresh_admin_message(
        &self,
        request: &DepositRequest,
        force_replace: bool,
    ) -> Result<(), WorkflowError> {
        let user = self.store.get_user(request.user_id).await?;
        let notice = self.admin_notice(request, user.as_ref());
        let old_handle = stored_handle(request);

        let new_handle = notify::edit_or_replace(
            self.notifier.as_ref(),
            self.admin_channel,
            old_handle,
            &notice,
            force_replace,
        )
        .await;

        if new_handle != old_handle {
            self.store
                .set_notification_handle(
                    &request.request_id,
                    new_handle.map(|h| (h.chat_id, h.message_id)),
                )
                .await?;
        }
        Ok(())
    }

    /// Direct message to a user; failures are soft.
    pub(crate) async fn dm(&self, user_id: i64, text: &str) {
        if let Err(e) = self.notifier.send_direct(user_id, text).await {
            warn!(user_id, error = %e, "Could not send direct message");
        }
    }

    /// Distinguishes why a conditional update found no matching row.
    pub(crate) async fn classify_decision_failure(
        &self,
        request_id: &str,
        admin_id: i64,
    ) -> WorkflowError {
        match self.store.get_request(request_id).await {
            Ok(None) => WorkflowError::NotFound(request_id.to_string()),
            Ok(Some(request)) => {
                if request.status == crate::database::RequestStatus::Locked
                    && request.claimed_by != Some(admin_id)
                {
                    WorkflowError::Forbidden
                } else {
                    WorkflowError::Conflict(request.status)
                }
            }
            Err(e) => WorkflowError::Store(e),
        }
    }
}

pub(crate) fn stored_handle(request: &DepositRequest) -> Option<MessageHandle> {
    match (request.admin_chat_id, request.admin_message_id) {
        (Some(chat_id), Some(message_id)) => Some(MessageHandle {
            chat_id,
            message_id,
        }),
        _ => None,
    }
}

/// Controls matching the legal next actions for the request's status.
pub(crate) fn controls_for(request: &DepositRequest) -> Controls {
    match request.status {
        crate::database::RequestStatus::Pending => Controls::Claim {
            request_id: request.request_id.clone(),
        },
        crate::database::RequestStatus::Locked => Controls::Decide {
            request_id: request.request_id.clone(),
        },
        crate::database::RequestStatus::Approved | crate::database::RequestStatus::Rejected => {
            Controls::None
        }
    }
}

/// Human-readable unique token, e.g. `DEP-AB12Q9`.
fn new_request_id() -> String {
    let suffix = Alphanumeric
        .sample_string(&mut rand::rng(), REQUEST_ID_SUFFIX_LEN)
        .to_uppercase();
    format!("{}-{}", REQUEST_ID_PREFIX, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_have_the_expected_shape() {
        let id = new_request_id();
        assert!(id.starts_with("DEP-"));
        assert_eq!(id.len(), 4 + REQUEST_ID_SUFFIX_LEN);
        assert!(id[4..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn request_ids_are_not_repeating() {
        let a = new_request_id();
        let b = new_request_id();
        let c = new_request_id();
        assert!(!(a == b && b == c));
    }
}
