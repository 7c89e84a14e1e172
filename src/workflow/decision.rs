use super::{DepositWorkflow, WorkflowError};
use crate::database::{RejectReason, RequestStatus, RequestStore};
use crate::notify::{render, AdminNotice, Controls, Notifier};
use tracing::info;

impl<S: RequestStore, N: Notifier> DepositWorkflow<S, N> {
    /// Approves a locked request. Only the claiming admin may do this; the
    /// guard lives in the store's conditional update.
    pub async fn approve(&self, request_id: &str, admin_id: i64) -> Result<String, WorkflowError> {
        let Some(request) = self.store.approve_request(request_id, admin_id).await? else {
            return Err(self.classify_decision_failure(request_id, admin_id).await);
        };

        info!(request_id, admin_id, "Request approved");

        self.refresh_admin_message(&request, false).await?;
        self.dm(request.user_id, &render::approved(&request)).await;

        Ok(render::approve_feedback(&request))
    }

    /// Rejects a locked request with a reason. A correctable reason opens a
    /// single-field correction session for the owner right away.
    pub async fn reject(
        &self,
        request_id: &str,
        admin_id: i64,
        reason: RejectReason,
        note: Option<&str>,
    ) -> Result<String, WorkflowError> {
        let Some(request) = self
            .store
            .reject_request(request_id, admin_id, reason, note)
            .await?
        else {
            return Err(self.classify_decision_failure(request_id, admin_id).await);
        };

        info!(request_id, admin_id, reason = %reason, "Request rejected");

        self.refresh_admin_message(&request, false).await?;
        self.dm(request.user_id, &render::rejected(&request)).await;

        if reason.correctable_field().is_some() {
            self.open_correction(&request).await;
        }

        Ok(render::reject_feedback(&request))
    }

    /// Swaps the admin message's controls for the reason picker. No state
    /// change; ownership is still enforced so a bystander admin cannot
    /// steer someone else's rejection.
    pub async fn reject_menu(
        &self,
        request_id: &str,
        admin_id: i64,
    ) -> Result<String, WorkflowError> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(request_id.to_string()))?;

        if request.status != RequestStatus::Locked {
            return Err(WorkflowError::Conflict(request.status));
        }
        if request.claimed_by != Some(admin_id) {
            return Err(WorkflowError::Forbidden);
        }

        let user = self.store.get_user(request.user_id).await?;
        let notice = AdminNotice {
            caption: render::admin_caption(&request, user.as_ref()),
            photo_ref: Some(request.evidence_ref.clone()),
            controls: Controls::RejectReasons {
                request_id: request.request_id.clone(),
            },
        };
        if let Some(handle) = super::stored_handle(&request) {
            // Best-effort; the picker can be reached again from a fresh click.
            if let Err(e) = self.notifier.edit(handle, &notice).await {
                tracing::warn!(request_id, error = %e, "Could not show reject reason picker");
            }
        }

        Ok(render::reason_picker_feedback())
    }
}
