use super::{DepositWorkflow, WorkflowError};
use crate::database::{DepositRequest, FieldPatch, FormField, RequestStore};
use crate::notify::{render, Notifier};
use tracing::{info, warn};

impl<S: RequestStore, N: Notifier> DepositWorkflow<S, N> {
    /// Opens a correction session for the owner of a just-rejected request,
    /// pre-filled with the two fields that were not flagged.
    pub(crate) async fn open_correction(&self, request: &DepositRequest) {
        let Some(field) = request
            .rejection_reason
            .and_then(|reason| reason.correctable_field())
        else {
            return;
        };

        let step = self
            .sessions
            .begin_correction(
                request.user_id,
                request.request_id.clone(),
                field,
                request.external_id.clone(),
                request.amount,
                request.evidence_ref.clone(),
            )
            .await;

        self.dm(request.user_id, &render::correction_prompt(step)).await;
    }

    /// Applies the corrected field to the same request row and re-queues it.
    ///
    /// The `rejected -> pending` transition commits first; refreshing the
    /// admin channel afterwards is best-effort and can never undo it. A
    /// changed evidence image forces delete-and-resend because a photo
    /// cannot be swapped by an in-place caption edit.
    pub(crate) async fn finalize_correction(
        &self,
        user_id: i64,
        request_id: &str,
        patch: FieldPatch,
    ) -> Result<(), WorkflowError> {
        let evidence_changed = patch.field() == FormField::Evidence;

        let Some(request) = self.store.resubmit_request(request_id, &patch).await? else {
            // The row left `rejected` while the user was typing.
            let error = match self.store.get_request(request_id).await? {
                None => WorkflowError::NotFound(request_id.to_string()),
                Some(request) => WorkflowError::Conflict(request.status),
            };
            warn!(request_id, "Correction no longer applies");
            self.dm(user_id, &render::error_feedback(&error)).await;
            return Err(error);
        };

        info!(request_id, user_id, "Request resubmitted");

        self.refresh_admin_message(&request, evidence_changed).await?;
        self.dm(user_id, &render::resubmission_received(&request)).await;
        Ok(())
    }
}
