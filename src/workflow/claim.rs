use super::{DepositWorkflow, WorkflowError};
use crate::database::RequestStore;
use crate::notify::{render, Notifier};
use tracing::info;

impl<S: RequestStore, N: Notifier> DepositWorkflow<S, N> {
    /// Takes exclusive ownership of a pending request for one admin.
    ///
    /// The `pending -> locked` transition is a single conditional update at
    /// the store, so of any number of admins clicking claim at once exactly
    /// one wins; the rest are told the status the request actually has.
    pub async fn claim(&self, request_id: &str, admin_id: i64) -> Result<String, WorkflowError> {
        let Some(request) = self.store.claim_request(request_id, admin_id).await? else {
            return Err(self.classify_claim_failure(request_id).await);
        };

        info!(request_id, admin_id, "Request claimed");

        self.refresh_admin_message(&request, false).await?;
        self.dm(request.user_id, &render::under_review(&request)).await;

        Ok(render::claim_feedback(&request))
    }

    async fn classify_claim_failure(&self, request_id: &str) -> WorkflowError {
        match self.store.get_request(request_id).await {
            Ok(None) => WorkflowError::NotFound(request_id.to_string()),
            Ok(Some(request)) => WorkflowError::Conflict(request.status),
            Err(e) => WorkflowError::Store(e),
        }
    }
}
