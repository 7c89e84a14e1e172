use super::super::types::{DepositRequest, FieldPatch, RejectReason, RequestStatus, User};
use super::super::RequestStore;
use super::DatabaseError;
use super::DatabaseService;
use async_trait::async_trait;
use chrono::Utc;

impl DatabaseService {
    // Conditional update against deposit_requests: the `guards` filters are
    // the compare half of the compare-and-set. PostgREST applies the update
    // only to rows matching every filter and returns the updated rows, so an
    // empty result means the guard lost the race and nothing changed.
    async fn conditional_update(
        &self,
        request_id: &str,
        guards: &[(&str, String)],
        body: serde_json::Value,
    ) -> Result<Option<DepositRequest>, DatabaseError> {
        let mut builder = self
            .client
            .from("deposit_requests")
            .update(body.to_string())
            .eq("request_id", request_id);
        for (column, value) in guards {
            builder = builder.eq(*column, value.as_str());
        }

        let response = builder
            .select("*")
            .execute()
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DatabaseError::QueryError(format!(
                "Conditional update failed with status: {}",
                response.status()
            )));
        }

        let mut rows: Vec<DepositRequest> = response
            .json()
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        Ok(rows.pop())
    }
}

#[async_trait]
impl RequestStore for DatabaseService {
    async fn ensure_user(&self, user_id: i64, username: Option<&str>) -> Result<User, DatabaseError> {
        if let Some(user) = self.fetch_user(user_id).await? {
            return Ok(user);
        }
        self.create_user(user_id, username).await
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, DatabaseError> {
        self.fetch_user(user_id).await
    }

    async fn insert_request(&self, request: &DepositRequest) -> Result<(), DatabaseError> {
        let response = self
            .client
            .from("deposit_requests")
            .insert(
                serde_json::to_string(request)
                    .map_err(|e| DatabaseError::QueryError(e.to_string()))?,
            )
            .execute()
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        if response.status() == 409 {
            return Err(DatabaseError::DuplicateRequestId);
        }
        if !response.status().is_success() {
            return Err(DatabaseError::QueryError(format!(
                "Insert failed with status: {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn get_request(&self, request_id: &str) -> Result<Option<DepositRequest>, DatabaseError> {
        let response = self
            .client
            .from("deposit_requests")
            .select("*")
            .eq("request_id", request_id)
            .single()
            .execute()
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        if response.status() == 406 {
            // No rows found
            return Ok(None);
        }

        let request: DepositRequest = response
            .json()
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        Ok(Some(request))
    }

    async fn claim_request(
        &self,
        request_id: &str,
        admin_id: i64,
    ) -> Result<Option<DepositRequest>, DatabaseError> {
        self.conditional_update(
            request_id,
            &[("status", RequestStatus::Pending.as_str().to_string())],
            serde_json::json!({
                "status": RequestStatus::Locked,
                "claimed_by": admin_id,
                "updated_at": Utc::now(),
            }),
        )
        .await
    }

    async fn approve_request(
        &self,
        request_id: &str,
        admin_id: i64,
    ) -> Result<Option<DepositRequest>, DatabaseError> {
        self.conditional_update(
            request_id,
            &[
                ("status", RequestStatus::Locked.as_str().to_string()),
                ("claimed_by", admin_id.to_string()),
            ],
            serde_json::json!({
                "status": RequestStatus::Approved,
                "updated_at": Utc::now(),
            }),
        )
        .await
    }

    async fn reject_request(
        &self,
        request_id: &str,
        admin_id: i64,
        reason: RejectReason,
        note: Option<&str>,
    ) -> Result<Option<DepositRequest>, DatabaseError> {
        self.conditional_update(
            request_id,
            &[
                ("status", RequestStatus::Locked.as_str().to_string()),
                ("claimed_by", admin_id.to_string()),
            ],
            serde_json::json!({
                "status": RequestStatus::Rejected,
                "rejection_reason": reason,
                "rejection_note": note,
                "updated_at": Utc::now(),
            }),
        )
        .await
    }

    async fn resubmit_request(
        &self,
        request_id: &str,
        patch: &FieldPatch,
    ) -> Result<Option<DepositRequest>, DatabaseError> {
        let mut body = serde_json::json!({
            "status": RequestStatus::Pending,
            "claimed_by": null,
            "rejection_reason": null,
            "rejection_note": null,
            "updated_at": Utc::now(),
        });
        match patch {
            FieldPatch::ExternalId(id) => body["external_id"] = serde_json::json!(id),
            FieldPatch::Amount(amount) => body["amount"] = serde_json::json!(amount),
            FieldPatch::Evidence(evidence) => body["evidence_ref"] = serde_json::json!(evidence),
        }

        self.conditional_update(
            request_id,
            &[("status", RequestStatus::Rejected.as_str().to_string())],
            body,
        )
        .await
    }

    async fn set_notification_handle(
        &self,
        request_id: &str,
        handle: Option<(i64, i32)>,
    ) -> Result<(), DatabaseError> {
        let body = match handle {
            Some((chat_id, message_id)) => serde_json::json!({
                "admin_chat_id": chat_id,
                "admin_message_id": message_id,
            }),
            None => serde_json::json!({
                "admin_chat_id": null,
                "admin_message_id": null,
            }),
        };

        let response = self
            .client
            .from("deposit_requests")
            .update(body.to_string())
            .eq("request_id", request_id)
            .execute()
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DatabaseError::QueryError(format!(
                "Handle update failed with status: {}",
                response.status()
            )));
        }

        Ok(())
    }
}
