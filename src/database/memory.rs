use super::errors::DatabaseError;
use super::types::{DepositRequest, FieldPatch, RejectReason, RequestStatus, User};
use super::RequestStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory [`RequestStore`] used by the test suite.
///
/// A single lock spans each conditional update, so the compare-and-set
/// semantics match the PostgREST backend: the guard check and the write are
/// one atomic step.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<i64, User>,
    requests: HashMap<String, DepositRequest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn ensure_user(&self, user_id: i64, username: Option<&str>) -> Result<User, DatabaseError> {
        let mut tables = self.inner.lock().await;
        let user = tables
            .users
            .entry(user_id)
            .or_insert_with(|| User::new(user_id, username.map(|s| s.to_string())));
        Ok(user.clone())
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, DatabaseError> {
        let tables = self.inner.lock().await;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn insert_request(&self, request: &DepositRequest) -> Result<(), DatabaseError> {
        let mut tables = self.inner.lock().await;
        if tables.requests.contains_key(&request.request_id) {
            return Err(DatabaseError::DuplicateRequestId);
        }
        tables
            .requests
            .insert(request.request_id.clone(), request.clone());
        Ok(())
    }

    async fn get_request(&self, request_id: &str) -> Result<Option<DepositRequest>, DatabaseError> {
        let tables = self.inner.lock().await;
        Ok(tables.requests.get(request_id).cloned())
    }

    async fn claim_request(
        &self,
        request_id: &str,
        admin_id: i64,
    ) -> Result<Option<DepositRequest>, DatabaseError> {
        let mut tables = self.inner.lock().await;
        match tables.requests.get_mut(request_id) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.status = RequestStatus::Locked;
                request.claimed_by = Some(admin_id);
                request.updated_at = Utc::now();
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn approve_request(
        &self,
        request_id: &str,
        admin_id: i64,
    ) -> Result<Option<DepositRequest>, DatabaseError> {
        let mut tables = self.inner.lock().await;
        match tables.requests.get_mut(request_id) {
            Some(request)
                if request.status == RequestStatus::Locked
                    && request.claimed_by == Some(admin_id) =>
            {
                request.status = RequestStatus::Approved;
                request.updated_at = Utc::now();
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn reject_request(
        &self,
        request_id: &str,
        admin_id: i64,
        reason: RejectReason,
        note: Option<&str>,
    ) -> Result<Option<DepositRequest>, DatabaseError> {
        let mut tables = self.inner.lock().await;
        match tables.requests.get_mut(request_id) {
            Some(request)
                if request.status == RequestStatus::Locked
                    && request.claimed_by == Some(admin_id) =>
            {
                request.status = RequestStatus::Rejected;
                request.rejection_reason = Some(reason);
                request.rejection_note = note.map(|s| s.to_string());
                request.updated_at = Utc::now();
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn resubmit_request(
        &self,
        request_id: &str,
        patch: &FieldPatch,
    ) -> Result<Option<DepositRequest>, DatabaseError> {
        let mut tables = self.inner.lock().await;
        match tables.requests.get_mut(request_id) {
            Some(request) if request.status == RequestStatus::Rejected => {
                match patch {
                    FieldPatch::ExternalId(id) => request.external_id = id.clone(),
                    FieldPatch::Amount(amount) => request.amount = *amount,
                    FieldPatch::Evidence(evidence) => request.evidence_ref = evidence.clone(),
                }
                request.status = RequestStatus::Pending;
                request.claimed_by = None;
                request.rejection_reason = None;
                request.rejection_note = None;
                request.updated_at = Utc::now();
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_notification_handle(
        &self,
        request_id: &str,
        handle: Option<(i64, i32)>,
    ) -> Result<(), DatabaseError> {
        let mut tables = self.inner.lock().await;
        if let Some(request) = tables.requests.get_mut(request_id) {
            match handle {
                Some((chat_id, message_id)) => {
                    request.admin_chat_id = Some(chat_id);
                    request.admin_message_id = Some(message_id);
                }
                None => {
                    request.admin_chat_id = None;
                    request.admin_message_id = None;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_request(id: &str) -> DepositRequest {
        DepositRequest::new(id.to_string(), 7, "u1".to_string(), dec!(100), "photo".to_string())
    }

    #[tokio::test]
    async fn claim_succeeds_only_from_pending() {
        let store = MemoryStore::new();
        store.insert_request(&sample_request("DEP-000001")).await.unwrap();

        let claimed = store.claim_request("DEP-000001", 1).await.unwrap().unwrap();
        assert_eq!(claimed.status, RequestStatus::Locked);
        assert_eq!(claimed.claimed_by, Some(1));

        // Second claim finds the row locked and must not mutate it.
        assert!(store.claim_request("DEP-000001", 2).await.unwrap().is_none());
        let row = store.get_request("DEP-000001").await.unwrap().unwrap();
        assert_eq!(row.claimed_by, Some(1));
    }

    #[tokio::test]
    async fn decisions_are_guarded_on_claimant() {
        let store = MemoryStore::new();
        store.insert_request(&sample_request("DEP-000002")).await.unwrap();
        store.claim_request("DEP-000002", 1).await.unwrap();

        assert!(store.approve_request("DEP-000002", 2).await.unwrap().is_none());
        assert!(store
            .reject_request("DEP-000002", 2, RejectReason::Other, None)
            .await
            .unwrap()
            .is_none());

        let approved = store.approve_request("DEP-000002", 1).await.unwrap().unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn resubmit_applies_patch_and_clears_claimant() {
        let store = MemoryStore::new();
        store.insert_request(&sample_request("DEP-000003")).await.unwrap();
        store.claim_request("DEP-000003", 1).await.unwrap();
        store
            .reject_request("DEP-000003", 1, RejectReason::WrongAmount, None)
            .await
            .unwrap();

        let row = store
            .resubmit_request("DEP-000003", &FieldPatch::Amount(dec!(150)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, RequestStatus::Pending);
        assert_eq!(row.amount, dec!(150));
        assert_eq!(row.external_id, "u1");
        assert_eq!(row.evidence_ref, "photo");
        assert!(row.claimed_by.is_none());
        assert!(row.rejection_reason.is_none());
    }

    #[tokio::test]
    async fn duplicate_request_id_is_rejected() {
        let store = MemoryStore::new();
        store.insert_request(&sample_request("DEP-000004")).await.unwrap();
        let err = store.insert_request(&sample_request("DEP-000004")).await;
        assert!(matches!(err, Err(DatabaseError::DuplicateRequestId)));
    }
}
