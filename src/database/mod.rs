pub mod errors;
pub mod memory;
pub mod services;
pub mod types;

pub use errors::DatabaseError;
pub use memory::MemoryStore;
pub use services::DatabaseService;
pub use types::{DepositRequest, FieldPatch, FormField, RejectReason, RequestStatus, User};

use async_trait::async_trait;

/// Storage seam for the deposit lifecycle.
///
/// Every status transition is a single conditional update at the backend:
/// the methods below return `Some(updated_row)` only when the guard
/// (expected status, and for decisions the claiming admin) matched, and
/// `None` with no mutation otherwise. Two admins racing on the same button
/// are serialized here, not by in-process locks, because actions may come
/// from different processes.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Fetches the user row, creating it on first interaction.
    async fn ensure_user(&self, user_id: i64, username: Option<&str>) -> Result<User, DatabaseError>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, DatabaseError>;

    /// Fails with `DuplicateRequestId` if the id is already taken.
    async fn insert_request(&self, request: &DepositRequest) -> Result<(), DatabaseError>;

    async fn get_request(&self, request_id: &str) -> Result<Option<DepositRequest>, DatabaseError>;

    /// `pending -> locked`, setting `claimed_by = admin_id`.
    async fn claim_request(
        &self,
        request_id: &str,
        admin_id: i64,
    ) -> Result<Option<DepositRequest>, DatabaseError>;

    /// `locked -> approved`, guarded on `claimed_by == admin_id`.
    async fn approve_request(
        &self,
        request_id: &str,
        admin_id: i64,
    ) -> Result<Option<DepositRequest>, DatabaseError>;

    /// `locked -> rejected`, guarded on `claimed_by == admin_id`.
    async fn reject_request(
        &self,
        request_id: &str,
        admin_id: i64,
        reason: RejectReason,
        note: Option<&str>,
    ) -> Result<Option<DepositRequest>, DatabaseError>;

    /// `rejected -> pending` on the same row: applies the corrected field,
    /// clears the claimant and the rejection reason.
    async fn resubmit_request(
        &self,
        request_id: &str,
        patch: &FieldPatch,
    ) -> Result<Option<DepositRequest>, DatabaseError>;

    /// Overwrites the stored admin-channel message handle. `None` clears it.
    async fn set_notification_handle(
        &self,
        request_id: &str,
        handle: Option<(i64, i32)>,
    ) -> Result<(), DatabaseError>;
}
