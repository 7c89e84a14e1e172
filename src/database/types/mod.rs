mod request;
mod user;

pub use request::{DepositRequest, FieldPatch, FormField, RejectReason, RequestStatus};
pub use user::User;
