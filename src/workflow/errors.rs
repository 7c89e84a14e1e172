use crate::database::{DatabaseError, RequestStatus};
use thiserror::Error;

/// Failures surfaced to the actor who triggered the event. Each is handled
/// at the boundary of that single event and never aborts other in-flight
/// requests or sessions.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Request {0} not found")]
    NotFound(String),

    /// The request was not in the status the action requires; carries the
    /// status it actually had.
    #[error("Request is already {0}")]
    Conflict(RequestStatus),

    /// Decision attempted by an admin who does not hold the claim.
    #[error("Request is claimed by another admin")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] DatabaseError),
}
