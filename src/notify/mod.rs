pub mod render;
pub mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Identifies the admin-facing message for a request so it can be edited or
/// replaced later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Legal next actions for a request, rendered by the transport as buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controls {
    Claim { request_id: String },
    Decide { request_id: String },
    RejectReasons { request_id: String },
    None,
}

/// An admin-channel message: evidence photo plus caption plus controls.
#[derive(Debug, Clone)]
pub struct AdminNotice {
    pub caption: String,
    pub photo_ref: Option<String>,
    pub controls: Controls,
}

/// Outward-facing message boundary. Every call is best-effort and
/// independently retryable; a failure never rolls back a committed state
/// transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post(&self, channel: i64, notice: &AdminNotice) -> Result<MessageHandle, NotifyError>;

    async fn edit(
        &self,
        handle: MessageHandle,
        notice: &AdminNotice,
    ) -> Result<MessageHandle, NotifyError>;

    async fn delete(&self, handle: MessageHandle) -> Result<(), NotifyError>;

    async fn send_direct(&self, user_id: i64, text: &str) -> Result<(), NotifyError>;
}

/// Refreshes the admin-channel message for a request.
///
/// Tries an in-place edit first; when there is no previous message, when the
/// edit fails (photo captions cannot always be edited), or when the caller
/// knows the evidence image changed (`force_replace`), the old message is
/// deleted and a fresh one posted. Returns the handle the caller must store:
/// `None` means delivery failed and the stored handle has to be cleared
/// rather than left dangling. Failures are logged, never propagated.
pub async fn edit_or_replace<N: Notifier + ?Sized>(
    notifier: &N,
    channel: i64,
    handle: Option<MessageHandle>,
    notice: &AdminNotice,
    force_replace: bool,
) -> Option<MessageHandle> {
    if let Some(handle) = handle {
        if !force_replace {
            match notifier.edit(handle, notice).await {
                Ok(handle) => return Some(handle),
                Err(e) => {
                    warn!(chat_id = handle.chat_id, message_id = handle.message_id, error = %e,
                        "Edit failed, replacing admin message");
                }
            }
        }
        if let Err(e) = notifier.delete(handle).await {
            warn!(chat_id = handle.chat_id, message_id = handle.message_id, error = %e,
                "Could not delete stale admin message");
        }
    }

    match notifier.post(channel, notice).await {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(channel, error = %e, "Could not post admin message");
            None
        }
    }
}
