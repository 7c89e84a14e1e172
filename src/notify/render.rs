//! Every user-facing and admin-facing string in one place.

use crate::database::types::{DepositRequest, RejectReason, User};
use crate::session::{Step, ValidationError};
use crate::workflow::WorkflowError;

pub fn greeting() -> String {
    "Welcome! Press the button below to submit a deposit request.".to_string()
}

pub fn prompt_for(step: Step) -> String {
    match step {
        Step::AwaitingId => "Please send your account ID.".to_string(),
        Step::AwaitingAmount => "Enter the deposit amount.".to_string(),
        Step::AwaitingScreenshot => {
            "Send a screenshot of your payment (as a photo).".to_string()
        }
    }
}

pub fn reprompt(step: Step, error: &ValidationError) -> String {
    format!("{}. {}", error, prompt_for(step))
}

pub fn no_session_hint() -> String {
    "There is no deposit request in progress. Use /start to begin.".to_string()
}

pub fn cancelled(had_session: bool) -> String {
    if had_session {
        "Your deposit request has been cancelled.".to_string()
    } else {
        "Nothing to cancel.".to_string()
    }
}

pub fn submission_received(request: &DepositRequest) -> String {
    format!(
        "Your deposit request {} for {} has been submitted. You will be notified once it is reviewed.",
        request.request_id, request.amount
    )
}

pub fn resubmission_received(request: &DepositRequest) -> String {
    format!(
        "Thanks! Request {} has been updated and is back in the review queue.",
        request.request_id
    )
}

pub fn under_review(request: &DepositRequest) -> String {
    format!("Your deposit request {} is now being reviewed.", request.request_id)
}

pub fn approved(request: &DepositRequest) -> String {
    format!(
        "✅ Your deposit request {} for {} has been approved.",
        request.request_id, request.amount
    )
}

pub fn rejected(request: &DepositRequest) -> String {
    let reason = match request.rejection_reason {
        Some(RejectReason::WrongId) => "the account ID looks wrong",
        Some(RejectReason::WrongAmount) => "the amount looks wrong",
        Some(RejectReason::WrongEvidence) => "the screenshot could not be verified",
        Some(RejectReason::Other) | None => "it could not be verified",
    };
    let mut text = format!(
        "❌ Your deposit request {} was rejected: {}.",
        request.request_id, reason
    );
    if let Some(note) = &request.rejection_note {
        text.push_str(&format!(" Note from the admin: {}", note));
    }
    text
}

pub fn correction_prompt(step: Step) -> String {
    format!("You can fix this and resubmit. {}", prompt_for(step))
}

/// Caption of the admin-channel message; rendered on every status change.
pub fn admin_caption(request: &DepositRequest, user: Option<&User>) -> String {
    let mut lines = vec![format!("💰 Deposit request {}", request.request_id)];
    match user {
        Some(user) => lines.push(format!(
            "From: {} ({}, total {})",
            user.display_handle(),
            user.rank,
            user.cumulative_deposit
        )),
        None => lines.push(format!("From: user {}", request.user_id)),
    }
    lines.push(format!("Account ID: {}", request.external_id));
    lines.push(format!("Amount: {}", request.amount));
    lines.push(format!("Status: {}", request.status));
    if let Some(admin_id) = request.claimed_by {
        lines.push(format!("Handled by: admin {}", admin_id));
    }
    if let Some(reason) = request.rejection_reason {
        lines.push(format!("Reason: {}", reason));
    }
    lines.join("\n")
}

/// Short feedback for the admin who clicked a button.
pub fn claim_feedback(request: &DepositRequest) -> String {
    format!("You claimed {}.", request.request_id)
}

pub fn approve_feedback(request: &DepositRequest) -> String {
    format!("{} approved.", request.request_id)
}

pub fn reject_feedback(request: &DepositRequest) -> String {
    format!("{} rejected.", request.request_id)
}

pub fn reason_picker_feedback() -> String {
    "Pick a rejection reason.".to_string()
}

/// Maps a workflow failure to what the acting admin/user should read.
pub fn error_feedback(error: &WorkflowError) -> String {
    match error {
        WorkflowError::NotFound(id) => format!("Request {} no longer exists.", id),
        WorkflowError::Conflict(status) => format!("Too late - this request is already {}.", status),
        WorkflowError::Forbidden => "This request is locked by another admin.".to_string(),
        WorkflowError::Store(_) => "Could not process that right now - please try again.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::types::RequestStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn admin_caption_reflects_status_and_owner() {
        let mut request = DepositRequest::new(
            "DEP-AB12Q9".to_string(),
            7,
            "u1".to_string(),
            dec!(10000),
            "p1".to_string(),
        );
        let caption = admin_caption(&request, None);
        assert!(caption.contains("DEP-AB12Q9"));
        assert!(caption.contains("Status: pending"));
        assert!(!caption.contains("Handled by"));

        request.status = RequestStatus::Locked;
        request.claimed_by = Some(42);
        let caption = admin_caption(&request, None);
        assert!(caption.contains("Status: locked"));
        assert!(caption.contains("Handled by: admin 42"));
    }

    #[test]
    fn rejection_text_includes_note() {
        let mut request = DepositRequest::new(
            "DEP-AB12Q9".to_string(),
            7,
            "u1".to_string(),
            dec!(10000),
            "p1".to_string(),
        );
        request.status = RequestStatus::Rejected;
        request.rejection_reason = Some(RejectReason::Other);
        request.rejection_note = Some("duplicate".to_string());
        let text = rejected(&request);
        assert!(text.contains("duplicate"));
    }
}
