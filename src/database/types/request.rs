use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Locked,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Locked => "locked",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the three submitted fields a rejection points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    WrongId,
    WrongAmount,
    WrongEvidence,
    Other,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::WrongId => "wrong_id",
            RejectReason::WrongAmount => "wrong_amount",
            RejectReason::WrongEvidence => "wrong_evidence",
            RejectReason::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wrong_id" => Some(RejectReason::WrongId),
            "wrong_amount" => Some(RejectReason::WrongAmount),
            "wrong_evidence" => Some(RejectReason::WrongEvidence),
            "other" => Some(RejectReason::Other),
            _ => None,
        }
    }

    /// The field the user may resubmit, if any. `Other` is terminal.
    pub fn correctable_field(&self) -> Option<FormField> {
        match self {
            RejectReason::WrongId => Some(FormField::ExternalId),
            RejectReason::WrongAmount => Some(FormField::Amount),
            RejectReason::WrongEvidence => Some(FormField::Evidence),
            RejectReason::Other => None,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    ExternalId,
    Amount,
    Evidence,
}

/// A corrected field together with its replacement value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch {
    ExternalId(String),
    Amount(Decimal),
    Evidence(String),
}

impl FieldPatch {
    pub fn field(&self) -> FormField {
        match self {
            FieldPatch::ExternalId(_) => FormField::ExternalId,
            FieldPatch::Amount(_) => FormField::Amount,
            FieldPatch::Evidence(_) => FormField::Evidence,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DepositRequest {
    pub request_id: String,
    pub user_id: i64,
    pub external_id: String,
    pub amount: Decimal,
    pub evidence_ref: String,
    pub status: RequestStatus,
    pub claimed_by: Option<i64>,
    pub rejection_reason: Option<RejectReason>,
    pub rejection_note: Option<String>,
    pub admin_chat_id: Option<i64>,
    pub admin_message_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DepositRequest {
    pub fn new(request_id: String, user_id: i64, external_id: String, amount: Decimal, evidence_ref: String) -> Self {
        let now = Utc::now();
        Self {
            request_id,
            user_id,
            external_id,
            amount,
            evidence_ref,
            status: RequestStatus::Pending,
            claimed_by: None,
            rejection_reason: None,
            rejection_note: None,
            admin_chat_id: None,
            admin_message_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
