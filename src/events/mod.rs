use crate::database::types::RejectReason;

/// Transport-agnostic inbound events consumed by the workflow.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Text {
        user_id: i64,
        username: Option<String>,
        text: String,
    },
    Photo {
        user_id: i64,
        username: Option<String>,
        evidence_ref: String,
    },
    Button {
        actor_id: i64,
        token: String,
    },
}

/// Closed grammar for callback-button tokens, parsed once at the transport
/// boundary. Anything outside the grammar collapses into `Ignored` so a
/// stale or foreign button click is a no-op rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonCommand {
    DepositStart,
    Lock(String),
    Approve(String),
    Reject(String),
    Resubmit(RejectReason, String),
    Ignored,
}

pub const TOKEN_DEPOSIT_START: &str = "deposit_start";
pub const TOKEN_LOCK: &str = "lock_req";
pub const TOKEN_APPROVE: &str = "approve_req";
pub const TOKEN_REJECT: &str = "reject_req";
pub const TOKEN_RESUBMIT: &str = "resubmit";

impl ButtonCommand {
    pub fn parse(token: &str) -> Self {
        if token == TOKEN_DEPOSIT_START {
            return ButtonCommand::DepositStart;
        }

        let mut parts = token.splitn(3, ':');
        let head = parts.next().unwrap_or_default();
        match (head, parts.next(), parts.next()) {
            (TOKEN_LOCK, Some(id), None) if !id.is_empty() => {
                ButtonCommand::Lock(id.to_string())
            }
            (TOKEN_APPROVE, Some(id), None) if !id.is_empty() => {
                ButtonCommand::Approve(id.to_string())
            }
            (TOKEN_REJECT, Some(id), None) if !id.is_empty() => {
                ButtonCommand::Reject(id.to_string())
            }
            (TOKEN_RESUBMIT, Some(reason), Some(id)) if !id.is_empty() => {
                match RejectReason::parse(reason) {
                    Some(reason) => ButtonCommand::Resubmit(reason, id.to_string()),
                    None => ButtonCommand::Ignored,
                }
            }
            _ => ButtonCommand::Ignored,
        }
    }
}

pub fn lock_token(request_id: &str) -> String {
    format!("{}:{}", TOKEN_LOCK, request_id)
}

pub fn approve_token(request_id: &str) -> String {
    format!("{}:{}", TOKEN_APPROVE, request_id)
}

pub fn reject_token(request_id: &str) -> String {
    format!("{}:{}", TOKEN_REJECT, request_id)
}

pub fn resubmit_token(reason: RejectReason, request_id: &str) -> String {
    format!("{}:{}:{}", TOKEN_RESUBMIT, reason.as_str(), request_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_closed_grammar() {
        assert_eq!(ButtonCommand::parse("deposit_start"), ButtonCommand::DepositStart);
        assert_eq!(
            ButtonCommand::parse("lock_req:DEP-AB12Q9"),
            ButtonCommand::Lock("DEP-AB12Q9".to_string())
        );
        assert_eq!(
            ButtonCommand::parse("approve_req:DEP-AB12Q9"),
            ButtonCommand::Approve("DEP-AB12Q9".to_string())
        );
        assert_eq!(
            ButtonCommand::parse("reject_req:DEP-AB12Q9"),
            ButtonCommand::Reject("DEP-AB12Q9".to_string())
        );
        assert_eq!(
            ButtonCommand::parse("resubmit:wrong_amount:DEP-AB12Q9"),
            ButtonCommand::Resubmit(RejectReason::WrongAmount, "DEP-AB12Q9".to_string())
        );
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        for token in [
            "",
            "lock_req",
            "lock_req:",
            "unlock_req:DEP-AB12Q9",
            "resubmit:DEP-AB12Q9",
            "resubmit:not_a_reason:DEP-AB12Q9",
            "deposit_start:extra",
        ] {
            assert_eq!(ButtonCommand::parse(token), ButtonCommand::Ignored, "token {token:?}");
        }
    }

    #[test]
    fn tokens_round_trip_through_builders() {
        assert_eq!(
            ButtonCommand::parse(&lock_token("DEP-XY99ZZ")),
            ButtonCommand::Lock("DEP-XY99ZZ".to_string())
        );
        assert_eq!(
            ButtonCommand::parse(&resubmit_token(RejectReason::WrongEvidence, "DEP-XY99ZZ")),
            ButtonCommand::Resubmit(RejectReason::WrongEvidence, "DEP-XY99ZZ".to_string())
        );
    }
}
