use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    pub rank: String,
    pub cumulative_deposit: Decimal,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(user_id: i64, username: Option<String>) -> Self {
        Self {
            user_id,
            username,
            rank: "Bronze".to_string(),
            cumulative_deposit: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    /// Handle shown in admin captions and direct messages.
    pub fn display_handle(&self) -> String {
        match &self.username {
            Some(name) => format!("@{}", name),
            None => format!("user {}", self.user_id),
        }
    }
}
