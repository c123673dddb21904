use chrono::{DateTime, Utc};
use serde::Serialize;

/// Only the SHA-256 digest of the mailed token is persisted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PasswordResetToken {
    pub id: i64,
    pub user_id: i64,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

