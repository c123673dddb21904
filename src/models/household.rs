use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    pub id: i64,
    pub name: String,
    pub invite_code: String,
    pub creator_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
