use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i64,
    pub household_id: i64,
    pub name: String,
    pub pet_type: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
