use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A loggable care action. Stored as its display name in `activities.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Fed,
    Bathroom,
    Walked,
    Played,
    Groomed,
    Medication,
    Training,
    #[serde(rename = "Litter Box")]
    LitterBox,
    #[serde(rename = "Clean Cage")]
    CleanCage,
    #[serde(rename = "Clean Tank")]
    CleanTank,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::Fed,
        Action::Bathroom,
        Action::Walked,
        Action::Played,
        Action::Groomed,
        Action::Medication,
        Action::Training,
        Action::LitterBox,
        Action::CleanCage,
        Action::CleanTank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Fed => "Fed",
            Action::Bathroom => "Bathroom",
            Action::Walked => "Walked",
            Action::Played => "Played",
            Action::Groomed => "Groomed",
            Action::Medication => "Medication",
            Action::Training => "Training",
            Action::LitterBox => "Litter Box",
            Action::CleanCage => "Clean Cage",
            Action::CleanTank => "Clean Tank",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("Unknown action: {s}"))
    }
}

impl TryFrom<String> for Action {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    /// Household the user belonged to when the activity was logged. Not
    /// updated if the user later moves.
    pub household_id: Option<i64>,
    pub pet_ids: Vec<i64>,
    #[sqlx(try_from = "String")]
    pub action: Action,
    #[serde(rename = "timestamp")]
    pub occurred_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Activity {
    pub fn involves(&self, pet_id: i64) -> bool {
        self.pet_ids.contains(&pet_id)
    }
}

/// Activity joined with the acting user's name, as listed for a household.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub activity: Activity,
    pub username: String,
}
