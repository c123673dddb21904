use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use crate::models::{Action, Activity, ActivityWithUser};

const WITH_USER: &str = "SELECT a.*, COALESCE(u.username, 'Unknown User') AS username
     FROM activities a
     LEFT JOIN users u ON u.id = a.user_id";

pub async fn create<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    household_id: i64,
    pet_ids: &[i64],
    action: Action,
    notes: Option<&str>,
) -> Result<Activity, sqlx::Error> {
    sqlx::query_as::<_, Activity>(
        "INSERT INTO activities (user_id, household_id, pet_ids, action, notes)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(user_id)
    .bind(household_id)
    .bind(pet_ids)
    .bind(action.as_str())
    .bind(notes)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<Activity>, sqlx::Error> {
    sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// `None` fields keep their stored value; `Some(None)` clears the notes.
pub async fn update<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    occurred_at: Option<DateTime<Utc>>,
    notes: Option<Option<&str>>,
) -> Result<Activity, sqlx::Error> {
    sqlx::query_as::<_, Activity>(
        "UPDATE activities SET
            occurred_at = COALESCE($2, occurred_at),
            notes = CASE WHEN $3 THEN $4 ELSE notes END
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(occurred_at)
    .bind(notes.is_some())
    .bind(notes.flatten())
    .fetch_one(executor)
    .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM activities WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn list_by_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Vec<Activity>, sqlx::Error> {
    sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities WHERE user_id = $1 ORDER BY occurred_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Activities with `start <= occurred_at < end`.
pub async fn list_by_user_between<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Activity>, sqlx::Error> {
    sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities
         WHERE user_id = $1 AND occurred_at >= $2 AND occurred_at < $3
         ORDER BY occurred_at DESC, id DESC",
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(executor)
    .await
}

pub async fn list_by_household<'e, E: PgExecutor<'e>>(
    executor: E,
    household_id: i64,
) -> Result<Vec<ActivityWithUser>, sqlx::Error> {
    sqlx::query_as::<_, ActivityWithUser>(&format!(
        "{WITH_USER} WHERE a.household_id = $1 ORDER BY a.occurred_at DESC, a.id DESC"
    ))
    .bind(household_id)
    .fetch_all(executor)
    .await
}

/// Activities with `start <= occurred_at < end`.
pub async fn list_by_household_between<'e, E: PgExecutor<'e>>(
    executor: E,
    household_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ActivityWithUser>, sqlx::Error> {
    sqlx::query_as::<_, ActivityWithUser>(&format!(
        "{WITH_USER}
         WHERE a.household_id = $1 AND a.occurred_at >= $2 AND a.occurred_at < $3
         ORDER BY a.occurred_at DESC, a.id DESC"
    ))
    .bind(household_id)
    .bind(start)
    .bind(end)
    .fetch_all(executor)
    .await
}

pub async fn exists_before<'e, E: PgExecutor<'e>>(
    executor: E,
    household_id: i64,
    before: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (
            SELECT 1 FROM activities WHERE household_id = $1 AND occurred_at < $2
         )",
    )
    .bind(household_id)
    .bind(before)
    .fetch_one(executor)
    .await?;
    Ok(row.0)
}
