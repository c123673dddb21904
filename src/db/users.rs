use sqlx::PgExecutor;

use crate::models::User;

pub async fn create<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
    username: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, username, password_hash)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn lock_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Members ordered by account age, matching how the member list is shown.
pub async fn list_by_household<'e, E: PgExecutor<'e>>(
    executor: E,
    household_id: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE household_id = $1 ORDER BY created_at, id",
    )
    .bind(household_id)
    .fetch_all(executor)
    .await
}

pub async fn update_username<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    username: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>("UPDATE users SET username = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(username)
        .fetch_one(executor)
        .await
}

pub async fn update_password<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(executor)
        .await?;
    Ok(())
}

/// Point the user at a household and stamp the join time.
pub async fn set_household<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    household_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET household_id = $2, household_joined_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(household_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn clear_household<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET household_id = NULL, household_joined_at = NULL WHERE id = $1",
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}
