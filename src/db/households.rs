use sqlx::PgExecutor;

use crate::models::Household;

pub async fn create<'e, E: PgExecutor<'e>>(
    executor: E,
    name: &str,
    invite_code: &str,
    creator_id: Option<i64>,
) -> Result<Household, sqlx::Error> {
    sqlx::query_as::<_, Household>(
        "INSERT INTO households (name, invite_code, creator_id)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(invite_code)
    .bind(creator_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<Household>, sqlx::Error> {
    sqlx::query_as::<_, Household>("SELECT * FROM households WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Lock several households in ascending id order, so two transactions
/// touching the same pair cannot deadlock.
pub async fn lock_many<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[i64],
) -> Result<Vec<Household>, sqlx::Error> {
    sqlx::query_as::<_, Household>(
        "SELECT * FROM households WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

/// Exact, case-sensitive match.
pub async fn find_by_invite_code<'e, E: PgExecutor<'e>>(
    executor: E,
    invite_code: &str,
) -> Result<Option<Household>, sqlx::Error> {
    sqlx::query_as::<_, Household>("SELECT * FROM households WHERE invite_code = $1")
        .bind(invite_code)
        .fetch_optional(executor)
        .await
}

pub async fn set_creator<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    creator_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE households SET creator_id = $2 WHERE id = $1")
        .bind(id)
        .bind(creator_id)
        .execute(executor)
        .await?;
    Ok(())
}
