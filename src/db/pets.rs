use sqlx::PgExecutor;

use crate::models::Pet;

pub async fn create<'e, E: PgExecutor<'e>>(
    executor: E,
    household_id: i64,
    name: &str,
    pet_type: &str,
    photo_url: Option<&str>,
) -> Result<Pet, sqlx::Error> {
    sqlx::query_as::<_, Pet>(
        "INSERT INTO pets (household_id, name, pet_type, photo_url)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(household_id)
    .bind(name)
    .bind(pet_type)
    .bind(photo_url)
    .fetch_one(executor)
    .await
}

pub async fn list_by_household<'e, E: PgExecutor<'e>>(
    executor: E,
    household_id: i64,
) -> Result<Vec<Pet>, sqlx::Error> {
    sqlx::query_as::<_, Pet>(
        "SELECT * FROM pets WHERE household_id = $1 ORDER BY created_at, id",
    )
    .bind(household_id)
    .fetch_all(executor)
    .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<Pet>, sqlx::Error> {
    sqlx::query_as::<_, Pet>("SELECT * FROM pets WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// `None` fields keep their stored value; `Some(None)` removes the photo.
pub async fn update<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    name: Option<&str>,
    pet_type: Option<&str>,
    photo_url: Option<Option<&str>>,
) -> Result<Pet, sqlx::Error> {
    sqlx::query_as::<_, Pet>(
        "UPDATE pets SET
            name = COALESCE($2, name),
            pet_type = COALESCE($3, pet_type),
            photo_url = CASE WHEN $4 THEN $5 ELSE photo_url END
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(pet_type)
    .bind(photo_url.is_some())
    .bind(photo_url.flatten())
    .fetch_one(executor)
    .await
}

/// Activities that mention this pet keep its id.
pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM pets WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
