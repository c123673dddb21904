use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::extract::{Json, Path};
use crate::models::User;
use crate::routes::auth::validate_username;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
}

/// Users can read themselves and anyone in their household.
pub async fn get(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let me = auth.load(&state).await?;
    if me.id == user_id {
        return Ok(Json(UserResponse { user: me }));
    }

    let user = db::users::find_by_id(state.db.pool(), user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    match me.household_id {
        Some(household_id) if user.is_member_of(household_id) => Ok(Json(UserResponse { user })),
        _ => Err(AppError::Forbidden(
            "Not authorized to view this user".to_string(),
        )),
    }
}

pub async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth.require_self(user_id, "update this user")?;

    let username = req
        .username
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Username is required".to_string()))?;
    let username = validate_username(username)?;

    let user = db::users::update_username(state.db.pool(), auth.user_id, username).await?;
    Ok(Json(UserResponse { user }))
}
