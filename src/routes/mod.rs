pub mod activities;
pub mod auth;
pub mod households;
pub mod pets;
pub mod users;

use axum::Router;
use axum::routing::{get, post};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password))
        // Users
        .route("/api/users/{id}", get(users::get).patch(users::update))
        // Households
        .route("/api/households/create", post(households::create))
        .route("/api/households/join", post(households::join))
        .route("/api/households/leave", post(households::leave))
        .route("/api/households/remove-member", post(households::remove_member))
        .route("/api/households/{id}", get(households::get))
        .route("/api/households/{id}/members", get(households::members))
        // Pets
        .route("/api/pets", post(pets::create))
        .route("/api/pets/household/{id}", get(pets::list_by_household))
        .route(
            "/api/pets/{id}",
            get(pets::get).patch(pets::update).delete(pets::delete),
        )
        // Activities
        .route("/api/activities", post(activities::create))
        .route(
            "/api/activities/household/{id}",
            get(activities::list_by_household),
        )
        .route(
            "/api/activities/household/{id}/today",
            get(activities::household_today),
        )
        .route(
            "/api/activities/household/{id}/care-period",
            get(activities::care_period),
        )
        // GET takes a user id; PATCH and DELETE take an activity id.
        .route(
            "/api/activities/{id}",
            get(activities::list_by_user)
                .patch(activities::update)
                .delete(activities::delete),
        )
        .route("/api/activities/{id}/today", get(activities::user_today))
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> crate::extract::Json<Self> {
        crate::extract::Json(Self { success: true })
    }
}

/// For `Option<Option<T>>` patch fields with `#[serde(default)]`: an absent
/// key stays `None`, an explicit `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim a patched text field; blank or `null` clears it.
pub fn clearable(value: Option<Option<String>>) -> Option<Option<String>> {
    value.map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

#[derive(Deserialize)]
pub struct TimezoneQuery {
    pub timezone: Option<String>,
}

impl TimezoneQuery {
    pub fn tz(&self) -> Result<chrono_tz::Tz, AppError> {
        crate::care::parse_timezone(self.timezone.as_deref()).map_err(AppError::BadRequest)
    }
}

pub(crate) fn require_member(user: &User, household_id: i64) -> Result<(), AppError> {
    if user.is_member_of(household_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not a member of this household".to_string(),
        ))
    }
}

/// The caller's household, or 400 when they have none.
pub(crate) fn own_household(user: &User) -> Result<i64, AppError> {
    user.household_id
        .ok_or_else(|| AppError::BadRequest("User not in a household".to_string()))
}
