use std::sync::LazyLock;

use axum::extract::State;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::ACCESS_COOKIE;
use crate::auth::jwt::{Claims, encode_token};
use crate::auth::{password, tokens};
use crate::db;
use crate::email::OutgoingEmail;
use crate::error::{AppError, on_unique_violation};
use crate::extract::Json;
use crate::membership;
use crate::models::User;
use crate::state::SharedState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

const MIN_USERNAME_LEN: usize = 2;
const MAX_USERNAME_LEN: usize = 50;
const RESET_TOKEN_TTL_HOURS: i64 = 1;

const RESET_REQUESTED: &str =
    "If an account with that email exists, a password reset link has been sent.";

#[derive(Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HouseholdChoice {
    Create,
    Join,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub household_choice: Option<HouseholdChoice>,
    pub household_name: Option<String>,
    pub invite_code: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn validate_email(email: &str) -> Result<String, AppError> {
    let email = email.trim();
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::BadRequest(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(email.to_lowercase())
}

pub(crate) fn validate_username(username: &str) -> Result<&str, AppError> {
    let username = username.trim();
    let len = username.chars().count();
    if len < MIN_USERNAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Name must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if len > MAX_USERNAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Name must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(username)
}

fn auth_cookie(access_token: &str, ttl_hours: i64) -> CookieJar {
    let access = Cookie::build((ACCESS_COOKIE, access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(ttl_hours))
        .build();

    CookieJar::new().add(access)
}

fn clear_auth_cookie() -> CookieJar {
    let access = Cookie::build((ACCESS_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access)
}

fn issue(state: &SharedState, user: User) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let ttl = state.config.token_ttl_hours;
    let claims = Claims::new(user.id, Duration::hours(ttl));
    let access_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    Ok((
        auth_cookie(&access_token, ttl),
        Json(AuthResponse { user, access_token }),
    ))
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let email = validate_email(&req.email)?;
    let username = validate_username(&req.username)?;
    password::check_length(&req.password).map_err(AppError::BadRequest)?;

    let invite_code = req
        .invite_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());
    if invite_code.is_none() && req.household_choice == Some(HouseholdChoice::Join) {
        return Err(AppError::BadRequest(
            "Invite code required to join a household".to_string(),
        ));
    }

    let pool = state.db.pool();
    if db::users::find_by_email(pool, &email).await?.is_some() {
        return Err(AppError::BadRequest(
            "User already exists with this email".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let mut tx = pool.begin().await?;

    let joining = match invite_code {
        Some(code) => Some(
            db::households::find_by_invite_code(&mut *tx, code)
                .await?
                .ok_or_else(|| AppError::BadRequest("Invalid invite code".to_string()))?,
        ),
        None => None,
    };

    let user = db::users::create(&mut *tx, &email, username, &pw_hash)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                AppError::BadRequest("User already exists with this email".to_string())
            })
        })?;

    let household = match joining {
        Some(household) => {
            db::users::set_household(&mut *tx, user.id, household.id).await?;
            household
        }
        None => {
            let default_name = format!("{username}'s Household");
            let name = match req.household_name.as_deref() {
                Some(name) => membership::validate_name(name)?,
                None => default_name.as_str(),
            };
            membership::assign_new_household(&mut tx, user.id, name).await?
        }
    };

    let user = db::users::find_by_id(&mut *tx, user.id)
        .await?
        .ok_or_else(|| AppError::Internal("Registered user vanished".to_string()))?;

    tx.commit().await?;

    tracing::info!(
        user_id = user.id,
        household_id = household.id,
        joined = invite_code.is_some(),
        "User registered"
    );

    issue(&state, user)
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let email = req.email.trim();

    if state.login_limiter.check(email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let Some(user) = db::users::find_by_email(state.db.pool(), email).await? else {
        state.login_limiter.record(email);
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        state.login_limiter.record(email);
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    state.login_limiter.clear(email);
    issue(&state, user)
}

pub async fn logout() -> (CookieJar, Json<MessageResponse>) {
    (
        clear_auth_cookie(),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Known and unknown emails get the same answer. Delivery happens before the
/// response so a mail failure is reported to the caller.
pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = req.email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    if state.reset_limiter.hit(email).is_err() {
        return Err(AppError::RateLimited(
            "Too many reset requests. Please try again later.".to_string(),
        ));
    }

    // Checked before the lookup so known and unknown emails fail alike.
    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AppError::Internal("No mailer configured for password reset".to_string()))?;

    let response = Json(MessageResponse {
        message: RESET_REQUESTED.to_string(),
    });

    let Some(user) = db::users::find_by_email(state.db.pool(), email).await? else {
        return Ok(response);
    };

    let token = tokens::generate_token();
    db::password_reset_tokens::create(
        state.db.pool(),
        user.id,
        &tokens::hash_token(&token),
        Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS),
    )
    .await?;

    let reset_url = format!("{}/reset-password?token={token}", state.config.base_url);
    mailer
        .send(OutgoingEmail::password_reset(&user.email, &reset_url))
        .await
        .map_err(|e| AppError::Internal(format!("Failed to send reset email: {e}")))?;

    tracing::info!(user_id = user.id, "Password reset requested");
    Ok(response)
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    password::check_length(&req.password).map_err(AppError::BadRequest)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let mut tx = state.db.pool().begin().await?;

    let reset_token = db::password_reset_tokens::consume(&mut *tx, &tokens::hash_token(&req.token))
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

    db::users::update_password(&mut *tx, reset_token.user_id, &pw_hash).await?;

    tx.commit().await?;

    tracing::info!(user_id = reset_token.user_id, "Password reset completed");
    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_is_checked_and_normalized() {
        assert_eq!(
            validate_email("  Sam@Example.COM ").unwrap(),
            "sam@example.com"
        );
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }

    #[test]
    fn usernames_need_two_characters() {
        assert_eq!(validate_username(" Jo ").unwrap(), "Jo");
        assert!(validate_username("J").is_err());
        assert!(validate_username(&"x".repeat(51)).is_err());
    }
}
