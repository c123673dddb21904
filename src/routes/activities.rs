use std::collections::HashSet;

use axum::extract::State;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::care::{self, CarePeriod, CareReport};
use crate::db;
use crate::error::AppError;
use crate::extract::{Json, Path, Query};
use crate::models::{Action, Activity, ActivityWithUser, Pet};
use crate::routes::{
    SuccessResponse, TimezoneQuery, clearable, nullable, own_household, require_member,
};
use crate::state::SharedState;

const MAX_NOTES_LEN: usize = 500;
const FUTURE_TOLERANCE_MINUTES: i64 = 5;

#[derive(Serialize)]
pub struct ActivityResponse {
    pub activity: Activity,
}

#[derive(Serialize)]
pub struct ActivitiesResponse<T> {
    pub activities: Vec<T>,
}

/// Household listing entry with a label resolved against the live pets.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdActivity {
    #[serde(flatten)]
    pub activity: ActivityWithUser,
    pub pets_label: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayResponse {
    pub activities: Vec<HouseholdActivity>,
    pub has_previous: bool,
}

#[derive(Serialize)]
pub struct CarePeriodResponse {
    pub activities: Vec<HouseholdActivity>,
    pub report: CareReport,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    pub pet_ids: Vec<i64>,
    pub action: Action,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateActivityRequest {
    pub timestamp: Option<DateTime<Utc>>,
    /// `null` or blank clears the notes.
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

fn check_notes(notes: Option<&str>) -> Result<(), AppError> {
    match notes {
        Some(notes) if notes.chars().count() > MAX_NOTES_LEN => Err(AppError::BadRequest(
            format!("Notes must be at most {MAX_NOTES_LEN} characters"),
        )),
        _ => Ok(()),
    }
}

fn check_timestamp(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppError> {
    if timestamp > now + Duration::minutes(FUTURE_TOLERANCE_MINUTES) {
        return Err(AppError::BadRequest(
            "Timestamp cannot be in the future".to_string(),
        ));
    }
    Ok(())
}

fn label(activities: Vec<ActivityWithUser>, pets: &[Pet]) -> Vec<HouseholdActivity> {
    activities
        .into_iter()
        .map(|activity| HouseholdActivity {
            pets_label: care::pets_label(&activity.activity.pet_ids, pets),
            activity,
        })
        .collect()
}

/// Load an activity and make sure the caller logged it.
async fn owned_activity(
    state: &SharedState,
    auth: &AuthUser,
    id: i64,
    action: &str,
) -> Result<Activity, AppError> {
    let activity = db::activities::find_by_id(state.db.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Activity not found".to_string()))?;
    auth.require_self(activity.user_id, action)?;
    Ok(activity)
}

/// Self, or a user in the caller's household.
async fn check_can_view_user(
    state: &SharedState,
    auth: &AuthUser,
    user_id: i64,
) -> Result<(), AppError> {
    if auth.user_id == user_id {
        return Ok(());
    }
    let me = auth.load(state).await?;
    let user = db::users::find_by_id(state.db.pool(), user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    match me.household_id {
        Some(household_id) if user.is_member_of(household_id) => Ok(()),
        _ => Err(AppError::Forbidden(
            "Not authorized to view these activities".to_string(),
        )),
    }
}

pub async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<CreateActivityRequest>,
) -> Result<Json<ActivityResponse>, AppError> {
    let me = auth.load(&state).await?;
    let household_id = own_household(&me)?;

    if req.pet_ids.is_empty() {
        return Err(AppError::BadRequest(
            "At least one pet is required".to_string(),
        ));
    }
    let notes = req.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
    check_notes(notes)?;

    let pool = state.db.pool();
    let household_pets: HashSet<i64> = db::pets::list_by_household(pool, household_id)
        .await?
        .into_iter()
        .map(|pet| pet.id)
        .collect();
    if let Some(stray) = req.pet_ids.iter().find(|id| !household_pets.contains(*id)) {
        return Err(AppError::BadRequest(format!(
            "Pet {stray} does not belong to your household"
        )));
    }

    let activity =
        db::activities::create(pool, me.id, household_id, &req.pet_ids, req.action, notes).await?;

    tracing::info!(
        activity_id = activity.id,
        household_id,
        action = %activity.action,
        "Activity logged"
    );
    Ok(Json(ActivityResponse { activity }))
}

pub async fn list_by_user(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<ActivitiesResponse<Activity>>, AppError> {
    check_can_view_user(&state, &auth, user_id).await?;
    let activities = db::activities::list_by_user(state.db.pool(), user_id).await?;
    Ok(Json(ActivitiesResponse { activities }))
}

pub async fn user_today(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    Query(query): Query<TimezoneQuery>,
) -> Result<Json<ActivitiesResponse<Activity>>, AppError> {
    let tz = query.tz()?;
    check_can_view_user(&state, &auth, user_id).await?;

    let day = care::local_day(Utc::now(), tz);
    let activities =
        db::activities::list_by_user_between(state.db.pool(), user_id, day.start, day.end).await?;
    Ok(Json(ActivitiesResponse { activities }))
}

pub async fn list_by_household(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(household_id): Path<i64>,
) -> Result<Json<ActivitiesResponse<HouseholdActivity>>, AppError> {
    let me = auth.load(&state).await?;
    require_member(&me, household_id)?;

    let pool = state.db.pool();
    let pets = db::pets::list_by_household(pool, household_id).await?;
    let activities = db::activities::list_by_household(pool, household_id).await?;
    Ok(Json(ActivitiesResponse {
        activities: label(activities, &pets),
    }))
}

pub async fn household_today(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(household_id): Path<i64>,
    Query(query): Query<TimezoneQuery>,
) -> Result<Json<TodayResponse>, AppError> {
    let tz = query.tz()?;
    let me = auth.load(&state).await?;
    require_member(&me, household_id)?;

    let pool = state.db.pool();
    let day = care::local_day(Utc::now(), tz);
    let pets = db::pets::list_by_household(pool, household_id).await?;
    let activities =
        db::activities::list_by_household_between(pool, household_id, day.start, day.end).await?;
    let has_previous = db::activities::exists_before(pool, household_id, day.start).await?;

    Ok(Json(TodayResponse {
        activities: label(activities, &pets),
        has_previous,
    }))
}

pub async fn care_period(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(household_id): Path<i64>,
    Query(query): Query<TimezoneQuery>,
) -> Result<Json<CarePeriodResponse>, AppError> {
    let tz = query.tz()?;
    let me = auth.load(&state).await?;
    require_member(&me, household_id)?;

    let now = Utc::now();
    let window = CarePeriod::at(now, tz).window;

    let pool = state.db.pool();
    let pets = db::pets::list_by_household(pool, household_id).await?;
    let activities =
        db::activities::list_by_household_between(pool, household_id, window.start, window.end)
            .await?;

    let report = care::assess(now, tz, &pets, activities.iter().map(|a| &a.activity));
    Ok(Json(CarePeriodResponse {
        activities: label(activities, &pets),
        report,
    }))
}

pub async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateActivityRequest>,
) -> Result<Json<ActivityResponse>, AppError> {
    let activity = owned_activity(&state, &auth, id, "update this activity").await?;

    if let Some(timestamp) = req.timestamp {
        check_timestamp(timestamp, Utc::now())?;
    }
    let notes = clearable(req.notes);
    check_notes(notes.as_ref().and_then(Option::as_deref))?;

    let activity = db::activities::update(
        state.db.pool(),
        activity.id,
        req.timestamp,
        notes.as_ref().map(Option::as_deref),
    )
    .await?;
    Ok(Json(ActivityResponse { activity }))
}

pub async fn delete(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    let activity = owned_activity(&state, &auth, id, "delete this activity").await?;
    db::activities::delete(state.db.pool(), activity.id).await?;

    tracing::info!(activity_id = activity.id, "Activity deleted");
    Ok(SuccessResponse::ok())
}
