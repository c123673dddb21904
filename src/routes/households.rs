use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::extract::{Json, Path};
use crate::membership;
use crate::models::{Household, User};
use crate::routes::{SuccessResponse, require_member};
use crate::state::SharedState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdDetail {
    #[serde(flatten)]
    pub household: Household,
    pub creator_username: Option<String>,
}

#[derive(Serialize)]
pub struct HouseholdResponse<T> {
    pub household: T,
}

#[derive(Serialize)]
pub struct MembersResponse {
    pub members: Vec<User>,
}

#[derive(Deserialize)]
pub struct CreateHouseholdRequest {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinHouseholdRequest {
    pub invite_code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMemberRequest {
    pub household_id: i64,
    pub user_id_to_remove: i64,
}

pub async fn get(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<HouseholdResponse<HouseholdDetail>>, AppError> {
    let pool = state.db.pool();
    let household = db::households::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Household not found".to_string()))?;

    let me = auth.load(&state).await?;
    require_member(&me, household.id)?;

    let creator_username = match household.creator_id {
        Some(creator_id) => db::users::find_by_id(pool, creator_id)
            .await?
            .map(|creator| creator.username),
        None => None,
    };

    Ok(Json(HouseholdResponse {
        household: HouseholdDetail {
            household,
            creator_username,
        },
    }))
}

pub async fn members(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MembersResponse>, AppError> {
    let me = auth.load(&state).await?;
    require_member(&me, id)?;

    let members = db::users::list_by_household(state.db.pool(), id).await?;
    Ok(Json(MembersResponse { members }))
}

pub async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<CreateHouseholdRequest>,
) -> Result<Json<HouseholdResponse<Household>>, AppError> {
    let household = membership::create_household(state.db.pool(), auth.user_id, &req.name).await?;
    Ok(Json(HouseholdResponse { household }))
}

pub async fn join(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<JoinHouseholdRequest>,
) -> Result<Json<HouseholdResponse<Household>>, AppError> {
    let code = req.invite_code.trim();
    if code.is_empty() {
        return Err(AppError::BadRequest("Invite code required".to_string()));
    }

    let household = membership::join_by_invite_code(state.db.pool(), auth.user_id, code).await?;
    Ok(Json(HouseholdResponse { household }))
}

pub async fn leave(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<SuccessResponse>, AppError> {
    membership::leave_household(state.db.pool(), auth.user_id).await?;
    Ok(SuccessResponse::ok())
}

pub async fn remove_member(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<RemoveMemberRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    membership::remove_member(
        state.db.pool(),
        auth.user_id,
        req.household_id,
        req.user_id_to_remove,
    )
    .await?;
    Ok(SuccessResponse::ok())
}
