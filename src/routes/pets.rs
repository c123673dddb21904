use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::extract::{Json, Path};
use crate::models::Pet;
use crate::routes::{SuccessResponse, clearable, nullable, own_household, require_member};
use crate::state::SharedState;

const MAX_NAME_LEN: usize = 50;

#[derive(Serialize)]
pub struct PetResponse {
    pub pet: Pet,
}

#[derive(Serialize)]
pub struct PetsResponse {
    pub pets: Vec<Pet>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetRequest {
    pub name: String,
    pub pet_type: String,
    pub photo_url: Option<String>,
    /// Optional; must match the caller's household when given.
    pub household_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePetRequest {
    pub name: Option<String>,
    pub pet_type: Option<String>,
    /// `null` removes the photo.
    #[serde(default, deserialize_with = "nullable")]
    pub photo_url: Option<Option<String>>,
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(value)
}

/// Load a pet the caller is allowed to see.
async fn load_pet(state: &SharedState, auth: &AuthUser, id: i64) -> Result<Pet, AppError> {
    let pet = db::pets::find_by_id(state.db.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pet not found".to_string()))?;
    let me = auth.load(state).await?;
    require_member(&me, pet.household_id)?;
    Ok(pet)
}

pub async fn create(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<CreatePetRequest>,
) -> Result<Json<PetResponse>, AppError> {
    let me = auth.load(&state).await?;
    let household_id = own_household(&me)?;
    if req.household_id.is_some_and(|id| id != household_id) {
        return Err(AppError::Forbidden(
            "Pets can only be added to your own household".to_string(),
        ));
    }

    let name = required(&req.name, "Pet name")?;
    let pet_type = required(&req.pet_type, "Pet type")?;

    let pet = db::pets::create(
        state.db.pool(),
        household_id,
        name,
        pet_type,
        req.photo_url.as_deref(),
    )
    .await?;

    tracing::info!(pet_id = pet.id, household_id, "Pet created");
    Ok(Json(PetResponse { pet }))
}

pub async fn list_by_household(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(household_id): Path<i64>,
) -> Result<Json<PetsResponse>, AppError> {
    let me = auth.load(&state).await?;
    require_member(&me, household_id)?;

    let pets = db::pets::list_by_household(state.db.pool(), household_id).await?;
    Ok(Json(PetsResponse { pets }))
}

pub async fn get(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PetResponse>, AppError> {
    let pet = load_pet(&state, &auth, id).await?;
    Ok(Json(PetResponse { pet }))
}

pub async fn update(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePetRequest>,
) -> Result<Json<PetResponse>, AppError> {
    let pet = load_pet(&state, &auth, id).await?;

    let name = req
        .name
        .as_deref()
        .map(|name| required(name, "Pet name"))
        .transpose()?;
    let pet_type = req
        .pet_type
        .as_deref()
        .map(|pet_type| required(pet_type, "Pet type"))
        .transpose()?;
    let photo_url = clearable(req.photo_url);

    let pet = db::pets::update(
        state.db.pool(),
        pet.id,
        name,
        pet_type,
        photo_url.as_ref().map(Option::as_deref),
    )
    .await?;
    Ok(Json(PetResponse { pet }))
}

pub async fn delete(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    let pet = load_pet(&state, &auth, id).await?;
    db::pets::delete(state.db.pool(), pet.id).await?;

    tracing::info!(pet_id = pet.id, household_id = pet.household_id, "Pet deleted");
    Ok(SuccessResponse::ok())
}
