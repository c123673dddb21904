//! Household membership transitions.
//!
//! Each operation runs in one transaction. Household rows are locked first
//! (ascending id), then the user row, and the user's membership is re-read
//! under the lock. Concurrent leaves on one household therefore run one after
//! another and creator succession always sees the current member list.

use sqlx::{Connection, PgConnection, PgPool};

use crate::auth::tokens;
use crate::db;
use crate::error::AppError;
use crate::models::{Household, User};

const INVITE_CODE_ATTEMPTS: usize = 5;
const MAX_NAME_LEN: usize = 100;

/// Member who inherits the creator role when `leaving` goes: earliest join
/// time first, members without a recorded join time ahead of everyone, ties
/// to the lowest id.
pub fn successor(members: &[User], leaving: i64) -> Option<&User> {
    members
        .iter()
        .filter(|member| member.id != leaving)
        .min_by_key(|member| (member.household_joined_at, member.id))
}

pub fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Household name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Household name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Create a household named `name` with `user_id` as creator and move the
/// user into it. Any previous membership is released first.
pub async fn create_household(
    pool: &PgPool,
    user_id: i64,
    name: &str,
) -> Result<Household, AppError> {
    let name = validate_name(name)?;
    let mut tx = pool.begin().await?;

    let current = current_household(&mut tx, user_id).await?;
    let locked = lock_households(&mut tx, current.into_iter().collect()).await?;
    let user = lock_member(&mut tx, user_id, current).await?;

    if let Some(old) = locked.first() {
        detach(&mut tx, user.id, old).await?;
    }
    let household = assign_new_household(&mut tx, user.id, name).await?;

    tx.commit().await?;
    tracing::info!(household_id = household.id, user_id, "Household created");
    Ok(household)
}

/// Move `user_id` into `household_id`, overwriting any prior membership.
/// Joining one's own household changes nothing.
pub async fn join_household(
    pool: &PgPool,
    user_id: i64,
    household_id: i64,
) -> Result<Household, AppError> {
    let mut tx = pool.begin().await?;

    let current = current_household(&mut tx, user_id).await?;
    let mut ids = vec![household_id];
    ids.extend(current.filter(|id| *id != household_id));
    let locked = lock_households(&mut tx, ids).await?;
    let user = lock_member(&mut tx, user_id, current).await?;

    let target = locked
        .iter()
        .find(|household| household.id == household_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Household not found".to_string()))?;

    if current == Some(household_id) {
        tx.commit().await?;
        return Ok(target);
    }

    if let Some(old) = locked.iter().find(|household| Some(household.id) == current) {
        detach(&mut tx, user.id, old).await?;
    }
    db::users::set_household(&mut *tx, user.id, target.id).await?;

    tx.commit().await?;
    tracing::info!(household_id, user_id, "User joined household");
    Ok(target)
}

/// Join the household whose invite code matches exactly.
pub async fn join_by_invite_code(
    pool: &PgPool,
    user_id: i64,
    invite_code: &str,
) -> Result<Household, AppError> {
    let household = db::households::find_by_invite_code(pool, invite_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid invite code".to_string()))?;
    join_household(pool, user_id, household.id).await
}

/// Take `user_id` out of their household, handing the creator role on if
/// needed. The household itself is kept even when it becomes empty.
pub async fn leave_household(pool: &PgPool, user_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let household_id = current_household(&mut tx, user_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("User not in a household".to_string()))?;
    let locked = lock_households(&mut tx, vec![household_id]).await?;
    let household = locked
        .first()
        .ok_or_else(|| AppError::NotFound("Household not found".to_string()))?;
    let user = lock_member(&mut tx, user_id, Some(household_id)).await?;

    detach(&mut tx, user.id, household).await?;

    tx.commit().await?;
    tracing::info!(household_id, user_id, "User left household");
    Ok(())
}

/// Creator-initiated removal. When the household has no creator (legacy
/// rows) any member may remove others.
pub async fn remove_member(
    pool: &PgPool,
    requester_id: i64,
    household_id: i64,
    target_id: i64,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let locked = lock_households(&mut tx, vec![household_id]).await?;
    let household = locked
        .first()
        .ok_or_else(|| AppError::NotFound("Household not found".to_string()))?;

    let requester = db::users::find_by_id(&mut *tx, requester_id)
        .await?
        .filter(|user| user.is_member_of(household_id))
        .ok_or_else(|| {
            AppError::Forbidden("Only household members can remove others".to_string())
        })?;

    if household.creator_id.is_some_and(|creator| creator != requester.id) {
        return Err(AppError::Forbidden(
            "Only the household creator can remove members".to_string(),
        ));
    }

    let target = db::users::lock_by_id(&mut *tx, target_id)
        .await?
        .filter(|user| user.is_member_of(household_id))
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    detach(&mut tx, target.id, household).await?;

    tx.commit().await?;
    tracing::info!(household_id, requester_id, target_id, "Member removed");
    Ok(())
}

/// Insert a household with a fresh invite code, creator `user_id`, and point
/// the user at it. Runs on the caller's transaction.
pub async fn assign_new_household(
    conn: &mut PgConnection,
    user_id: i64,
    name: &str,
) -> Result<Household, AppError> {
    let household = insert_with_fresh_code(conn, name, user_id).await?;
    db::users::set_household(&mut *conn, user_id, household.id).await?;
    Ok(household)
}

async fn insert_with_fresh_code(
    conn: &mut PgConnection,
    name: &str,
    creator_id: i64,
) -> Result<Household, AppError> {
    for _ in 0..INVITE_CODE_ATTEMPTS {
        let code = tokens::generate_invite_code();
        let mut savepoint = conn.begin().await?;
        match db::households::create(&mut *savepoint, name, &code, Some(creator_id)).await {
            Ok(household) => {
                savepoint.commit().await?;
                return Ok(household);
            }
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                tracing::debug!("Invite code collision, retrying");
                savepoint.rollback().await?;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(AppError::Internal(
        "Could not allocate a unique invite code".to_string(),
    ))
}

/// Clear the user's membership and, if they were the creator, promote the
/// successor (or leave the role empty).
async fn detach(
    conn: &mut PgConnection,
    user_id: i64,
    household: &Household,
) -> Result<(), AppError> {
    db::users::clear_household(&mut *conn, user_id).await?;

    if household.creator_id == Some(user_id) {
        let remaining = db::users::list_by_household(&mut *conn, household.id).await?;
        let next = successor(&remaining, user_id).map(|member| member.id);
        db::households::set_creator(&mut *conn, household.id, next).await?;
        tracing::info!(
            household_id = household.id,
            previous = user_id,
            next = ?next,
            "Household creator changed"
        );
    }
    Ok(())
}

async fn current_household(conn: &mut PgConnection, user_id: i64) -> Result<Option<i64>, AppError> {
    let user = db::users::find_by_id(&mut *conn, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(user.household_id)
}

async fn lock_households(
    conn: &mut PgConnection,
    ids: Vec<i64>,
) -> Result<Vec<Household>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(db::households::lock_many(&mut *conn, &ids).await?)
}

/// Lock the user row and confirm membership did not move since it was read.
async fn lock_member(
    conn: &mut PgConnection,
    user_id: i64,
    expected_household: Option<i64>,
) -> Result<User, AppError> {
    let user = db::users::lock_by_id(&mut *conn, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if user.household_id != expected_household {
        return Err(AppError::Conflict(
            "Household membership changed, please retry".to_string(),
        ));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn member(id: i64, joined: Option<&str>) -> User {
        User {
            id,
            email: format!("user{id}@example.com"),
            username: format!("user{id}"),
            display_name: None,
            password_hash: String::new(),
            household_id: Some(1),
            household_joined_at: joined.map(|s| s.parse::<DateTime<Utc>>().unwrap()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn earliest_joiner_inherits() {
        let members = [
            member(1, Some("2025-01-01T00:00:00Z")),
            member(2, Some("2025-03-01T00:00:00Z")),
            member(3, Some("2025-02-01T00:00:00Z")),
        ];
        assert_eq!(successor(&members, 1).map(|m| m.id), Some(3));
    }

    #[test]
    fn legacy_members_without_join_time_come_first() {
        let members = [
            member(5, Some("2020-01-01T00:00:00Z")),
            member(9, None),
            member(7, None),
        ];
        assert_eq!(successor(&members, 1).map(|m| m.id), Some(7));
    }

    #[test]
    fn equal_join_times_break_ties_by_id() {
        let at = Some("2025-01-01T00:00:00Z");
        let members = [member(4, at), member(2, at), member(3, at)];
        assert_eq!(successor(&members, 2).map(|m| m.id), Some(3));
    }

    #[test]
    fn sole_member_has_no_successor() {
        let members = [member(1, Some("2025-01-01T00:00:00Z"))];
        assert!(successor(&members, 1).is_none());
    }

    #[test]
    fn household_names_are_trimmed_and_required() {
        assert_eq!(validate_name("  The Den ").unwrap(), "The Den");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
    }
}
