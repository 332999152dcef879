//! User registration and profile handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use edumart_core::{validate_name, Role, User};
use edumart_store::{schema::table, Store, StoreError, WriteBatch};

use crate::auth::{Caller, Identity};
use crate::error::ApiError;
use crate::state::AppState;

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Requested role (student or instructor).
    #[serde(default = "default_role")]
    pub role: Role,
    /// Optional profile text.
    #[serde(default)]
    pub bio: Option<String>,
}

fn default_role() -> Role {
    Role::Student
}

/// Register the forwarded identity as a user. Emails on the configured
/// admin list are registered as admins.
pub async fn register(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<User>, ApiError> {
    if body.role == Role::Admin {
        return Err(ApiError::Forbidden);
    }

    let mut user = User::new(identity.user_id, &body.name, &body.email, body.role)?;
    if state.config.is_admin_email(&user.email) {
        user.role = Role::Admin;
    }
    user.bio = body.bio.filter(|b| !b.trim().is_empty());

    let mut batch = WriteBatch::new();
    batch.insert(&user)?;
    batch.insert_raw(
        table::USERS_BY_EMAIL,
        user.email.as_bytes().to_vec(),
        user.id.as_bytes().to_vec(),
    );
    state.store.commit(batch).map_err(|e| match e {
        StoreError::Conflict {
            table: table::USERS_BY_EMAIL,
        } => ApiError::Conflict("email already registered".into()),
        StoreError::Conflict { .. } => ApiError::Conflict("user already registered".into()),
        other => other.into(),
    })?;

    tracing::info!(user_id = %user.id, role = ?user.role, "User registered");

    Ok(Json(user))
}

/// Get the caller's profile.
pub async fn me(caller: Caller) -> Json<User> {
    Json(caller.user)
}

/// Profile update request.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New profile text; empty clears it.
    #[serde(default)]
    pub bio: Option<String>,
}

/// Update the caller's name or bio.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let mut user = caller.user;
    if let Some(name) = body.name {
        user.name = validate_name(&name)?;
    }
    if let Some(bio) = body.bio {
        let bio = bio.trim().to_string();
        user.bio = (!bio.is_empty()).then_some(bio);
    }
    user.updated_at = chrono::Utc::now();

    let mut batch = WriteBatch::new();
    batch.put(&user)?;
    state.store.commit(batch)?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(user))
}
