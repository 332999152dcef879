//! Caller identity extractors.
//!
//! Authentication happens upstream: the identity gateway forwards the
//! authenticated user's id in `x-user-id`. When a gateway key is configured,
//! requests must also carry it in `x-gateway-key`.
//!
//! - `Identity` - the raw forwarded id (used for registration)
//! - `Caller` - a registered, active user
//! - `MaybeCaller` - `Caller` when identity headers are present
//! - `AdminCaller` - a caller with the admin role

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use edumart_core::{User, UserId};
use edumart_store::StoreExt;

use crate::crypto::constant_time_eq;
use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the gateway's shared key.
pub const GATEWAY_KEY_HEADER: &str = "x-gateway-key";

/// The user id forwarded by the gateway. The user may not be registered yet.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    /// The forwarded user ID.
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        forwarded_identity(parts, state)?
            .map(|user_id| Self { user_id })
            .ok_or(ApiError::Unauthorized)
    }
}

/// A registered, active user.
#[derive(Debug, Clone)]
pub struct Caller {
    /// The caller's user record.
    pub user: User,
}

impl Caller {
    /// The caller's ID.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.user.id
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = forwarded_identity(parts, state)?.ok_or(ApiError::Unauthorized)?;
        load_active_user(state, user_id).map(|user| Self { user })
    }
}

/// `Some(Caller)` when identity headers are present, `None` for anonymous
/// requests. Invalid identities are still rejected.
#[derive(Debug, Clone)]
pub struct MaybeCaller(pub Option<Caller>);

impl MaybeCaller {
    /// The caller's user record, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref().map(|c| &c.user)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match forwarded_identity(parts, state)? {
            Some(user_id) => Ok(Self(Some(Caller {
                user: load_active_user(state, user_id)?,
            }))),
            None => Ok(Self(None)),
        }
    }
}

/// A caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminCaller {
    /// The admin's user record.
    pub user: User,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        if !caller.user.is_admin() {
            tracing::debug!(user_id = %caller.user.id, "Admin endpoint refused");
            return Err(ApiError::Forbidden);
        }
        Ok(Self { user: caller.user })
    }
}

/// Read the forwarded identity. `Ok(None)` when no `x-user-id` is present.
fn forwarded_identity(parts: &Parts, state: &AppState) -> Result<Option<UserId>, ApiError> {
    let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    if let Some(expected) = &state.config.gateway_key {
        let presented = parts
            .headers
            .get(GATEWAY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        if !constant_time_eq(presented, expected) {
            tracing::debug!("Gateway key mismatch");
            return Err(ApiError::Unauthorized);
        }
    }

    raw.to_str()
        .ok()
        .and_then(|s| s.trim().parse::<UserId>().ok())
        .map(Some)
        .ok_or(ApiError::Unauthorized)
}

fn load_active_user(state: &AppState, user_id: UserId) -> Result<User, ApiError> {
    let user = state
        .store
        .fetch::<User>(user_id.as_bytes())?
        .ok_or(ApiError::Unauthorized)?;
    if !user.is_active {
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}
