//! `/users` handlers.

use courseware_core::{CoursewareError, NewUser, RequestContext};
use courseware_server::{HandlerResult, Reply};
use courseware_store::StoreError;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::store_error;
use crate::app::AppState;

/// Returned when registering an email address that is already stored.
pub const EMAIL_IN_USE_MESSAGE: &str = "Email address is already in use";

/// Body of `POST /users`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login name.
    pub email_address: String,
    /// Plaintext password, hashed before storage.
    pub password: String,
}

/// Body of `GET /users`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    /// `"<first> <last>"`.
    pub name: String,
    /// Login name.
    pub email: String,
}

/// `GET /users`: the authenticated caller.
pub async fn get_user(ctx: RequestContext) -> HandlerResult {
    let user = ctx.authenticated()?;
    Reply::ok(&CurrentUser {
        name: user.display_name(),
        email: user.email_address.clone(),
    })
}

/// `POST /users`: registers a user.
pub async fn create_user(state: AppState, ctx: RequestContext, body: CreateUserRequest) -> HandlerResult {
    let password_hash = state
        .hasher
        .hash(body.password)
        .await
        .map_err(|e| CoursewareError::internal_with_source("Failed to hash password", e))?;

    let user = state
        .users
        .insert_user(NewUser {
            first_name: body.first_name,
            last_name: body.last_name,
            email_address: body.email_address,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation { .. } => CoursewareError::conflict(EMAIL_IN_USE_MESSAGE),
            other => store_error(other),
        })?;

    info!(
        request_id = %ctx.request_id(),
        user_id = %user.id,
        "created user"
    );
    Ok(Reply::created("/"))
}
