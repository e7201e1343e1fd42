//! Request extractors that reject through the error envelope.

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::user::Role;

/// `axum::Json` whose rejection renders as a 400 envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` whose rejection renders as a 400 envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// The authenticated caller, available behind any role middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: Option<Role>,
    pub claims: Claims,
}

fn current_user(parts: &Parts) -> Result<CurrentUser> {
    let claims = parts
        .extensions
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| Error::unauthorized("MISSING_AUTHORIZATION", "Authentication is required"))?;
    Ok(CurrentUser {
        id: claims.user_id()?,
        role: claims.role(),
        claims,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        current_user(parts)
    }
}
