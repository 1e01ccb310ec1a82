//! Identity extractors.
//!
//! Identity verification is an external collaborator: the gateway in
//! front of this service authenticates the caller and forwards a verified
//! account id and role in the `x-account-id` and `x-role` headers. The
//! extractors here only parse those headers; they never validate
//! credentials themselves.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use ink_core::{AccountId, Role};

use crate::error::ApiError;
use crate::state::AppState;

/// The verified caller identity supplied by the authentication gateway.
#[derive(Debug, Clone)]
pub struct Identity {
    /// The caller's account id.
    pub account_id: AccountId,
    /// The caller's role.
    pub role: Role,
}

impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let account_id = parts
                .headers
                .get("x-account-id")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?
                .parse::<AccountId>()
                .map_err(|_| ApiError::Unauthorized)?;

            let role = match parts.headers.get("x-role").and_then(|v| v.to_str().ok()) {
                Some("admin") => Role::Admin,
                // Absent or anything else is an ordinary teacher.
                _ => Role::Teacher,
            };

            Ok(Identity { account_id, role })
        })
    }
}

/// An identity that has been checked for the admin role.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

impl FromRequestParts<Arc<AppState>> for AdminIdentity {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let identity = Identity::from_request_parts(parts, state).await?;
            if !identity.role.is_admin() {
                return Err(ApiError::Forbidden);
            }
            Ok(Self(identity))
        })
    }
}
