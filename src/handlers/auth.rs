use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::models::{Principal, Role};
use crate::state::AppState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Resolves the caller. The admin presents the configured bearer token; users are
/// identified by headers set by the fronting auth layer.
pub fn principal_from_headers(headers: &HeaderMap, admin_token: &str) -> Result<Principal, AppError> {
    if let Some(token) = header(headers, "authorization").and_then(|a| a.strip_prefix("Bearer ")) {
        if !admin_token.is_empty() && token == admin_token {
            return Ok(Principal {
                id: header(headers, "x-user-id").unwrap_or("admin").to_string(),
                name: header(headers, "x-user-name").unwrap_or("Admin").to_string(),
                email: header(headers, "x-user-email").unwrap_or_default().to_string(),
                role: Role::Admin,
            });
        }
        return Err(AppError::Unauthorized);
    }

    let id = header(headers, "x-user-id").ok_or(AppError::Unauthorized)?;
    Ok(Principal {
        id: id.to_string(),
        name: header(headers, "x-user-name").unwrap_or_default().to_string(),
        email: header(headers, "x-user-email").unwrap_or_default().to_string(),
        role: Role::User,
    })
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers, &state.config.admin_token)
    }
}

/// A principal with the admin role.
pub struct Admin(pub Principal);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = principal_from_headers(&parts.headers, &state.config.admin_token)?;
        if !principal.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(Admin(principal))
    }
}
