//! Extract the acting principal: request extensions first (set by upstream authentication),
//! then `X-User-Name` / `X-User-Roles` headers from a trusted gateway, else anonymous.

use crate::security::Principal;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const USER_NAME_HEADER: &str = "X-User-Name";
/// Comma-separated role names.
pub const USER_ROLES_HEADER: &str = "X-User-Roles";

#[derive(Clone, Debug)]
pub struct CurrentPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(p) = parts.extensions.get::<Principal>() {
            return Ok(CurrentPrincipal(p.clone()));
        }
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let Some(name) = header(USER_NAME_HEADER) else {
            return Ok(CurrentPrincipal(Principal::anonymous()));
        };
        let principal = header(USER_ROLES_HEADER)
            .map(|roles| {
                roles
                    .split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .fold(Principal::new(name.clone()), |p, r| p.with_role(r))
            })
            .unwrap_or_else(|| Principal::new(name));
        Ok(CurrentPrincipal(principal))
    }
}
