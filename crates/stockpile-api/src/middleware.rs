use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use stockpile_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// The resolved calling actor. Role and blocked state are read fresh from
/// storage on every request, so a blocked or demoted user loses access on
/// their next call regardless of what their token says.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

/// Identity on public read endpoints: no credential is a distinct anonymous
/// case, never equated with any real actor id.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

/// Extract and validate the bearer JWT, then resolve the actor against the
/// user store. Missing, invalid, blocked, or deleted all reject.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_bearer(&state, req.headers())?.ok_or(ApiError::Unauthorized)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Same resolution for public endpoints, but an absent or unusable credential
/// degrades to anonymous instead of rejecting — read is always allowed.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = anonymous_on_credential_failure(resolve_bearer(&state, req.headers()))?;
    req.extensions_mut().insert(MaybeUser(user));
    Ok(next.run(req).await)
}

/// Only credential failures degrade to anonymous; a storage fault is not a
/// bad token and still surfaces as an internal error.
fn anonymous_on_credential_failure(
    resolved: Result<Option<CurrentUser>, ApiError>,
) -> Result<Option<CurrentUser>, ApiError> {
    match resolved {
        Ok(user) => Ok(user),
        Err(err @ ApiError::Internal(_)) => Err(err),
        Err(_) => Ok(None),
    }
}

fn resolve_bearer(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<CurrentUser>, ApiError> {
    let Some(auth_header) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(None);
    };

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    let row = state
        .db
        .user_by_id(&token_data.claims.sub.to_string())?
        .ok_or(ApiError::Unauthorized)?;
    if row.is_blocked || row.is_deleted {
        return Err(ApiError::Unauthorized);
    }

    Ok(Some(CurrentUser {
        id: token_data.claims.sub,
        username: row.username,
        is_admin: row.is_admin,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn bad_credentials_degrade_to_anonymous() {
        let resolved = anonymous_on_credential_failure(Err(ApiError::Unauthorized));
        assert!(matches!(resolved, Ok(None)));
    }

    #[test]
    fn resolved_identity_passes_through() {
        let user = CurrentUser {
            id: Uuid::new_v4(),
            username: "someone".into(),
            is_admin: false,
        };
        let resolved = anonymous_on_credential_failure(Ok(Some(user.clone())));
        assert_eq!(resolved.unwrap().unwrap().id, user.id);
    }

    #[test]
    fn storage_faults_are_not_swallowed() {
        let fault = ApiError::Internal(anyhow::anyhow!("disk on fire"));
        let resolved = anonymous_on_credential_failure(Err(fault));
        assert!(matches!(resolved, Err(ApiError::Internal(_))));
    }
}
