use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use stockpile_db::Database;
use stockpile_gateway::dispatcher::Dispatcher;
use stockpile_types::api::{
    Claims, LoginRequest, LoginResponse, ProfileResponse, RegisterRequest, RegisterResponse,
    UpdateProfileRequest,
};

use crate::error::ApiError;
use crate::middleware::CurrentUser;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::BadRequest(
            "username must be 3-32 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("invalid email".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();

    // A taken username or email surfaces as a storage-layer duplicate.
    state
        .db
        .create_user(&user_id.to_string(), &req.username, &req.email, &password_hash)?;

    let token = create_token(&state.jwt_secret, user_id, &req.username)
        .map_err(ApiError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .user_by_email(&req.email)?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt password hash: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    // A blocked or deleted user is rejected here; no later check sees them.
    if user.is_blocked || user.is_deleted {
        return Err(ApiError::Unauthorized);
    }

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}': {e}", user.id)))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username)
        .map_err(ApiError::Internal)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        is_admin: user.is_admin,
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .user_by_id(&user.id.to_string())?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(ProfileResponse {
        id: user.id,
        username: row.username,
        email: row.email,
    }))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::BadRequest(
            "username must be 3-32 characters".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("invalid email".into()));
    }

    state
        .db
        .update_profile(&user.id.to_string(), &req.username, &req.email)?;

    Ok(Json(ProfileResponse {
        id: user.id,
        username: req.username,
        email: req.email,
    }))
}

fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
