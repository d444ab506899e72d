use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::{error, info};
use uuid::Uuid;

use trove_db::queries::NewUser;
use trove_db::{Database, DbError};
use trove_types::api::{Claims, LoginRequest, LoginResponse, SignupRequest, SignupResponse};

use crate::error::ApiError;
use crate::run_db;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SignupRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::bad_request(
            "Username must be between 3 and 32 characters",
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::bad_request("Provide a valid email address"));
    }

    let password_hash = hash_password(&req.password)?;

    let SignupRequest {
        email, username, ..
    } = req;
    let user = run_db(&state, move |db| {
        let created = db.create_user(&NewUser {
            username: &username,
            email: &email,
            password_hash: &password_hash,
        });
        match created {
            Ok(user) => Ok(Some(user)),
            Err(DbError::Conflict(_)) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await?
    .ok_or_else(|| ApiError::new(StatusCode::CONFLICT, "Username or email is already taken"))?;

    let token = create_token(&state.jwt_secret, user.id, &user.username).map_err(|e| {
        error!("token encoding failed: {:#}", e);
        ApiError::internal()
    })?;

    info!("New user signed up: {}", user.username);
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.clone();
    let user = run_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(|_| ApiError::internal())?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::unauthorized())?;

    let token = create_token(&state.jwt_secret, user.id, &user.username).map_err(|e| {
        error!("token encoding failed: {:#}", e);
        ApiError::internal()
    })?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        token,
    }))
}

/// Echo the verified claims back to the caller.
pub async fn verify(Extension(claims): Extension<Claims>) -> Json<Claims> {
    Json(claims)
}

/// Hash a password with Argon2id and a fresh salt.
pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("password hashing failed: {}", e);
            ApiError::internal()
        })
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
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
