/// User handlers - registration and login, where credentials are issued
use actix_web::{cookie::Cookie, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::password;
use crate::store::AppStore;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    config: web::Data<Config>,
    store: web::Data<AppStore>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("Please enter a valid email".into()));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Please enter a strong password".into(),
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        password_hash: password::hash_password(&req.password)?,
    };
    let user_id = user.id;

    if !store.insert_user(user) {
        return Err(AppError::Conflict("User already exists".into()));
    }

    tracing::info!(user_id = %user_id, "user registered");
    token_response(&config, user_id)
}

pub async fn login(
    config: web::Data<Config>,
    store: web::Data<AppStore>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let user = store
        .find_user_by_email(&req.email)
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    token_response(&config, user.id)
}

/// Issue a credential and return it both as the `jwt` cookie and in the body.
fn token_response(config: &Config, user_id: Uuid) -> Result<HttpResponse> {
    let token = auth_core::issue_token(
        user_id,
        &config.auth.jwt_secret,
        chrono::Duration::hours(config.auth.token_ttl_hours),
    )
    .map_err(|e| AppError::Internal(format!("Token issuing failed: {}", e)))?;

    let cookie = Cookie::build(actix_middleware::jwt_auth::COOKIE_NAME, token.clone())
        .path("/")
        .http_only(true)
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(serde_json::json!({ "success": true, "token": token })))
}
