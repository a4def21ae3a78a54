// web-server/src/api/admin.rs
//! Back-office endpoints. Everything here sits behind the admin guard.

use actix_web::{delete, get, patch, post, web, HttpResponse};
use common::auth::hash_password;
use common::models::{Role, User};
use serde::Deserialize;
use uuid::Uuid;
use crate::error::ApiError;
use crate::session_store::GetSessionMetrics;
use crate::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid message ID format".to_string()))
}

#[get("/messages")]
pub async fn list_messages(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.messages.list())
}

#[patch("/messages/{id}/read")]
pub async fn mark_message_read(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let message = state
        .messages
        .mark_read(id)
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;
    Ok(HttpResponse::Ok().json(message))
}

#[delete("/messages/{id}")]
pub async fn delete_message(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    if state.messages.delete(id) {
        tracing::info!("Deleted message {}", id);
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::NotFound("Message not found".to_string()))
    }
}

#[get("/users")]
pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = state.users.list().await?;
    Ok(HttpResponse::Ok().json(users))
}

#[post("/users")]
pub async fn create_user(
    state: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let username = request.username.trim().to_string();

    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let password = request.password;
    let password_hash = web::block(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let mut user = User::new(username, password_hash, request.role);
    user.full_name = request.full_name;
    user.email = request.email;

    let user = state.users.insert(user).await?;
    Ok(HttpResponse::Created().json(user))
}

#[get("/sessions/metrics")]
pub async fn session_metrics(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let metrics = state.sessions.send(GetSessionMetrics).await?;
    Ok(HttpResponse::Ok().json(metrics))
}
