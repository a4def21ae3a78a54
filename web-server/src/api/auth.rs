// web-server/src/api/auth.rs
use actix_web::{get, post, web, HttpRequest, HttpResponse, cookie::Cookie};
use actix_web::cookie::time::Duration as CookieDuration;
use common::client_guard::ClientAuthState;
use common::models::{AuthenticatedUser, CanonicalIdentity, Role, Session, User};
use serde::{Deserialize, Serialize};
use serde_json::json;
use crate::error::ApiError;
use crate::middleware::session_loader::session_cookie;
use crate::session_store::{DestroySession, StartAuthenticatedSession};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse<'a> {
    user: &'a User,
    role: Role,
    redirect: &'static str,
}

async fn verify_credentials(state: &AppState, body: &LoginRequest) -> Result<User, ApiError> {
    state
        .verifier
        .verify(&body.username, &body.password)
        .await
        .map_err(|e| {
            tracing::info!("Login rejected for {}: {}", body.username, e);
            ApiError::from(e)
        })
}

/// Write the canonical identity into a fresh session and hand out its cookie
async fn establish_session(
    req: &HttpRequest,
    state: &AppState,
    user: &User,
) -> Result<HttpResponse, ApiError> {
    let session_config = &state.config.session;
    let replaces = req
        .cookie(&session_config.cookie_name)
        .map(|cookie| cookie.value().to_string());

    let identity = CanonicalIdentity::new(user.id, user.role);
    let session = state
        .sessions
        .send(StartAuthenticatedSession { identity, replaces })
        .await?;

    tracing::info!("User {} logged in as {}", user.username, user.role);

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(session_config, session.session_id))
        .json(LoginResponse {
            user,
            role: user.role,
            redirect: user.role.dashboard_path(),
        }))
}

#[post("/login")]
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = verify_credentials(&state, &body).await?;
    establish_session(&req, &state, &user).await
}

// Back-office login: valid credentials are not enough, the account must be an admin
#[post("/admin-login")]
pub async fn admin_login(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = verify_credentials(&state, &body).await?;

    if !user.is_admin() {
        tracing::warn!("Non-admin {} attempted back-office login", user.username);
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    establish_session(&req, &state, &user).await
}

#[post("/logout")]
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let cookie_name = &state.config.session.cookie_name;

    if let Some(cookie) = req.cookie(cookie_name) {
        let session_id = cookie.value().to_string();
        if !state.sessions.send(DestroySession { session_id }).await? {
            tracing::debug!("Logout for a session that no longer exists");
        }
    }

    // Create empty cookie to clear the session
    let cookie = Cookie::build(cookie_name.clone(), "")
        .path("/")
        .max_age(CookieDuration::seconds(0))
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "message": "Logged out" })))
}

#[get("/user")]
pub async fn current_user(user: Option<web::ReqData<AuthenticatedUser>>) -> Result<HttpResponse, ApiError> {
    match user {
        Some(user) => Ok(HttpResponse::Ok().json(&user.0)),
        None => Err(ApiError::Unauthorized("Not authenticated".to_string())),
    }
}

/// State the browser-side redirect guard works from
#[get("/auth/status")]
pub async fn auth_status(session: Option<web::ReqData<Session>>) -> HttpResponse {
    let identity = session.as_ref().and_then(|session| session.identity.as_ref());
    HttpResponse::Ok().json(ClientAuthState::from_identity(identity))
}
