//! Authentication handlers.

use actix_web::{HttpResponse, web};

use blogicum_core::input::RegistrationInput;
use blogicum_core::services::Session;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{AuthResponse, LoginRequest};

use crate::handlers::render;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn auth_response(session: Session) -> AuthResponse {
    AuthResponse {
        access_token: session.token,
        token_type: "Bearer".to_string(),
        expires_in: session.expires_in.max(0) as u64,
        user: render::user(session.user),
    }
}

/// POST /api/auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegistrationInput>,
) -> AppResult<HttpResponse> {
    let session = state.accounts.register(body.into_inner()).await?;

    Ok(HttpResponse::Created().json(auth_response(session)))
}

/// POST /api/auth/login/
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let session = state.accounts.login(&req.username, &req.password).await?;

    tracing::debug!(user_id = %session.user.id, "User logged in");
    Ok(HttpResponse::Ok().json(auth_response(session)))
}

/// POST /api/auth/logout/
pub async fn logout(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    state.accounts.logout(&identity.claims).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Logged out")))
}

/// GET /api/auth/me/ - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.accounts.current_user(&identity.claims).await?;

    Ok(HttpResponse::Ok().json(render::user(user)))
}
