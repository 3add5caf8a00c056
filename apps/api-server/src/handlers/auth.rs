//! Authentication handlers.

use actix_web::{HttpRequest, HttpResponse, web};

use restgate_shared::dto::{AccessTokenResponse, LoginRequest, TokensResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let tokens = state.auth.login(&req.login, &req.password).await?;
    tracing::info!(login = %req.login, "User logged in");

    Ok(HttpResponse::Ok().json(TokensResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// GET /api/logout - Protected route
///
/// The refresh token stays valid until the next login.
pub async fn logout(identity: Identity) -> AppResult<HttpResponse> {
    tracing::info!(login = %identity.0.login, "User logged out");
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/refresh - Protected route, refresh token in the configured header
pub async fn refresh(
    state: web::Data<AppState>,
    identity: Identity,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let presented = req
        .headers()
        .get(state.refresh_header.as_str())
        .and_then(|value| value.to_str().ok());

    let access_token = state.auth.refresh(&identity.0.login, presented).await?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}
