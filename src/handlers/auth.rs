// src/handlers/auth.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedSession,
    models::auth::{LoginPayload, PasswordResetPayload, PasswordResetRequestPayload, Session},
};

// Handler de login
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Sessão aberta", body = Session),
        (status = 401, description = "Credenciais inválidas ou cadastro incompleto")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<Session>, AppError> {
    payload.validate()?;

    let session = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(session))
}

// Handler da rota protegida: devolve a sessão do Bearer
#[utoipa::path(
    get,
    path = "/api/v1/sessions/current",
    tag = "Auth",
    responses(
        (status = 200, description = "Sessão atual", body = Session),
        (status = 401, description = "Sessão ausente ou expirada")
    ),
    security(("session_key" = []))
)]
pub async fn current_session(AuthenticatedSession(session): AuthenticatedSession) -> Json<Session> {
    Json(session)
}

// POST /api/v1/password-resets
#[utoipa::path(
    post,
    path = "/api/v1/password-resets",
    tag = "Auth",
    request_body = PasswordResetRequestPayload,
    responses(
        (status = 202, description = "Pedido aceito; o e-mail sai se o membro existir")
    )
)]
pub async fn request_password_reset(
    State(app_state): State<AppState>,
    Json(payload): Json<PasswordResetRequestPayload>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    app_state
        .auth_service
        .request_password_reset(&payload.email)
        .await?;

    Ok(StatusCode::ACCEPTED)
}

// PATCH /api/v1/password-resets/{token}
#[utoipa::path(
    patch,
    path = "/api/v1/password-resets/{token}",
    tag = "Auth",
    params(("token" = String, Path, description = "Token de reset")),
    request_body = PasswordResetPayload,
    responses(
        (status = 200, description = "Senha trocada; sessão aberta", body = Session),
        (status = 401, description = "Token expirado ou desconhecido")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<PasswordResetPayload>,
) -> Result<Json<Session>, AppError> {
    payload.validate()?;

    let session = app_state
        .auth_service
        .reset_password(&token, &payload.password)
        .await?;

    Ok(Json(session))
}
