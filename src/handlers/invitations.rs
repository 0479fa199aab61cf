// src/handlers/invitations.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{InviteMembers, RequireCapability},
    models::{
        auth::{NewMember, RegistrationPayload, Session},
        invitation::{Invitation, InvitationPayload},
    },
};

// Lista vazia não é um convite válido
fn empty_list_error() -> AppError {
    let mut err = ValidationError::new("length");
    err.message = Some("Informe ao menos um convite.".into());
    let mut errors = ValidationErrors::new();
    errors.add("invitations", err);
    AppError::ValidationError(errors)
}

// POST /api/v1/invitations
#[utoipa::path(
    post,
    path = "/api/v1/invitations",
    tag = "Invitations",
    request_body = Vec<InvitationPayload>,
    responses(
        (status = 201, description = "Convites emitidos", body = Vec<Invitation>),
        (status = 400, description = "Payload inválido"),
        (status = 403, description = "O papel da sessão não pode convidar"),
        (status = 409, description = "Algum e-mail já foi cadastrado")
    ),
    security(("session_key" = []))
)]
pub async fn invite_members(
    State(app_state): State<AppState>,
    // O guardião vem antes do corpo: "member" é recusado sem efeito colateral
    RequireCapability(session, _): RequireCapability<InviteMembers>,
    Json(payloads): Json<Vec<InvitationPayload>>,
) -> Result<impl IntoResponse, AppError> {
    if payloads.is_empty() {
        return Err(empty_list_error());
    }
    for payload in &payloads {
        payload.validate()?;
    }

    let members: Vec<NewMember> = payloads.into_iter().map(NewMember::from).collect();
    let invitations = app_state
        .onboarding_service
        .invite_members(&session, &members)
        .await?;

    Ok((StatusCode::CREATED, Json(invitations)))
}

// GET /api/v1/invitations/{token}
#[utoipa::path(
    get,
    path = "/api/v1/invitations/{token}",
    tag = "Invitations",
    params(("token" = String, Path, description = "Token do convite")),
    responses(
        (status = 200, description = "Conteúdo do convite", body = Invitation),
        (status = 401, description = "Convite expirado ou desconhecido")
    )
)]
pub async fn view_invitation(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Invitation>, AppError> {
    let invitation = app_state.invitation_service.view(&token).await?;
    Ok(Json(invitation))
}

// PATCH /api/v1/invitations/{token}/extend
#[utoipa::path(
    patch,
    path = "/api/v1/invitations/{token}/extend",
    tag = "Invitations",
    params(("token" = String, Path, description = "Token do convite")),
    responses(
        (status = 200, description = "Convite válido por mais 1h a partir de agora", body = Invitation),
        (status = 401, description = "Convite expirado ou desconhecido")
    )
)]
pub async fn extend_invitation(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Invitation>, AppError> {
    let invitation = app_state.invitation_service.extend(&token).await?;
    Ok(Json(invitation))
}

// PATCH /api/v1/invitations/{token}/accept
#[utoipa::path(
    patch,
    path = "/api/v1/invitations/{token}/accept",
    tag = "Invitations",
    params(("token" = String, Path, description = "Token do convite")),
    request_body = RegistrationPayload,
    responses(
        (status = 200, description = "Cadastro concluído; sessão aberta", body = Session),
        (status = 400, description = "Payload inválido"),
        (status = 401, description = "Convite expirado ou desconhecido"),
        (status = 409, description = "Telefone já em uso")
    )
)]
pub async fn accept_invitation(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<RegistrationPayload>,
) -> Result<Json<Session>, AppError> {
    payload.validate()?;

    let session = app_state
        .onboarding_service
        .accept(&token, payload.into())
        .await?;

    Ok(Json(session))
}

// DELETE /api/v1/members/{email}/invitation
#[utoipa::path(
    delete,
    path = "/api/v1/members/{email}/invitation",
    tag = "Invitations",
    params(("email" = String, Path, description = "E-mail convidado")),
    responses(
        (status = 204, description = "Convite cancelado"),
        (status = 403, description = "O papel da sessão não pode convidar"),
        (status = 404, description = "Nenhum membro pendente com este e-mail no workspace")
    ),
    security(("session_key" = []))
)]
pub async fn revoke_invitation(
    State(app_state): State<AppState>,
    RequireCapability(session, _): RequireCapability<InviteMembers>,
    Path(email): Path<String>,
) -> Result<StatusCode, AppError> {
    app_state
        .onboarding_service
        .revoke_invitation(&session, &email.trim().to_lowercase())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
