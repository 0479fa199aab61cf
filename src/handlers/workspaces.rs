// src/handlers/workspaces.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{ManageWorkspace, RequireCapability},
    models::workspace::{RenameWorkspacePayload, SignUpPayload, Workspace},
};

// POST /api/v1/workspaces
#[utoipa::path(
    post,
    path = "/api/v1/workspaces",
    tag = "Workspaces",
    request_body = SignUpPayload,
    responses(
        (status = 201, description = "Workspace criado (ou convite do dono pendente reenviado); o token segue só por e-mail", body = Workspace),
        (status = 400, description = "Payload inválido"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn sign_up(
    State(app_state): State<AppState>,
    Json(payload): Json<SignUpPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let workspace = app_state
        .onboarding_service
        .sign_up(payload.company_name.trim(), &payload.email.trim().to_lowercase())
        .await?;

    Ok((StatusCode::CREATED, Json(workspace)))
}

// PATCH /api/v1/workspace
#[utoipa::path(
    patch,
    path = "/api/v1/workspace",
    tag = "Workspaces",
    request_body = RenameWorkspacePayload,
    responses(
        (status = 200, description = "Workspace renomeado", body = Workspace),
        (status = 403, description = "Apenas owner e admin"),
        (status = 500, description = "O workspace da sessão não existe mais")
    ),
    security(("session_key" = []))
)]
pub async fn rename_workspace(
    State(app_state): State<AppState>,
    RequireCapability(session, _): RequireCapability<ManageWorkspace>,
    Json(payload): Json<RenameWorkspacePayload>,
) -> Result<Json<Workspace>, AppError> {
    payload.validate()?;

    let workspace = app_state
        .workspaces
        .change_name(session.workspace_id, payload.company_name.trim())
        .await?
        .ok_or(AppError::WorkspaceMissing)?;

    tracing::info!("🏷️ Workspace {} renomeado", workspace.id);
    Ok(Json(workspace))
}
