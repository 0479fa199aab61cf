// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Invitations ---
        handlers::invitations::invite_members,
        handlers::invitations::view_invitation,
        handlers::invitations::extend_invitation,
        handlers::invitations::accept_invitation,
        handlers::invitations::revoke_invitation,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::current_session,
        handlers::auth::request_password_reset,
        handlers::auth::reset_password,

        // --- Workspaces ---
        handlers::workspaces::sign_up,
        handlers::workspaces::rename_workspace,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::Session,
            models::auth::RegistrationPayload,
            models::auth::LoginPayload,
            models::auth::PasswordResetRequestPayload,
            models::auth::PasswordResetPayload,

            // --- Invitations ---
            models::invitation::Invitation,
            models::invitation::InvitationPayload,

            // --- Workspaces ---
            models::workspace::Workspace,
            models::workspace::SignUpPayload,
            models::workspace::RenameWorkspacePayload,
        )
    ),
    tags(
        (name = "Invitations", description = "Convites e Aceitação"),
        (name = "Auth", description = "Sessões e Recuperação de Senha"),
        (name = "Workspaces", description = "Dados do Workspace")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_key",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
