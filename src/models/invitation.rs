// src/models/invitation.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::auth::{NewMember, Role};

// O convite não é uma linha no banco: só existe como payload no token store,
// indexado pelo e-mail convidado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub workspace_id: Uuid,
    pub company_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
}

// Donos não são convidados, só membros e administradores
fn validate_invitable_role(role: &Role) -> Result<(), ValidationError> {
    match role {
        Role::Member | Role::Admin => Ok(()),
        Role::Owner => {
            let mut err = ValidationError::new("role");
            err.message = Some("O papel deve ser 'member' ou 'admin'.".into());
            Err(err)
        }
    }
}

// Um item do corpo de POST /invitations
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InvitationPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(custom(function = "validate_invitable_role"))]
    pub role: Role,
}

impl From<InvitationPayload> for NewMember {
    fn from(payload: InvitationPayload) -> Self {
        Self {
            // E-mails são guardados sempre em minúsculas
            email: payload.email.trim().to_lowercase(),
            role: payload.role,
        }
    }
}
