// src/models/workspace.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// O tenant, criado uma única vez no cadastro da empresa
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub company_name: String,
    #[schema(example = "contato@acme.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameWorkspacePayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub company_name: String,
}

// Cadastro de um novo tenant
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub company_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
}
