// src/models/auth.rs

use std::fmt;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Papel do membro dentro do workspace (CREATE TYPE user_role no banco)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum Role {
    Member,
    Admin,
    Owner,
}

impl Role {
    /// Lista de permissão: só estes papéis podem convidar novos membros.
    /// Qualquer papel novo fica de fora até ser incluído aqui.
    pub fn can_invite(self) -> bool {
        matches!(self, Role::Admin | Role::Owner)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Representa um usuário vindo do banco de dados.
// Sem senha = "pendente" (convidado); com senha = "ativo".
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: Option<String>,

    pub email: String,
    pub phone: Option<String>,
    pub workspace_id: Uuid,
}

impl User {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
    }

    pub fn is_pending(&self) -> bool {
        self.password_hash.is_none()
    }
}

// Linha pendente a ser criada antes do convite ser enviado
#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: String,
    pub role: Role,
}

// Dados do membro no momento em que aceita o convite
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub password: String,
}

// Campos gravados pelo `register`, com a senha já em hash
#[derive(Debug, Clone)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub password_hash: String,
}

// A sessão guardada no token store. `session_key` é o próprio token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_key: String,
    pub full_name: String,
}

// Credencial curta para recuperação de senha
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetToken {
    pub user_id: Uuid,
    pub workspace_id: Uuid,
    #[serde(skip)]
    pub key: String,
    #[serde(skip)]
    pub expires_at: DateTime<Utc>,
}

// ---
// Payloads da API
// ---

lazy_static! {
    // Telefone no formato 080xxxxxxxx (11 dígitos)
    static ref PHONE_PATTERN: Regex = Regex::new(r"^0[789][01][0-9]{8}$").unwrap();
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub first_name: String,
    #[validate(length(min = 1, message = "O sobrenome é obrigatório."))]
    pub last_name: String,
    #[validate(length(min = 8, max = 64, message = "A senha deve ter entre 8 e 64 caracteres."))]
    pub password: String,
    #[validate(regex(path = *PHONE_PATTERN, message = "Deve ser um telefone válido (080xxxxxxxx)."))]
    pub phone: String,
}

impl From<RegistrationPayload> for Registration {
    fn from(payload: RegistrationPayload) -> Self {
        Self {
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            password: payload.password,
        }
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequestPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetPayload {
    #[validate(length(min = 8, max = 64, message = "A senha deve ter entre 8 e 64 caracteres."))]
    pub password: String,
}
