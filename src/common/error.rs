use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::auth::Role;
use crate::services::token_store::TokenError;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("O token expirou ou não existe")]
    ExpiredOrUnknownToken,

    #[error("{0} já foi cadastrado")]
    DuplicateEmail(String),

    #[error("Este telefone já está em uso")]
    DuplicatePhone,

    #[error("O papel '{0}' não permite esta ação")]
    Forbidden(Role),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("A senha ainda não foi definida")]
    IncompleteProfile,

    #[error("Token inválido")]
    InvalidToken,

    // A sessão aponta para um workspace que não existe mais
    #[error("Workspace não encontrado")]
    WorkspaceMissing,

    #[error("Registro não encontrado")]
    NotFoundRow,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de serialização: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotFound => AppError::ExpiredOrUnknownToken,
            TokenError::Codec(e) => AppError::SerializationError(e),
            TokenError::Signing(e) => AppError::JwtError(e),
            e @ TokenError::TtlOutOfRange(_) => AppError::InternalServerError(e.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::ExpiredOrUnknownToken => (
                StatusCode::UNAUTHORIZED,
                "O seu token expirou ou é desconhecido.".to_string(),
            ),
            ref e @ AppError::DuplicateEmail(_) => (StatusCode::CONFLICT, e.to_string()),
            AppError::DuplicatePhone => (
                StatusCode::CONFLICT,
                "Este telefone já está em uso.".to_string(),
            ),
            AppError::Forbidden(_) => (
                StatusCode::FORBIDDEN,
                "Você não tem permissão para realizar esta ação.".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "E-mail ou senha inválidos.".to_string(),
            ),
            AppError::IncompleteProfile => (
                StatusCode::UNAUTHORIZED,
                "Conclua o seu cadastro pelo convite antes de entrar.".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::NotFoundRow => (
                StatusCode::NOT_FOUND,
                "Registro não encontrado.".to_string(),
            ),

            // Todos os outros erros (WorkspaceMissing, DatabaseError, InternalServerError...) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
