// src/services/user_service.rs

use std::{sync::Arc, time::Duration};

use bcrypt::{hash, verify};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserStore,
    models::auth::{NewMember, Profile, Registration, ResetToken, User},
    services::token_store::{subject_key, TokenStore},
};

// Fator de custo fixo do bcrypt
pub const PASSWORD_COST: u32 = 10;
pub const RESET_TOKEN_TTL: Duration = Duration::from_secs(12 * 60 * 60);

const RESET_PURPOSE: &str = "password-reset";

/// Diretório de membros: cria linhas pendentes, materializa o cadastro
/// e troca senhas. O hashing acontece aqui, nunca no repositório.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    password_cost: u32,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            users,
            tokens,
            password_cost: PASSWORD_COST,
        }
    }

    // Nos testes o custo mínimo deixa o bcrypt rápido
    #[cfg(test)]
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub async fn create(&self, workspace_id: Uuid, member: &NewMember) -> Result<User, AppError> {
        self.users.create(workspace_id, member).await
    }

    /// Tudo ou nada: um e-mail repetido derruba o lote inteiro com um
    /// `DuplicateEmail` genérico.
    pub async fn create_many(
        &self,
        workspace_id: Uuid,
        members: &[NewMember],
    ) -> Result<Vec<User>, AppError> {
        self.users.create_many(workspace_id, members).await
    }

    /// Ativa o membro pendente com este e-mail: nome, telefone e senha.
    pub async fn register(&self, email: &str, registration: Registration) -> Result<User, AppError> {
        let password_hash = hash_password(&registration.password, self.password_cost).await?;

        let profile = Profile {
            first_name: registration.first_name,
            last_name: registration.last_name,
            phone: registration.phone,
            password_hash,
        };
        self.users.register(email, &profile).await
    }

    /// `Ok(None)` quando não há membro com este id no workspace.
    /// Não é um erro: quem chama decide o que fazer.
    pub async fn change_password(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let password_hash = hash_password(password, self.password_cost).await?;
        self.users
            .update_password(workspace_id, user_id, &password_hash)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.users.find_by_email(email).await
    }

    pub async fn issue_reset_token(&self, user: &User) -> Result<ResetToken, AppError> {
        let mut reset = ResetToken {
            user_id: user.id,
            workspace_id: user.workspace_id,
            key: String::new(),
            expires_at: Utc::now(),
        };

        reset.key = self
            .tokens
            .commission_as(RESET_TOKEN_TTL, &subject_key(RESET_PURPOSE, &user.email), &reset)
            .await?;
        reset.expires_at = Utc::now() + chrono::Duration::hours(12);

        Ok(reset)
    }

    pub async fn load_reset_token(&self, key: &str) -> Result<ResetToken, AppError> {
        let mut reset: ResetToken = self.tokens.peek_as(key).await?;
        reset.key = key.to_owned();
        Ok(reset)
    }

    pub async fn revoke_reset_token(&self, email: &str) -> Result<(), AppError> {
        self.tokens.revoke(&subject_key(RESET_PURPOSE, email)).await?;
        Ok(())
    }
}

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password_clone = password.to_owned();

    // Executa o hashing em um thread separado
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

    Ok(hashed)
}

/// Confere a senha contra o hash guardado. Sem hash o cadastro não foi concluído.
pub async fn validate_password(password: &str, password_hash: Option<&str>) -> Result<(), AppError> {
    let Some(password_hash) = password_hash else {
        return Err(AppError::IncompleteProfile);
    };

    let password_clone = password.to_owned();
    let password_hash_clone = password_hash.to_owned();

    let is_password_valid =
        tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
            .unwrap_or(false);

    if !is_password_valid {
        return Err(AppError::InvalidCredentials);
    }
    Ok(())
}
