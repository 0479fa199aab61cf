// src/services/auth.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    models::auth::Session,
    services::{
        notification::{send_reset_token, Mailer},
        session_service::SessionService,
        user_service::{validate_password, UserService},
    },
};

/// Login e recuperação de senha para membros já ativos.
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    sessions: SessionService,
    mailer: Arc<dyn Mailer>,
    reset_page: String,
}

impl AuthService {
    pub fn new(
        users: UserService,
        sessions: SessionService,
        mailer: Arc<dyn Mailer>,
        reset_page: String,
    ) -> Self {
        Self {
            users,
            sessions,
            mailer,
            reset_page,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let user = self
            .users
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        validate_password(password, user.password_hash.as_deref()).await?;

        self.sessions.create(&user).await
    }

    /// Emite e envia um token de reset. E-mails desconhecidos não geram erro,
    /// para a rota não revelar quem está cadastrado.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(&email.trim().to_lowercase()).await? else {
            tracing::info!("Pedido de reset para e-mail não cadastrado");
            return Ok(());
        };

        let reset = self.users.issue_reset_token(&user).await?;
        send_reset_token(self.mailer.as_ref(), &self.reset_page, &reset, &user).await
    }

    /// Troca a senha usando o token de reset, queima o token e abre uma sessão.
    pub async fn reset_password(&self, key: &str, password: &str) -> Result<Session, AppError> {
        let reset = self.users.load_reset_token(key).await?;

        let user = self
            .users
            .change_password(reset.workspace_id, reset.user_id, password)
            .await?
            .ok_or(AppError::NotFoundRow)?;

        self.users.revoke_reset_token(&user.email).await?;

        self.sessions.create(&user).await
    }
}
