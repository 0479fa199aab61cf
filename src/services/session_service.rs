// src/services/session_service.rs

use std::{sync::Arc, time::Duration};

use crate::{
    common::error::AppError,
    db::WorkspaceStore,
    models::auth::{Session, User},
    services::token_store::{subject_key, TokenStore},
};

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const PURPOSE: &str = "session";

#[derive(Clone)]
pub struct SessionService {
    tokens: Arc<dyn TokenStore>,
    workspaces: Arc<dyn WorkspaceStore>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        workspaces: Arc<dyn WorkspaceStore>,
        ttl: Duration,
    ) -> Self {
        Self { tokens, workspaces, ttl }
    }

    /// Emite uma sessão para o membro. O workspace precisa existir:
    /// uma sessão nunca aponta para um tenant órfão.
    pub async fn create(&self, user: &User) -> Result<Session, AppError> {
        let workspace = self
            .workspaces
            .get(user.workspace_id)
            .await?
            .ok_or(AppError::WorkspaceMissing)?;

        let mut session = Session {
            workspace_id: user.workspace_id,
            user_id: user.id,
            role: user.role,
            company_name: workspace.company_name,
            session_key: String::new(),
            full_name: user.full_name(),
        };

        session.session_key = self
            .tokens
            .commission_as(self.ttl, &subject_key(PURPOSE, &user.email), &session)
            .await?;

        Ok(session)
    }

    /// Carrega a sessão a partir da chave enviada no `Authorization`.
    pub async fn load(&self, session_key: &str) -> Result<Session, AppError> {
        let mut session: Session = self.tokens.peek_as(session_key).await?;
        session.session_key = session_key.to_owned();
        Ok(session)
    }
}
