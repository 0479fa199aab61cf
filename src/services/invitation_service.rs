// src/services/invitation_service.rs

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::invitation::Invitation,
    services::token_store::{subject_key, TokenStore},
};

// Validade do link enviado por e-mail
pub const INVITATION_TTL: Duration = Duration::from_secs(48 * 60 * 60);
// Janela curta depois que o convidado abre o link. Redefine, não soma.
pub const EXTENSION_TTL: Duration = Duration::from_secs(60 * 60);

const PURPOSE: &str = "invitation";

#[derive(Clone)]
pub struct InvitationService {
    tokens: Arc<dyn TokenStore>,
}

impl InvitationService {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }

    /// Emite um convite para `email`. Convidar de novo o mesmo e-mail
    /// substitui o convite anterior.
    pub async fn create(
        &self,
        workspace_id: Uuid,
        company_name: &str,
        email: &str,
    ) -> Result<Invitation, AppError> {
        let mut invitation = Invitation {
            workspace_id,
            company_name: company_name.to_owned(),
            email: email.to_owned(),
            token: String::new(),
        };

        invitation.token = self
            .tokens
            .commission_as(INVITATION_TTL, &subject_key(PURPOSE, email), &invitation)
            .await?;

        Ok(invitation)
    }

    /// Redefine o tempo restante do convite para 1h e devolve o payload.
    pub async fn extend(&self, token: &str) -> Result<Invitation, AppError> {
        let mut invitation: Invitation = self.tokens.extend_as(token, EXTENSION_TTL).await?;
        invitation.token = token.to_owned();
        Ok(invitation)
    }

    /// Leitura pura, sem efeito na expiração.
    pub async fn view(&self, token: &str) -> Result<Invitation, AppError> {
        let mut invitation: Invitation = self.tokens.peek_as(token).await?;
        invitation.token = token.to_owned();
        Ok(invitation)
    }

    pub async fn revoke(&self, email: &str) -> Result<(), AppError> {
        self.tokens.revoke(&subject_key(PURPOSE, email)).await?;
        Ok(())
    }
}
