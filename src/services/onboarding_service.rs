// src/services/onboarding_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::WorkspaceStore,
    models::{
        auth::{NewMember, Registration, Role, Session},
        invitation::Invitation,
        workspace::Workspace,
    },
    services::{
        invitation_service::InvitationService,
        notification::{send_invitation, Mailer, Sender},
        session_service::SessionService,
        user_service::UserService,
    },
};

/// Orquestra o convite e a aceitação: cruza o serviço de convites,
/// o diretório de membros e o serviço de sessões.
#[derive(Clone)]
pub struct OnboardingService {
    workspaces: Arc<dyn WorkspaceStore>,
    invitations: InvitationService,
    users: UserService,
    sessions: SessionService,
    mailer: Arc<dyn Mailer>,
    invitation_page: String,
}

impl OnboardingService {
    pub fn new(
        workspaces: Arc<dyn WorkspaceStore>,
        invitations: InvitationService,
        users: UserService,
        sessions: SessionService,
        mailer: Arc<dyn Mailer>,
        invitation_page: String,
    ) -> Self {
        Self {
            workspaces,
            invitations,
            users,
            sessions,
            mailer,
            invitation_page,
        }
    }

    /// Cadastro do tenant: cria o workspace e o dono pendente (numa só
    /// transação) e envia ao dono um convite para definir a própria senha.
    ///
    /// Se o e-mail já pertence ao dono pendente de um workspace, o convite é
    /// reemitido: é a saída quando o primeiro envio falhou. O token só segue
    /// por e-mail, nunca na resposta.
    pub async fn sign_up(&self, company_name: &str, email: &str) -> Result<Workspace, AppError> {
        let workspace = match self.users.find_by_email(email).await? {
            Some(user) if user.role == Role::Owner && user.is_pending() => {
                tracing::info!("Reenviando o convite do dono do workspace {}", user.workspace_id);
                self.workspaces
                    .get(user.workspace_id)
                    .await?
                    .ok_or(AppError::WorkspaceMissing)?
            }
            Some(_) => return Err(AppError::DuplicateEmail(email.to_owned())),
            None => {
                let (workspace, _owner) = self.workspaces.create_with_owner(company_name, email).await?;
                tracing::info!("🏢 Workspace {} criado", workspace.id);
                workspace
            }
        };

        let invitation = self
            .invitations
            .create(workspace.id, &workspace.company_name, email)
            .await?;
        send_invitation(self.mailer.as_ref(), Sender::Notify, &self.invitation_page, &invitation).await?;

        Ok(workspace)
    }

    /// Cancela o convite de um membro pendente do próprio workspace.
    /// Convites de outro workspace, ou de quem já se cadastrou, são `NotFoundRow`.
    pub async fn revoke_invitation(&self, revoker: &Session, email: &str) -> Result<(), AppError> {
        if !revoker.role.can_invite() {
            return Err(AppError::Forbidden(revoker.role));
        }

        let member = self
            .users
            .find_by_email(email)
            .await?
            .filter(|user| user.workspace_id == revoker.workspace_id && user.is_pending())
            .ok_or(AppError::NotFoundRow)?;

        self.invitations.revoke(&member.email).await?;
        tracing::info!("Convite de {} cancelado por {}", member.email, revoker.user_id);
        Ok(())
    }

    /// Cria os membros pendentes (tudo ou nada) e envia um convite para cada um.
    /// Uma falha de envio aborta o restante; as linhas já criadas permanecem.
    pub async fn invite_members(
        &self,
        inviter: &Session,
        members: &[NewMember],
    ) -> Result<Vec<Invitation>, AppError> {
        if !inviter.role.can_invite() {
            return Err(AppError::Forbidden(inviter.role));
        }

        let users = self.users.create_many(inviter.workspace_id, members).await?;

        let mut invitations = Vec::with_capacity(users.len());
        for user in &users {
            let invitation = self
                .invitations
                .create(inviter.workspace_id, &inviter.company_name, &user.email)
                .await?;

            if let Err(e) = send_invitation(
                self.mailer.as_ref(),
                Sender::Postmaster,
                &self.invitation_page,
                &invitation,
            )
            .await
            {
                tracing::error!(
                    "Falha ao enviar convite para {}; {} membros já foram criados",
                    user.email,
                    users.len()
                );
                return Err(e);
            }

            invitations.push(invitation);
        }

        tracing::info!(
            "✉️ {} convites emitidos para o workspace {}",
            invitations.len(),
            inviter.workspace_id
        );
        Ok(invitations)
    }

    /// Aceita o convite: ativa o membro, queima o token e abre uma sessão.
    /// Falhas antes de queimar o token deixam o convite vivo para nova tentativa.
    pub async fn accept(&self, token: &str, registration: Registration) -> Result<Session, AppError> {
        let invitation = self.invitations.view(token).await?;

        let user = self.users.register(&invitation.email, registration).await?;

        self.invitations.revoke(&user.email).await?;

        self.sessions.create(&user).await
    }
}
