// src/testing.rs
// Implementações em memória das portas de persistência e do mailer, com as
// mesmas regras de unicidade e atomicidade do Postgres.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    db::{UserStore, WorkspaceStore},
    models::{
        auth::{NewMember, Profile, Role, Session, User},
        workspace::Workspace,
    },
    services::{
        auth::AuthService,
        invitation_service::InvitationService,
        notification::{Mailer, TemplateMail},
        onboarding_service::OnboardingService,
        session_service::{SessionService, DEFAULT_SESSION_TTL},
        token_store::MemoryTokenStore,
        user_service::UserService,
    },
};

// Menor custo aceito pelo bcrypt
pub const TEST_PASSWORD_COST: u32 = 4;

pub fn pending_user(workspace_id: Uuid, email: &str, role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        first_name: None,
        last_name: None,
        role,
        password_hash: None,
        email: email.to_owned(),
        phone: None,
        workspace_id,
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn users(&self) -> Vec<User> {
        self.rows.lock().unwrap().clone()
    }

    pub fn find(&self, email: &str) -> Option<User> {
        self.rows.lock().unwrap().iter().find(|u| u.email == email).cloned()
    }

    pub fn insert_pending(&self, workspace_id: Uuid, email: &str, role: Role) -> User {
        let user = pending_user(workspace_id, email, role);
        self.rows.lock().unwrap().push(user.clone());
        user
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, workspace_id: Uuid, member: &NewMember) -> Result<User, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| u.email == member.email) {
            return Err(AppError::DuplicateEmail(member.email.clone()));
        }

        let user = pending_user(workspace_id, &member.email, member.role);
        rows.push(user.clone());
        Ok(user)
    }

    async fn create_many(
        &self,
        workspace_id: Uuid,
        members: &[NewMember],
    ) -> Result<Vec<User>, AppError> {
        let mut rows = self.rows.lock().unwrap();

        let mut staged: Vec<User> = Vec::with_capacity(members.len());
        for member in members {
            let taken = rows.iter().chain(staged.iter()).any(|u| u.email == member.email);
            if taken {
                return Err(AppError::DuplicateEmail("Um dos usuários".into()));
            }
            staged.push(pending_user(workspace_id, &member.email, member.role));
        }

        rows.extend(staged.iter().cloned());
        Ok(staged)
    }

    async fn register(&self, email: &str, profile: &Profile) -> Result<User, AppError> {
        let mut rows = self.rows.lock().unwrap();

        let phone_taken = rows
            .iter()
            .any(|u| u.email != email && u.phone.as_deref() == Some(profile.phone.as_str()));
        if phone_taken {
            return Err(AppError::DuplicatePhone);
        }

        let user = rows
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or(AppError::NotFoundRow)?;
        user.first_name = Some(profile.first_name.clone());
        user.last_name = Some(profile.last_name.clone());
        user.phone = Some(profile.phone.clone());
        user.password_hash = Some(profile.password_hash.clone());
        Ok(user.clone())
    }

    async fn update_password(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|u| u.id == user_id && u.workspace_id == workspace_id)
            .map(|u| {
                u.password_hash = Some(password_hash.to_owned());
                u.clone()
            }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.find(email))
    }
}

#[derive(Default)]
pub struct MemoryWorkspaceStore {
    rows: Mutex<HashMap<Uuid, Workspace>>,
    // Onde `create_with_owner` grava o dono
    users: Arc<MemoryUserStore>,
}

impl MemoryWorkspaceStore {
    pub fn with_users(users: Arc<MemoryUserStore>) -> Self {
        Self {
            rows: Mutex::default(),
            users,
        }
    }

    pub fn find_by_name(&self, company_name: &str) -> Option<Workspace> {
        self.rows
            .lock()
            .unwrap()
            .values()
            .find(|w| w.company_name == company_name)
            .cloned()
    }

    pub fn insert(&self, company_name: &str) -> Workspace {
        let workspace = Workspace {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            company_name: company_name.to_owned(),
            email: format!("contato@{}.com", company_name.to_lowercase()),
        };
        self.rows
            .lock()
            .unwrap()
            .insert(workspace.id, workspace.clone());
        workspace
    }
}

#[async_trait]
impl WorkspaceStore for MemoryWorkspaceStore {
    async fn create_with_owner(
        &self,
        company_name: &str,
        email: &str,
    ) -> Result<(Workspace, User), AppError> {
        let workspace = Workspace {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            company_name: company_name.to_owned(),
            email: email.to_owned(),
        };
        let owner = NewMember {
            email: email.to_owned(),
            role: Role::Owner,
        };

        // O dono entra primeiro: se o e-mail colidir, o workspace nem é gravado
        let user = self.users.create(workspace.id, &owner).await?;
        self.rows
            .lock()
            .unwrap()
            .insert(workspace.id, workspace.clone());
        Ok((workspace, user))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Workspace>, AppError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn change_name(&self, id: Uuid, company_name: &str) -> Result<Option<Workspace>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.get_mut(&id).map(|w| {
            w.company_name = company_name.to_owned();
            w.clone()
        }))
    }
}

/// Guarda as mensagens em vez de enviá-las.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<TemplateMail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<TemplateMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: TemplateMail) -> Result<(), AppError> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(anyhow::anyhow!("falha simulada no envio").into());
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// Grafo de dependências completo, montado só com peças em memória.
pub struct Fixture {
    pub workspace: Workspace,
    pub workspaces: Arc<MemoryWorkspaceStore>,
    pub users: Arc<MemoryUserStore>,
    pub mailer: Arc<RecordingMailer>,
    pub tokens: Arc<MemoryTokenStore>,
    pub invitations: InvitationService,
    pub user_service: UserService,
    pub sessions: SessionService,
    pub onboarding: OnboardingService,
    pub auth: AuthService,
}

impl Fixture {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::default());
        let workspaces = Arc::new(MemoryWorkspaceStore::with_users(users.clone()));
        let workspace = workspaces.insert("Acme");
        let mailer = Arc::new(RecordingMailer::default());
        let tokens = Arc::new(MemoryTokenStore::new("segredo-de-teste"));

        let invitations = InvitationService::new(tokens.clone());
        let user_service =
            UserService::new(users.clone(), tokens.clone()).with_password_cost(TEST_PASSWORD_COST);
        let sessions = SessionService::new(tokens.clone(), workspaces.clone(), DEFAULT_SESSION_TTL);
        let onboarding = OnboardingService::new(
            workspaces.clone(),
            invitations.clone(),
            user_service.clone(),
            sessions.clone(),
            mailer.clone(),
            "https://app.acme.com/convites".into(),
        );
        let auth = AuthService::new(
            user_service.clone(),
            sessions.clone(),
            mailer.clone(),
            "https://app.acme.com/reset".into(),
        );

        Self {
            workspace,
            workspaces,
            users,
            mailer,
            tokens,
            invitations,
            user_service,
            sessions,
            onboarding,
            auth,
        }
    }

    /// Sessão não assinada, só para chamadas diretas aos serviços.
    pub fn session(&self, role: Role) -> Session {
        Session {
            workspace_id: self.workspace.id,
            user_id: Uuid::new_v4(),
            role,
            company_name: self.workspace.company_name.clone(),
            session_key: String::new(),
            full_name: "Quem Convida".into(),
        }
    }

    /// Sessão emitida pelo token store, utilizável como Bearer.
    pub async fn signed_session(&self, role: Role) -> Session {
        let user = pending_user(self.workspace.id, &format!("{}@acme.com", role), role);
        self.sessions.create(&user).await.unwrap()
    }

    pub fn state(&self) -> AppState {
        // Conexão preguiçosa: os testes nunca tocam no banco
        let db_pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/onboarding_test")
            .unwrap();

        AppState {
            db_pool,
            workspaces: self.workspaces.clone(),
            invitation_service: self.invitations.clone(),
            onboarding_service: self.onboarding.clone(),
            session_service: self.sessions.clone(),
            auth_service: self.auth.clone(),
        }
    }
}
