// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{UserRepository, WorkspaceRepository, WorkspaceStore},
    services::{
        auth::AuthService,
        invitation_service::InvitationService,
        notification::{LogMailer, Mailer, MailerConfig},
        onboarding_service::OnboardingService,
        session_service::{SessionService, DEFAULT_SESSION_TTL},
        token_store::TokenStore,
        user_service::UserService,
    },
};

// Valores lidos do ambiente (ou do .env) na inicialização
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub port: u16,
    pub session_ttl: Duration,
    // Página do front que recebe o token do convite
    pub client_user_page: String,
    pub client_reset_page: String,
    pub mailer: MailerConfig,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} deve ser definida", key))
}

fn optional<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} tem um valor inválido: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

// Sessões duram entre 1 minuto e 30 dias
const MIN_SESSION_TTL_SECS: u64 = 60;
const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

fn session_ttl(secs: u64) -> anyhow::Result<Duration> {
    if !(MIN_SESSION_TTL_SECS..=MAX_SESSION_TTL_SECS).contains(&secs) {
        anyhow::bail!(
            "SESSION_TTL_SECS deve estar entre {} e {}, recebido {}",
            MIN_SESSION_TTL_SECS,
            MAX_SESSION_TTL_SECS,
            secs
        );
    }
    Ok(Duration::from_secs(secs))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let session_ttl = session_ttl(optional("SESSION_TTL_SECS", DEFAULT_SESSION_TTL.as_secs())?)?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: optional("DB_MAX_CONNECTIONS", 5)?,
            jwt_secret: required("JWT_SECRET")?,
            port: optional("PORT", 3000)?,
            session_ttl,
            client_user_page: required("CLIENT_USER_PAGE")?,
            client_reset_page: required("CLIENT_RESET_PAGE")?,
            mailer: MailerConfig {
                sender_name: required("MAIL_SENDER")?,
                postmaster_email: required("POSTMASTER_EMAIL")?,
                notify_email: required("NOTIFY_EMAIL")?,
            },
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub workspaces: Arc<dyn WorkspaceStore>,
    pub invitation_service: InvitationService,
    pub onboarding_service: OnboardingService,
    pub session_service: SessionService,
    pub auth_service: AuthService,
}

impl AppState {
    pub async fn new(config: &Config, tokens: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let users = Arc::new(UserRepository::new(db_pool.clone()));
        let workspaces: Arc<dyn WorkspaceStore> = Arc::new(WorkspaceRepository::new(db_pool.clone()));
        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(config.mailer.clone()));

        let invitation_service = InvitationService::new(tokens.clone());
        let user_service = UserService::new(users, tokens.clone());
        let session_service = SessionService::new(tokens, workspaces.clone(), config.session_ttl);
        let onboarding_service = OnboardingService::new(
            workspaces.clone(),
            invitation_service.clone(),
            user_service.clone(),
            session_service.clone(),
            mailer.clone(),
            config.client_user_page.clone(),
        );
        let auth_service = AuthService::new(
            user_service,
            session_service.clone(),
            mailer,
            config.client_reset_page.clone(),
        );

        Ok(Self {
            db_pool,
            workspaces,
            invitation_service,
            onboarding_service,
            session_service,
            auth_service,
        })
    }
}
