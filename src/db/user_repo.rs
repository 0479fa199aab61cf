use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{NewMember, Profile, User},
};

// Nomes das constraints de unicidade (ver migrations/)
const EMAIL_CONSTRAINT: &str = "users_email_key";
const PHONE_CONSTRAINT: &str = "users_phone_key";

/// Persistência dos membros. A unicidade de e-mail e telefone é garantida
/// pelo banco, então duas inscrições concorrentes não sobrescrevem uma à outra:
/// a perdedora recebe o erro de duplicidade.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insere uma linha pendente (sem senha).
    async fn create(&self, workspace_id: Uuid, member: &NewMember) -> Result<User, AppError>;

    /// Insere todas as linhas numa única transação: um e-mail repetido desfaz o lote inteiro.
    async fn create_many(
        &self,
        workspace_id: Uuid,
        members: &[NewMember],
    ) -> Result<Vec<User>, AppError>;

    /// Atualiza nome, telefone e senha da linha com este e-mail.
    async fn register(&self, email: &str, profile: &Profile) -> Result<User, AppError>;

    /// `None` quando não há linha com este id dentro do workspace.
    async fn update_password(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

// Converte violação de chave única no erro de domínio certo
pub(crate) fn map_unique_violation(e: sqlx::Error, duplicate_email: impl FnOnce() -> AppError) -> AppError {
    let violated = e
        .as_database_error()
        .filter(|db_err| db_err.is_unique_violation())
        .map(|db_err| db_err.constraint().unwrap_or_default().to_owned());

    match violated.as_deref() {
        Some(PHONE_CONSTRAINT) => AppError::DuplicatePhone,
        Some(EMAIL_CONSTRAINT) | Some("") => duplicate_email(),
        Some(other) => {
            tracing::warn!("Violação de unicidade inesperada: {}", other);
            AppError::DatabaseError(e)
        }
        None => AppError::DatabaseError(e),
    }
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn insert_pending<'e, E>(
        executor: E,
        workspace_id: Uuid,
        member: &NewMember,
    ) -> Result<User, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, role, workspace_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&member.email)
        .bind(member.role)
        .bind(workspace_id)
        .fetch_one(executor)
        .await
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, workspace_id: Uuid, member: &NewMember) -> Result<User, AppError> {
        Self::insert_pending(&self.pool, workspace_id, member)
            .await
            .map_err(|e| map_unique_violation(e, || AppError::DuplicateEmail(member.email.clone())))
    }

    async fn create_many(
        &self,
        workspace_id: Uuid,
        members: &[NewMember],
    ) -> Result<Vec<User>, AppError> {
        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let mut users = Vec::with_capacity(members.len());
        for member in members {
            // Se falhar aqui, o tx sofre rollback automático ao sair do escopo (drop)
            let user = Self::insert_pending(&mut *tx, workspace_id, member)
                .await
                .map_err(|e| {
                    map_unique_violation(e, || AppError::DuplicateEmail("Um dos usuários".into()))
                })?;
            users.push(user);
        }

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        Ok(users)
    }

    async fn register(&self, email: &str, profile: &Profile) -> Result<User, AppError> {
        // Um único UPDATE: se o telefone colidir, nenhum campo é gravado.
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = $1, last_name = $2, phone = $3, password_hash = $4
            WHERE email = $5
            RETURNING *
            "#,
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.password_hash)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::DuplicateEmail(email.to_owned())))?
        .ok_or(AppError::NotFoundRow)
    }

    async fn update_password(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET password_hash = $1 WHERE id = $2 AND workspace_id = $3 RETURNING *",
        )
        .bind(password_hash)
        .bind(user_id)
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // Busca um usuário pelo seu e-mail
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}
