// src/db/workspace_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::user_repo::{map_unique_violation, UserRepository},
    models::{
        auth::{NewMember, Role, User},
        workspace::Workspace,
    },
};

#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// Cria o workspace e o dono pendente na mesma transação. Um e-mail já
    /// cadastrado desfaz as duas escritas.
    async fn create_with_owner(
        &self,
        company_name: &str,
        email: &str,
    ) -> Result<(Workspace, User), AppError>;

    /// `None` se o workspace não existir.
    async fn get(&self, id: Uuid) -> Result<Option<Workspace>, AppError>;

    async fn change_name(&self, id: Uuid, company_name: &str) -> Result<Option<Workspace>, AppError>;
}

#[derive(Clone)]
pub struct WorkspaceRepository {
    pool: PgPool,
}

impl WorkspaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkspaceStore for WorkspaceRepository {
    async fn create_with_owner(
        &self,
        company_name: &str,
        email: &str,
    ) -> Result<(Workspace, User), AppError> {
        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let workspace = sqlx::query_as::<_, Workspace>(
            "INSERT INTO workspaces (company_name, email) VALUES ($1, $2) RETURNING *",
        )
        .bind(company_name)
        .bind(email)
        .fetch_one(&mut *tx)
        .await?;

        let owner = NewMember {
            email: email.to_owned(),
            role: Role::Owner,
        };
        // Se falhar aqui, o workspace também sofre rollback (drop do tx)
        let user = UserRepository::insert_pending(&mut *tx, workspace.id, &owner)
            .await
            .map_err(|e| map_unique_violation(e, || AppError::DuplicateEmail(email.to_owned())))?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        Ok((workspace, user))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Workspace>, AppError> {
        let workspace = sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(workspace)
    }

    async fn change_name(&self, id: Uuid, company_name: &str) -> Result<Option<Workspace>, AppError> {
        let workspace = sqlx::query_as::<_, Workspace>(
            "UPDATE workspaces SET company_name = $1 WHERE id = $2 RETURNING *",
        )
        .bind(company_name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(workspace)
    }
}
