// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedSession,
    models::auth::{Role, Session},
};

/// 1. O Trait que define uma capacidade: quais papéis podem exercê-la.
/// É sempre uma lista de permissão, nunca de negação.
pub trait Capability: Send + Sync + 'static {
    fn name() -> &'static str;
    fn allows(role: Role) -> bool;
}

/// 2. O Extractor (Guardião). Roda antes do corpo ser lido, então uma
/// recusa não deixa nenhum efeito colateral.
pub struct RequireCapability<T>(pub Session, pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireCapability<T>
where
    T: Capability,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai a sessão colocada pelo auth_guard
        let AuthenticatedSession(session) = parts
            .extensions
            .get::<AuthenticatedSession>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;

        // B. Confere o papel
        if !T::allows(session.role) {
            tracing::warn!(
                "Usuário {} ({}) tentou '{}' sem permissão",
                session.user_id,
                session.role,
                T::name()
            );
            return Err(AppError::Forbidden(session.role));
        }

        Ok(RequireCapability(session, PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS CAPACIDADES (TIPOS)
// ---

pub struct InviteMembers;
impl Capability for InviteMembers {
    fn name() -> &'static str { "invitations:write" }
    fn allows(role: Role) -> bool { role.can_invite() }
}

pub struct ManageWorkspace;
impl Capability for ManageWorkspace {
    fn name() -> &'static str { "workspace:write" }
    fn allows(role: Role) -> bool { matches!(role, Role::Owner | Role::Admin) }
}
