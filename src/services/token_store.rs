// src/services/token_store.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::{sync::RwLock, time::Instant};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    // Desconhecido, expirado, revogado ou com assinatura inválida
    #[error("token não encontrado")]
    NotFound,

    #[error("payload inválido: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("falha ao assinar o token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("TTL fora do intervalo: {0:?}")]
    TtlOutOfRange(Duration),
}

// Prazo absoluto a partir de agora; um TTL gigante não pode estourar o relógio
fn deadline(now: Instant, ttl: Duration) -> Result<Instant, TokenError> {
    now.checked_add(ttl).ok_or(TokenError::TtlOutOfRange(ttl))
}

/// Armazenamento de blobs com expiração, indexado pelo token opaco e,
/// secundariamente, pela chave do "dono" (ex: o e-mail).
///
/// Cada chave guarda no máximo um token vivo: comissionar de novo
/// invalida o anterior.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn commission(
        &self,
        ttl: Duration,
        subject: &str,
        payload: Value,
    ) -> Result<String, TokenError>;

    /// Lê o payload sem alterar a expiração.
    async fn peek(&self, token: &str) -> Result<Value, TokenError>;

    /// Lê o payload e redefine o tempo restante para `ttl` (absoluto, não soma).
    async fn extend(&self, token: &str, ttl: Duration) -> Result<Value, TokenError>;

    /// Invalida o token vivo da chave. Idempotente.
    async fn revoke(&self, subject: &str) -> Result<(), TokenError>;
}

// Versões tipadas, para os serviços não lidarem com `Value`
impl dyn TokenStore {
    pub async fn commission_as<T: Serialize + Sync>(
        &self,
        ttl: Duration,
        subject: &str,
        payload: &T,
    ) -> Result<String, TokenError> {
        let value = serde_json::to_value(payload)?;
        self.commission(ttl, subject, value).await
    }

    pub async fn peek_as<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        Ok(serde_json::from_value(self.peek(token).await?)?)
    }

    pub async fn extend_as<T: DeserializeOwned>(
        &self,
        token: &str,
        ttl: Duration,
    ) -> Result<T, TokenError> {
        Ok(serde_json::from_value(self.extend(token, ttl).await?)?)
    }
}

/// Convites, sessões e resets são todos indexados pelo e-mail; o prefixo
/// separa os usos para um não derrubar o token do outro.
pub fn subject_key(purpose: &str, email: &str) -> String {
    format!("{}:{}", purpose, email)
}

// O que vai assinado dentro do token entregue ao cliente
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    jti: Uuid,   // ID da entrada no store
    sub: String, // Chave do dono
    iat: i64,
}

struct Entry {
    subject: String,
    payload: Value,
    expires_at: Instant,
}

#[derive(Default)]
struct Entries {
    by_id: HashMap<Uuid, Entry>,
    by_subject: HashMap<String, Uuid>,
}

impl Entries {
    fn remove(&mut self, id: Uuid) {
        if let Some(entry) = self.by_id.remove(&id) {
            if self.by_subject.get(&entry.subject) == Some(&id) {
                self.by_subject.remove(&entry.subject);
            }
        }
    }
}

/// Token store em memória: um mapa indexado por TTL atrás de um `RwLock`.
/// Os tokens são JWTs HS256 que carregam só o ID da entrada; a expiração
/// fica do lado do servidor para que `extend` possa redefini-la.
#[derive(Clone)]
pub struct MemoryTokenStore {
    entries: Arc<RwLock<Entries>>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl MemoryTokenStore {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }

    fn entry_id(&self, token: &str) -> Result<Uuid, TokenError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.jti)
            .map_err(|_| TokenError::NotFound)
    }

    /// Remove as entradas vencidas. Retorna quantas foram removidas.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let expired: Vec<Uuid> = entries
            .by_id
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            entries.remove(*id);
        }
        expired.len()
    }

    /// Limpeza periódica em segundo plano, iniciada no `main`.
    pub fn spawn_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let purged = store.purge_expired().await;
                if purged > 0 {
                    tracing::debug!("🧹 {} tokens expirados removidos", purged);
                }
            }
        })
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn commission(
        &self,
        ttl: Duration,
        subject: &str,
        payload: Value,
    ) -> Result<String, TokenError> {
        let expires_at = deadline(Instant::now(), ttl)?;
        let id = Uuid::new_v4();
        let claims = TokenClaims {
            jti: id,
            sub: subject.to_owned(),
            iat: Utc::now().timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        let mut entries = self.entries.write().await;
        if let Some(previous) = entries.by_subject.insert(subject.to_owned(), id) {
            entries.by_id.remove(&previous);
        }
        entries.by_id.insert(
            id,
            Entry {
                subject: subject.to_owned(),
                payload,
                expires_at,
            },
        );

        Ok(token)
    }

    async fn peek(&self, token: &str) -> Result<Value, TokenError> {
        let id = self.entry_id(token)?;
        let entries = self.entries.read().await;

        entries
            .by_id
            .get(&id)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.payload.clone())
            .ok_or(TokenError::NotFound)
    }

    async fn extend(&self, token: &str, ttl: Duration) -> Result<Value, TokenError> {
        let id = self.entry_id(token)?;
        let now = Instant::now();
        let new_deadline = deadline(now, ttl)?;
        let mut entries = self.entries.write().await;

        let expired = match entries.by_id.get_mut(&id) {
            Some(entry) if entry.expires_at > now => {
                entry.expires_at = new_deadline;
                return Ok(entry.payload.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(id);
        }
        Err(TokenError::NotFound)
    }

    async fn revoke(&self, subject: &str) -> Result<(), TokenError> {
        let mut entries = self.entries.write().await;
        if let Some(id) = entries.by_subject.remove(subject) {
            entries.by_id.remove(&id);
        }
        Ok(())
    }
}
