// src/services/notification.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    models::{
        auth::{ResetToken, User},
        invitation::Invitation,
    },
};

// Templates que o serviço de e-mail conhece
pub const TEMPLATE_INVITATION: &str = "invitation";
pub const TEMPLATE_PASSWORD_RESET: &str = "password-reset";
const KNOWN_TEMPLATES: [&str; 2] = [TEMPLATE_INVITATION, TEMPLATE_PASSWORD_RESET];

// Identidade do remetente: lida uma vez no início do processo
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub sender_name: String,
    pub postmaster_email: String,
    pub notify_email: String,
}

// Qual caixa de saída usar; o endereço real vem do `MailerConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Postmaster,
    Notify,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailAddress {
    pub name: String,
    pub email: String,
}

impl MailerConfig {
    pub fn address(&self, sender: Sender) -> MailAddress {
        let email = match sender {
            Sender::Postmaster => &self.postmaster_email,
            Sender::Notify => &self.notify_email,
        };
        MailAddress {
            name: self.sender_name.clone(),
            email: email.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateMail {
    pub sender: Sender,
    pub subject: String,
    pub receiver_name: String,
    pub receiver_email: String,
    pub template: &'static str,
    pub data: Value,
}

impl TemplateMail {
    // "Nome <email>", ou só o e-mail quando ainda não há nome (convites)
    pub fn recipient(&self) -> String {
        if self.receiver_name.is_empty() {
            self.receiver_email.clone()
        } else {
            format!("{} <{}>", self.receiver_name, self.receiver_email)
        }
    }
}

/// Gateway de notificação. A entrega é síncrona: uma falha aqui aborta o fluxo
/// que a chamou, sem desfazer o que já foi gravado.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: TemplateMail) -> Result<(), AppError>;
}

/// Mailer padrão: valida o template e registra o envio no log.
pub struct LogMailer {
    config: MailerConfig,
}

impl LogMailer {
    pub fn new(config: MailerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: TemplateMail) -> Result<(), AppError> {
        if !KNOWN_TEMPLATES.contains(&mail.template) {
            return Err(anyhow::anyhow!("template com a chave \"{}\" não existe", mail.template).into());
        }

        let from = self.config.address(mail.sender);
        tracing::info!(
            from = %from.email,
            to = %mail.recipient(),
            template = mail.template,
            "📧 {}",
            mail.subject
        );
        // Os dados do template carregam tokens: só em debug
        tracing::debug!(template = mail.template, data = %mail.data, "Dados do e-mail");
        Ok(())
    }
}

// Convites de colegas saem do postmaster; o do dono, no cadastro, do notify
pub async fn send_invitation(
    mailer: &dyn Mailer,
    sender: Sender,
    route: &str,
    invitation: &Invitation,
) -> Result<(), AppError> {
    mailer
        .send(TemplateMail {
            sender,
            subject: format!("Invitation to {}", invitation.company_name),
            receiver_name: String::new(),
            receiver_email: invitation.email.clone(),
            template: TEMPLATE_INVITATION,
            data: json!({
                "route": route,
                "token": invitation.token,
                "companyName": invitation.company_name,
            }),
        })
        .await
}

pub async fn send_reset_token(
    mailer: &dyn Mailer,
    route: &str,
    token: &ResetToken,
    user: &User,
) -> Result<(), AppError> {
    mailer
        .send(TemplateMail {
            sender: Sender::Postmaster,
            subject: "Reset your password".to_string(),
            receiver_name: user.full_name(),
            receiver_email: user.email.clone(),
            template: TEMPLATE_PASSWORD_RESET,
            data: json!({
                "route": route,
                "token": token.key,
                "expires": expiry_label(token.expires_at, Utc::now()),
                "firstName": user.first_name,
            }),
        })
        .await
}

// Ex: "3:04 pm today" / "9:15 am tomorrow"
fn expiry_label(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let day = if expires_at.date_naive() == now.date_naive() {
        "today"
    } else {
        "tomorrow"
    };
    format!("{} {}", expires_at.format("%-I:%M %P"), day)
}
