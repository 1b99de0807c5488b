//! SMTP email sender built on lettre
//!
//! Verification and reset links go out through this; when no SMTP host is
//! configured the link is logged instead, which keeps development and test
//! environments mail-free.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use shared_error::ApiError;

/// SMTP configuration
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
    pub from_name: String,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }
}

/// Email content with both HTML and plain text versions
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Email sending abstraction
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), ApiError>;

    fn is_available(&self) -> bool;
}

/// SMTP sender; logs instead of sending when unconfigured
pub struct SmtpEmailSender {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpEmailSender {
    pub fn new(config: SmtpConfig) -> Result<Self, ApiError> {
        let transport = if config.is_configured() {
            let mut builder =
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| ApiError::internal(format!("smtp transport: {}", e)))?
                    .port(config.port);

            if let (Some(username), Some(password)) = (&config.username, &config.password) {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            Some(builder.build())
        } else {
            None
        };

        Ok(Self { config, transport })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), ApiError> {
        let Some(transport) = &self.transport else {
            tracing::info!(
                to = %message.to,
                subject = %message.subject,
                body = %message.text_body,
                "SMTP not configured, logging email instead"
            );
            return Ok(());
        };

        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| ApiError::internal(format!("invalid from address: {}", e)))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| ApiError::internal(format!("invalid recipient address: {}", e)))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html_body),
                    ),
            )
            .map_err(|e| ApiError::internal(format!("failed to build email: {}", e)))?;

        transport
            .send(email)
            .await
            .map_err(|e| ApiError::internal(format!("failed to send email: {}", e)))?;

        Ok(())
    }

    fn is_available(&self) -> bool {
        self.transport.is_some()
    }
}
