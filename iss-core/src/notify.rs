use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{
        self,
        authentication::Credentials,
        response::{Category, Code, Detail, Severity},
    },
};
use std::fmt::Debug;

use crate::{
    config::SmtpConfig,
    error::{Error, Result},
};

pub const SUBJECT: &str = "Hey!";
pub const BODY: &str = "Look up!";

#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    /// Send one "look up" message. No deduplication across calls.
    async fn notify(&self) -> Result<()>;
}

/// Mails the configured address to itself over a STARTTLS connection.
pub struct SmtpNotifier {
    mailbox: Mailbox,
    host: String,
    port: u16,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let mailbox: Mailbox = config
            .email
            .parse()
            .map_err(|e| Error::Config(format!("invalid email address '{}': {e}", config.email)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| Error::Config(format!("invalid SMTP relay '{}': {e}", config.host)))?
            .port(config.port)
            .credentials(Credentials::new(config.email.clone(), config.password.clone()))
            .build();

        Ok(Self { mailbox, host: config.host.clone(), port: config.port, transport })
    }
}

impl Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("mailbox", &self.mailbox.to_string())
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self) -> Result<()> {
        let message = build_message(&self.mailbox)?;

        self.transport.send(message).await.map_err(classify)?;
        tracing::info!(to = %self.mailbox, host = %self.host, "notification email sent");

        Ok(())
    }
}

/// The fixed plaintext notification, addressed from `mailbox` to itself.
pub fn build_message(mailbox: &Mailbox) -> Result<Message> {
    Message::builder()
        .from(mailbox.clone())
        .to(mailbox.clone())
        .subject(SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(BODY.to_string())
        .map_err(|e| Error::Config(format!("failed to build notification email: {e}")))
}

fn classify(err: smtp::Error) -> Error {
    if err.status().is_some_and(is_auth_rejection) { Error::Auth(err) } else { Error::Send(err) }
}

/// 530, 534 and 535: the server refused our credentials.
fn is_auth_rejection(code: Code) -> bool {
    matches!(
        (code.severity, code.category, code.detail),
        (
            Severity::PermanentNegativeCompletion,
            Category::Unspecified3,
            Detail::Zero | Detail::Four | Detail::Five
        )
    )
}
