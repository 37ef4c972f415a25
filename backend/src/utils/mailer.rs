use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

/// A contact-form submission ready to be relayed to the site inbox.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMail {
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(String),
    #[error("failed to build email message: {0}")]
    Build(String),
    #[error("SMTP relay error: {0}")]
    Relay(String),
    #[error("SMTP send failed: {0}")]
    Send(String),
}

#[cfg_attr(test, mockall::automock)]
pub trait MailTransport: Send + Sync {
    fn send_contact(&self, mail: &ContactMail) -> Result<(), MailError>;
}

/// Relays contact mail through an SMTP submission endpoint (STARTTLS).
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: String,
    inbox: String,
}

impl SmtpMailer {
    /// Builds a mailer from `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`,
    /// `SMTP_PASSWORD` and `CONTACT_INBOX`. Returns `None` when the host or
    /// credentials are absent; the contact handler turns that into a clear
    /// 500 instead of failing silently mid-send.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;
        let username = std::env::var("SMTP_USERNAME").ok()?;
        let password = std::env::var("SMTP_PASSWORD").ok()?;
        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);
        let inbox = std::env::var("CONTACT_INBOX").unwrap_or_else(|_| username.clone());
        Some(Self {
            host,
            port,
            username,
            password,
            inbox,
        })
    }

    fn sender_mailbox(&self) -> Result<Mailbox, MailError> {
        format!("\"Contact form\" <{}>", self.username)
            .parse()
            .map_err(|_| MailError::Address(self.username.clone()))
    }
}

impl MailTransport for SmtpMailer {
    fn send_contact(&self, mail: &ContactMail) -> Result<(), MailError> {
        let reply_to: Mailbox = format!("\"{}\" <{}>", mail.sender_name, mail.sender_email)
            .parse()
            .or_else(|_| mail.sender_email.parse())
            .map_err(|_| MailError::Address(mail.sender_email.clone()))?;
        let to: Mailbox = self
            .inbox
            .parse()
            .map_err(|_| MailError::Address(self.inbox.clone()))?;

        let message = Message::builder()
            .from(self.sender_mailbox()?)
            .reply_to(reply_to)
            .to(to)
            .subject(mail.subject.clone())
            .body(mail.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))?;

        let creds = Credentials::new(self.username.clone(), self.password.clone());
        let mailer = SmtpTransport::starttls_relay(&self.host)
            .map_err(|e| MailError::Relay(e.to_string()))?
            .port(self.port)
            .credentials(creds)
            .build();

        tracing::info!("relaying contact mail via {}:{}", self.host, self.port);
        mailer
            .send(&message)
            .map(|_| ())
            .map_err(|e| MailError::Send(e.to_string()))
    }
}
