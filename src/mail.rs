//! Login link delivery.
//!
//! The mailer only transports the link. It never validates tokens.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;

use crate::{OrganizerError, SecretString};

pub const LOGIN_SUBJECT: &str = "Login to organizer";

/// The emailed sign-in link, `{base_url}auth?token={token}`.
#[derive(Clone)]
pub struct LoginLink {
    url: SecretString,
}

impl LoginLink {
    pub fn new(base_url: &str, token: &SecretString) -> Self {
        let separator = if base_url.ends_with('/') { "" } else { "/" };
        Self {
            url: SecretString::new(format!(
                "{base_url}{separator}auth?token={}",
                token.expose_secret()
            )),
        }
    }

    pub fn url(&self) -> &SecretString {
        &self.url
    }

    /// Plain-text mail body.
    pub fn body(&self, valid_for: Duration) -> String {
        format!(
            "Login requested\n\n\
             Somebody has requested to login using your email.\n\
             If that wasn't you, you can ignore this email.\n\n\
             Use the following link {} to sign in.\n\n\
             This link is single-use only and will expire after {} minutes.\n",
            self.url.expose_secret(),
            valid_for.num_minutes()
        )
    }
}

impl std::fmt::Debug for LoginLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LoginLink([REDACTED])")
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the login link for `token` to `to`.
    async fn send(&self, to: &str, token: &SecretString, base_url: &str)
    -> Result<(), OrganizerError>;
}

#[async_trait]
impl<M: Mailer + Send + Sync + ?Sized> Mailer for Arc<M> {
    async fn send(
        &self,
        to: &str,
        token: &SecretString,
        base_url: &str,
    ) -> Result<(), OrganizerError> {
        (**self).send(to, token, base_url).await
    }
}

/// Writes the link to the log instead of sending mail.
///
/// Development only: anyone who can read the logs can log in.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        to: &str,
        token: &SecretString,
        base_url: &str,
    ) -> Result<(), OrganizerError> {
        let link = LoginLink::new(base_url, token);
        log::info!(target: "organizer", "msg=\"login link\", to=\"{to}\", link=\"{}\"", link.url().expose_secret());
        Ok(())
    }
}

/// A mail captured by [`MockMailer`].
#[cfg(any(test, feature = "mocks"))]
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub token: SecretString,
    pub link: LoginLink,
}

/// Records sent links. Set `fail` to simulate a relay outage.
#[cfg(any(test, feature = "mocks"))]
#[derive(Debug, Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<std::sync::Mutex<Vec<SentMail>>>,
    pub fail: bool,
}

#[cfg(any(test, feature = "mocks"))]
impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn last(&self) -> Option<SentMail> {
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}

#[cfg(any(test, feature = "mocks"))]
#[async_trait]
impl Mailer for MockMailer {
    async fn send(
        &self,
        to: &str,
        token: &SecretString,
        base_url: &str,
    ) -> Result<(), OrganizerError> {
        if self.fail {
            return Err(OrganizerError::MailError("relay unavailable".to_owned()));
        }
        self.sent
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(SentMail {
                to: to.to_owned(),
                token: token.clone(),
                link: LoginLink::new(base_url, token),
            });
        Ok(())
    }
}

#[cfg(feature = "smtp")]
pub use smtp::SmtpMailer;

#[cfg(feature = "smtp")]
mod smtp {
    use async_trait::async_trait;
    use chrono::Duration;
    use lettre::message::Mailbox;
    use lettre::message::header::ContentType;
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

    use super::{LOGIN_SUBJECT, LoginLink, Mailer};
    use crate::config::MailConfig;
    use crate::{OrganizerError, SecretString};

    fn mail_error(operation: &'static str) -> impl Fn(String) -> OrganizerError {
        move |e| {
            log::error!(target: "organizer", "msg=\"mail error\", operation=\"{operation}\", error=\"{e}\"");
            OrganizerError::MailError(e)
        }
    }

    /// Sends login links over SMTP with STARTTLS.
    #[derive(Clone)]
    pub struct SmtpMailer {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        sender: Mailbox,
        valid_for: Duration,
    }

    impl SmtpMailer {
        /// `valid_for` is the login expiry quoted in the mail body.
        ///
        /// # Errors
        ///
        /// Returns `OrganizerError::ConfigurationError` if the relay host or
        /// the sender address is invalid.
        pub fn new(config: &MailConfig, valid_for: Duration) -> Result<Self, OrganizerError> {
            let sender = config.sender.parse::<Mailbox>().map_err(|e| {
                OrganizerError::ConfigurationError(format!("invalid MAIL_SENDER: {e}"))
            })?;
            let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| OrganizerError::ConfigurationError(format!("invalid MAIL_HOST: {e}")))?
                .port(config.port)
                .credentials(Credentials::new(
                    config.username.clone(),
                    config.password.expose_secret().to_owned(),
                ))
                .build();

            Ok(Self {
                transport,
                sender,
                valid_for,
            })
        }
    }

    #[async_trait]
    impl Mailer for SmtpMailer {
        #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
        async fn send(
            &self,
            to: &str,
            token: &SecretString,
            base_url: &str,
        ) -> Result<(), OrganizerError> {
            let recipient = to
                .parse::<Mailbox>()
                .map_err(|e| OrganizerError::BadRequest(format!("invalid recipient: {e}")))?;
            let link = LoginLink::new(base_url, token);

            let message = Message::builder()
                .from(self.sender.clone())
                .to(recipient)
                .subject(LOGIN_SUBJECT)
                .header(ContentType::TEXT_PLAIN)
                .body(link.body(self.valid_for))
                .map_err(|e| mail_error("build_message")(e.to_string()))?;

            self.transport
                .send(message)
                .await
                .map_err(|e| mail_error("send")(e.to_string()))?;

            log::debug!(target: "organizer", "msg=\"login link sent\"");
            Ok(())
        }
    }
}
