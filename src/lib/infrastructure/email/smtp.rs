//! SMTP mailer implementation

use async_trait::async_trait;
use clap::{ArgAction, Parser};
use lettre::{
    address::AddressError,
    message::{
        header::{ContentTransferEncoding, ContentType, HeaderName, HeaderValue},
        Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{Tls, TlsParameters},
        extension::ClientId,
        response::Response,
    },
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;
use uuid::Uuid;

use crate::domain::communication::{
    email_addresses::{EmailAddress, EmailAddressError},
    emails::SenderSettings,
    mailer::{DeliveryReceipt, Envelope, Mailer, MailerError},
};

/// SMTP configuration
#[derive(Clone, Default, Debug, Parser)]
pub struct SMTPConfig {
    /// The SMTP host
    #[clap(long = "smtp-host", env = "SMTP_HOST")]
    pub host: String,

    /// The SMTP port
    #[clap(long = "smtp-port", env = "SMTP_PORT")]
    pub port: u16,

    /// Use implicit TLS; when unset, port 465 implies it
    #[clap(long = "smtp-secure", env = "SMTP_SECURE", action = ArgAction::Set)]
    pub secure: Option<bool>,

    /// The SMTP username
    #[clap(long = "smtp-user", env = "SMTP_USER")]
    pub username: String,

    /// The SMTP password
    #[clap(long = "smtp-password", env = "SMTP_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// The sender email address
    #[clap(long = "smtp-from", env = "SMTP_FROM")]
    pub from: String,

    /// The sender display name
    #[clap(long = "smtp-from-name", env = "SMTP_FROM_NAME")]
    pub from_name: Option<String>,

    /// Reject invalid or self-signed TLS certificates
    #[clap(
        long = "smtp-tls-reject-unauthorized",
        env = "SMTP_TLS_REJECT_UNAUTHORIZED",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub tls_reject_unauthorized: bool,

    /// Hostname announced in EHLO; defaults to the SMTP host
    #[clap(long = "smtp-hostname", env = "SMTP_HOSTNAME")]
    pub hostname: Option<String>,

    /// Target of the List-Unsubscribe header
    #[clap(long = "smtp-unsubscribe-url", env = "SMTP_UNSUBSCRIBE_URL")]
    pub unsubscribe_url: Option<String>,
}

impl SMTPConfig {
    /// Whether the connection uses implicit TLS rather than STARTTLS
    pub fn is_secure(&self) -> bool {
        self.secure.unwrap_or(self.port == 465)
    }

    /// The hostname announced to the relay
    ///
    /// Strict relays reject the `localhost` fallback, so this is never left
    /// to the library default.
    pub fn ehlo_hostname(&self) -> &str {
        self.hostname
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.host)
    }

    /// The sender identity described by this configuration
    pub fn sender_settings(&self) -> Result<SenderSettings, EmailAddressError> {
        Ok(SenderSettings {
            address: EmailAddress::new(&self.from)?,
            name: self.from_name.clone(),
            unsubscribe_url: self.unsubscribe_url.clone(),
        })
    }
}

/// SMTP mailer
///
/// Holds one pooled transport; clones share it.
#[derive(Clone)]
pub struct SMTPMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    hostname: String,
}

impl std::fmt::Debug for SMTPMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SMTPMailer")
            .field("hostname", &self.hostname)
            .finish_non_exhaustive()
    }
}

impl SMTPMailer {
    /// Configures the SMTP transport. No connection is opened.
    pub fn new(config: &SMTPConfig) -> Result<Self, MailerError> {
        let tls_parameters = TlsParameters::builder(config.host.clone())
            .dangerous_accept_invalid_certs(!config.tls_reject_unauthorized)
            .dangerous_accept_invalid_hostnames(!config.tls_reject_unauthorized)
            .build()?;

        let tls = if config.is_secure() {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let hostname = config.ehlo_hostname().to_string();

        debug!(
            host = %config.host,
            port = config.port,
            secure = config.is_secure(),
            hostname = %hostname,
            "configuring SMTP transport"
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .authentication(vec![Mechanism::Login, Mechanism::Plain])
            .hello_name(ClientId::Domain(hostname.clone()))
            .build();

        Ok(Self {
            transport,
            hostname,
        })
    }

    fn message(&self, envelope: &Envelope) -> Result<(String, Message), MailerError> {
        let message_id = format!("<{}@{}>", Uuid::now_v7(), self.hostname);

        let mut builder = Message::builder()
            .message_id(Some(message_id.clone()))
            .from(Mailbox::new(
                Some(envelope.from_name.clone()),
                address(&envelope.from)?,
            ))
            .reply_to(Mailbox::new(None, address(&envelope.reply_to)?))
            .to(Mailbox::new(None, address(&envelope.to)?))
            .subject(envelope.subject.clone());

        for header in &envelope.headers {
            let name = HeaderName::new_from_ascii(header.name.to_string())
                .map_err(|e| MailerError::InvalidMessage(format!("{}: {e}", header.name)))?;

            builder = builder.raw_header(HeaderValue::new(name, header.value.clone()));
        }

        let message = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .header(ContentTransferEncoding::Base64)
                        .body(envelope.plain_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .header(ContentTransferEncoding::Base64)
                        .body(envelope.html_body.clone()),
                ),
        )?;

        Ok((message_id, message))
    }
}

#[async_trait]
impl Mailer for SMTPMailer {
    async fn send(&self, envelope: &Envelope) -> Result<DeliveryReceipt, MailerError> {
        let (message_id, message) = self.message(envelope)?;

        let response = self.transport.send(message).await?;

        Ok(DeliveryReceipt {
            message_id,
            response: response_text(&response),
        })
    }

    async fn verify_connection(&self) -> Result<(), MailerError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(MailerError::ConnectionError(
                "the SMTP server did not accept the connection".to_string(),
            ))
        }
    }
}

fn address(email: &EmailAddress) -> Result<Address, MailerError> {
    Ok(email.as_str().parse::<Address>()?)
}

fn response_text(response: &Response) -> String {
    let mut text = response.code().to_string();

    for line in response.message() {
        text.push(' ');
        text.push_str(line);
    }

    text
}

impl From<AddressError> for MailerError {
    fn from(err: AddressError) -> Self {
        MailerError::InvalidEmail(err.to_string())
    }
}

impl From<lettre::error::Error> for MailerError {
    fn from(err: lettre::error::Error) -> Self {
        MailerError::InvalidMessage(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for MailerError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        if err.is_permanent() || err.is_transient() {
            MailerError::SendError(err.to_string())
        } else {
            MailerError::ConnectionError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use lettre::transport::smtp::response::{Category, Code, Detail, Severity};
    use testresult::TestResult;

    use crate::domain::communication::mailer::MailHeader;

    use super::*;

    fn config() -> SMTPConfig {
        SMTPConfig {
            host: "smtp.kaneo.app".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "secret".to_string(),
            from: "noreply@kaneo.app".to_string(),
            ..SMTPConfig::default()
        }
    }

    fn envelope() -> Envelope {
        Envelope {
            from_name: "Kaneo".to_string(),
            from: EmailAddress::new_unchecked("noreply@kaneo.app"),
            reply_to: EmailAddress::new_unchecked("noreply@kaneo.app"),
            to: EmailAddress::new_unchecked("user@test.com"),
            subject: "Sign in".to_string(),
            html_body: "<p>Sign in</p>".to_string(),
            plain_body: "Sign in".to_string(),
            headers: MailHeader::bulk(),
        }
    }

    #[test]
    fn test_secure_follows_port_convention() {
        assert!(!config().is_secure());
        assert!(SMTPConfig {
            port: 465,
            ..config()
        }
        .is_secure());
        assert!(!SMTPConfig {
            port: 465,
            secure: Some(false),
            ..config()
        }
        .is_secure());
    }

    #[test]
    fn test_ehlo_hostname_defaults_to_host() {
        assert_eq!(config().ehlo_hostname(), "smtp.kaneo.app");
        assert_eq!(
            SMTPConfig {
                hostname: Some("mail.kaneo.app".to_string()),
                ..config()
            }
            .ehlo_hostname(),
            "mail.kaneo.app"
        );
    }

    #[test]
    fn test_parse_config_from_args() -> TestResult {
        let config = SMTPConfig::try_parse_from([
            "mailer",
            "--smtp-host",
            "smtp.kaneo.app",
            "--smtp-port",
            "465",
            "--smtp-user",
            "mailer",
            "--smtp-password",
            "secret",
            "--smtp-from",
            "noreply@kaneo.app",
            "--smtp-tls-reject-unauthorized",
            "true",
        ])?;

        assert_eq!(config.port, 465);
        assert!(config.is_secure());
        assert!(config.tls_reject_unauthorized);

        Ok(())
    }

    #[test]
    fn test_sender_settings() -> TestResult {
        let sender = config().sender_settings()?;

        assert_eq!(sender.address.as_str(), "noreply@kaneo.app");
        assert_eq!(sender.display_name(), "Kaneo");

        Ok(())
    }

    #[test]
    fn test_sender_settings_rejects_invalid_from() {
        let result = SMTPConfig {
            from: String::new(),
            ..config()
        }
        .sender_settings();

        assert_eq!(result.unwrap_err(), EmailAddressError::EmptyEmailAddress);
    }

    #[tokio::test]
    async fn test_message_carries_envelope_fields() -> TestResult {
        let mailer = SMTPMailer::new(&config())?;

        let (message_id, message) = mailer.message(&envelope())?;
        let formatted = String::from_utf8(message.formatted())?;

        assert!(message_id.ends_with("@smtp.kaneo.app>"));
        assert!(formatted.contains(&format!("Message-ID: {message_id}")));
        assert!(formatted
            .lines()
            .any(|l| l.starts_with("From: ") && l.contains("Kaneo") && l.contains("noreply@kaneo.app")));
        assert!(formatted
            .lines()
            .any(|l| l.starts_with("Reply-To: ") && l.contains("noreply@kaneo.app")));
        assert!(formatted
            .lines()
            .any(|l| l.starts_with("To: ") && l.contains("user@test.com")));
        assert!(formatted.contains("Subject: Sign in"));
        assert!(formatted.contains("X-Mailer: Kaneo/2.0"));
        assert!(formatted.contains("Precedence: bulk"));
        assert!(formatted.contains("Content-Transfer-Encoding: base64"));

        Ok(())
    }

    #[tokio::test]
    async fn test_message_rejects_invalid_recipient() -> TestResult {
        let mailer = SMTPMailer::new(&config())?;

        let result = mailer.message(&Envelope {
            to: EmailAddress::new_unchecked("not an address"),
            ..envelope()
        });

        assert!(matches!(result, Err(MailerError::InvalidEmail(_))));

        Ok(())
    }

    #[test]
    fn test_response_text_joins_code_and_lines() {
        let response = Response::new(
            Code::new(
                Severity::PositiveCompletion,
                Category::MailSystem,
                Detail::Zero,
            ),
            vec!["2.0.0 Ok: queued as 4XyZ1".to_string()],
        );

        assert_eq!(response_text(&response), "250 2.0.0 Ok: queued as 4XyZ1");
    }

    #[test]
    fn test_response_text_multiline() {
        let response = Response::new(
            Code::new(
                Severity::PositiveCompletion,
                Category::MailSystem,
                Detail::Zero,
            ),
            vec!["2.0.0 Ok".to_string(), "queued".to_string()],
        );

        assert_eq!(response_text(&response), "250 2.0.0 Ok queued");
    }

    #[tokio::test]
    async fn test_refused_connection_maps_to_connection_error() -> TestResult {
        let mailer = SMTPMailer::new(&SMTPConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..config()
        })?;

        let result = mailer.verify_connection().await;

        assert!(matches!(result, Err(MailerError::ConnectionError(_))));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_to_refused_connection_is_not_a_rejection() -> TestResult {
        let mailer = SMTPMailer::new(&SMTPConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..config()
        })?;

        let result = mailer.send(&envelope()).await;

        assert!(matches!(result, Err(MailerError::ConnectionError(_))));

        Ok(())
    }
}
