//! Email envelope and delivery receipt

use serde::Serialize;

use crate::domain::communication::email_addresses::EmailAddress;

/// Value of the `X-Mailer` header on every outgoing message
pub const X_MAILER: &str = "Kaneo/2.0";

/// A single custom mail header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailHeader {
    /// Header name
    pub name: &'static str,

    /// Raw header value
    pub value: String,
}

impl MailHeader {
    /// Creates a new header
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    /// Headers sent with every message so strict relays treat it as
    /// ordinary bulk mail.
    pub fn bulk() -> Vec<Self> {
        vec![
            Self::new("X-Mailer", X_MAILER),
            Self::new("X-Priority", "3 (Normal)"),
            Self::new("Importance", "Normal"),
            Self::new("X-MSMail-Priority", "Normal"),
            Self::new("Precedence", "bulk"),
        ]
    }
}

/// A fully assembled message, ready to be handed to a transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Display name of the sender
    pub from_name: String,

    /// The sender's address
    pub from: EmailAddress,

    /// Where replies go
    pub reply_to: EmailAddress,

    /// The recipient, always lower-cased
    pub to: EmailAddress,

    /// The subject of the email
    pub subject: String,

    /// The HTML body of the email
    pub html_body: String,

    /// The plain text body of the email
    pub plain_body: String,

    /// Extra headers
    pub headers: Vec<MailHeader>,
}

impl Envelope {
    /// The `From` field as `"Name" <address>`
    pub fn from_mailbox(&self) -> String {
        format!("\"{}\" <{}>", self.from_name, self.from)
    }

    /// Looks up a custom header by name, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// The relay's confirmation of a successful send
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    /// The `Message-ID` of the submitted message
    pub message_id: String,

    /// The raw SMTP response, e.g. `250 2.0.0 Ok: queued`
    pub response: String,
}
