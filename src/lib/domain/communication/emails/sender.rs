//! Sender identity

use crate::domain::communication::email_addresses::EmailAddress;

/// Display name used when none is configured
pub const DEFAULT_SENDER_NAME: &str = "Kaneo";

/// Who outgoing emails come from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenderSettings {
    /// The sender address, also used as reply-to
    pub address: EmailAddress,

    /// The sender display name
    pub name: Option<String>,

    /// Target of the `List-Unsubscribe` header, if any
    pub unsubscribe_url: Option<String>,
}

impl SenderSettings {
    /// Creates sender settings with no display name or unsubscribe link
    pub fn new(address: EmailAddress) -> Self {
        Self {
            address,
            name: None,
            unsubscribe_url: None,
        }
    }

    /// The configured display name, or [`DEFAULT_SENDER_NAME`]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SENDER_NAME)
    }
}
