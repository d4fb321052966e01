//! Mailer errors

use thiserror::Error;

/// Mailer errors
#[derive(Debug, Error)]
pub enum MailerError {
    /// The relay could not be reached, negotiated with or authenticated against
    #[error("could not connect to the SMTP server: {0}")]
    ConnectionError(String),

    /// An address in the envelope could not be used
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The message could not be assembled
    #[error("could not build the message: {0}")]
    InvalidMessage(String),

    /// The relay rejected the message
    #[error("the SMTP server rejected the message: {0}")]
    SendError(String),
}
