//! Errors raised while rendering or sending transactional emails

use std::fmt;

use css_inline::InlineError;
use thiserror::Error;
use tracing::debug;

use crate::domain::communication::{email_addresses::EmailAddressError, mailer::MailerError};

/// The kinds of transactional email this crate sends
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmailKind {
    /// Passwordless sign-in link
    MagicLink,

    /// Invitation to join a workspace
    WorkspaceInvitation,
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MagicLink => write!(f, "magic link"),
            Self::WorkspaceInvitation => write!(f, "workspace invitation"),
        }
    }
}

/// Errors that can occur while rendering a template
#[derive(Debug, Error)]
pub enum RenderError {
    /// The props cannot produce a usable email
    #[error("invalid template props: {0}")]
    InvalidProps(String),

    /// The template engine failed
    #[error("template error: {0}")]
    TemplateError(String),

    /// CSS could not be inlined into the rendered HTML
    #[error("could not inline CSS: {0}")]
    InlineError(String),
}

impl From<askama::Error> for RenderError {
    fn from(err: askama::Error) -> Self {
        debug!("askama::Error -> RenderError");

        RenderError::TemplateError(err.to_string())
    }
}

impl From<InlineError> for RenderError {
    fn from(err: InlineError) -> Self {
        debug!("InlineError -> RenderError");

        RenderError::InlineError(err.to_string())
    }
}

/// Errors returned to callers of the send operations
#[derive(Debug, Error)]
pub enum SendEmailError {
    /// The recipient address is not usable
    #[error("invalid recipient {recipient:?}: {source}")]
    InvalidRecipient {
        /// The address as given by the caller
        recipient: String,

        /// Why it was rejected
        source: EmailAddressError,
    },

    /// The template could not be rendered; nothing was sent
    #[error("failed to render {kind} email for {recipient}: {message}")]
    Render {
        /// Which email was being rendered
        kind: EmailKind,

        /// The normalized recipient
        recipient: String,

        /// The root cause
        message: String,
    },

    /// The transport failed to deliver the message
    #[error("failed to send {kind} email to {recipient}: {message}")]
    Delivery {
        /// Which email was being sent
        kind: EmailKind,

        /// The normalized recipient
        recipient: String,

        /// The root cause
        message: String,
    },
}

impl SendEmailError {
    pub(crate) fn render(kind: EmailKind, recipient: &str, err: RenderError) -> Self {
        SendEmailError::Render {
            kind,
            recipient: recipient.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn delivery(kind: EmailKind, recipient: &str, err: MailerError) -> Self {
        SendEmailError::Delivery {
            kind,
            recipient: recipient.to_string(),
            message: err.to_string(),
        }
    }
}
