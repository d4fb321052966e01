//! Transactional emails: templates, rendering and the send service

mod errors;
mod magic_link;
mod sender;
mod service;
mod templates;
mod workspace_invitation;

pub use errors::{EmailKind, RenderError, SendEmailError};
pub use magic_link::{MagicLinkProps, MagicLinkTemplate};
pub use sender::{SenderSettings, DEFAULT_SENDER_NAME};
pub use service::{EmailService, EmailServiceImpl};
pub use templates::{HtmlTemplateRenderer, RenderedEmail, TemplateRenderer};
pub use workspace_invitation::{WorkspaceInvitationProps, WorkspaceInvitationTemplate};
