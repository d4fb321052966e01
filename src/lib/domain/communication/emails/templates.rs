//! Template rendering capability

use askama::Template;
use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

use crate::domain::communication::email_addresses::EmailAddress;

use super::{
    errors::RenderError,
    magic_link::{MagicLinkProps, MagicLinkTemplate},
    workspace_invitation::{WorkspaceInvitationProps, WorkspaceInvitationTemplate},
};

/// A rendered email body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedEmail {
    /// HTML body, with CSS inlined
    pub html: String,

    /// Plain text alternative
    pub plain: String,
}

/// Turns template props into email bodies
#[async_trait]
pub trait TemplateRenderer: Clone + Send + Sync + 'static {
    /// Renders the magic link email.
    ///
    /// # Arguments
    /// * `props` - The [`MagicLinkProps`] to render.
    ///
    /// # Returns
    /// - [`Ok`] with the [`RenderedEmail`] if successful.
    /// - [`Err`] containing a [`RenderError`] if the props are malformed or the template fails.
    async fn render_magic_link(&self, props: &MagicLinkProps) -> Result<RenderedEmail, RenderError>;

    /// Renders the workspace invitation email addressed to `to`.
    async fn render_workspace_invitation(
        &self,
        props: &WorkspaceInvitationProps,
        to: &EmailAddress,
    ) -> Result<RenderedEmail, RenderError>;
}

#[cfg(test)]
mock! {
    pub TemplateRenderer {}

    impl Clone for TemplateRenderer {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl TemplateRenderer for TemplateRenderer {
        async fn render_magic_link(&self, props: &MagicLinkProps) -> Result<RenderedEmail, RenderError>;
        async fn render_workspace_invitation(
            &self,
            props: &WorkspaceInvitationProps,
            to: &EmailAddress,
        ) -> Result<RenderedEmail, RenderError>;
    }
}

/// Renders the bundled askama templates
#[derive(Debug, Default, Clone)]
pub struct HtmlTemplateRenderer;

impl HtmlTemplateRenderer {
    /// Creates a new renderer
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TemplateRenderer for HtmlTemplateRenderer {
    async fn render_magic_link(&self, props: &MagicLinkProps) -> Result<RenderedEmail, RenderError> {
        let template = MagicLinkTemplate::new(props)?;

        Ok(RenderedEmail {
            html: css_inline::inline(&template.render()?)?,
            plain: template.render_plain(),
        })
    }

    async fn render_workspace_invitation(
        &self,
        props: &WorkspaceInvitationProps,
        to: &EmailAddress,
    ) -> Result<RenderedEmail, RenderError> {
        let template = WorkspaceInvitationTemplate::new(props, to)?;

        Ok(RenderedEmail {
            html: css_inline::inline(&template.render()?)?,
            plain: template.render_plain(),
        })
    }
}

/// Rejects links that a mail client could not open
pub(crate) fn require_http_url(field: &str, value: &str) -> Result<(), RenderError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(RenderError::InvalidProps(format!("{field} must not be empty")));
    }

    if !(value.starts_with("https://") || value.starts_with("http://")) {
        return Err(RenderError::InvalidProps(format!(
            "{field} must be an absolute http(s) URL"
        )));
    }

    Ok(())
}
