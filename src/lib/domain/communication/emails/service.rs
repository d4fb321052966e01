//! Transactional email service

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::communication::{
    email_addresses::EmailAddress,
    mailer::{DeliveryReceipt, Envelope, MailHeader, Mailer},
};

use super::{
    errors::{EmailKind, SendEmailError},
    magic_link::MagicLinkProps,
    sender::SenderSettings,
    templates::{RenderedEmail, TemplateRenderer},
    workspace_invitation::WorkspaceInvitationProps,
};

/// Sends the transactional emails
#[async_trait]
pub trait EmailService: Clone + Send + Sync + 'static {
    /// Sends a magic link sign-in email.
    ///
    /// # Arguments
    /// * `to` - The recipient's address. It is lower-cased before sending.
    /// * `subject` - The subject of the email.
    /// * `props` - The [`MagicLinkProps`] to render.
    ///
    /// # Returns
    /// - [`Ok`] with the relay's [`DeliveryReceipt`] if the email was accepted.
    /// - [`Err`] containing a [`SendEmailError`] if it could not be rendered or sent.
    async fn send_magic_link_email(
        &self,
        to: &str,
        subject: &str,
        props: &MagicLinkProps,
    ) -> Result<DeliveryReceipt, SendEmailError>;

    /// Sends a workspace invitation email.
    ///
    /// Same contract as [`EmailService::send_magic_link_email`].
    async fn send_workspace_invitation_email(
        &self,
        to: &str,
        subject: &str,
        props: &WorkspaceInvitationProps,
    ) -> Result<DeliveryReceipt, SendEmailError>;
}

/// Email service implementation
#[derive(Debug, Clone)]
pub struct EmailServiceImpl<R, M>
where
    R: TemplateRenderer,
    M: Mailer,
{
    renderer: Arc<R>,
    mailer: Arc<M>,
    sender: SenderSettings,
}

impl<R, M> EmailServiceImpl<R, M>
where
    R: TemplateRenderer,
    M: Mailer,
{
    /// Creates a new email service.
    pub fn new(renderer: Arc<R>, mailer: Arc<M>, sender: SenderSettings) -> Self {
        Self {
            renderer,
            mailer,
            sender,
        }
    }

    fn recipient(to: &str) -> Result<EmailAddress, SendEmailError> {
        EmailAddress::new(to)
            .map(|address| address.to_lowercase())
            .map_err(|source| SendEmailError::InvalidRecipient {
                recipient: to.to_string(),
                source,
            })
    }

    fn envelope(&self, to: EmailAddress, subject: &str, rendered: RenderedEmail) -> Envelope {
        let mut headers = MailHeader::bulk();

        if let Some(url) = &self.sender.unsubscribe_url {
            headers.push(MailHeader::new("List-Unsubscribe", format!("<{url}>")));
        }

        Envelope {
            from_name: self.sender.display_name().to_string(),
            from: self.sender.address.clone(),
            reply_to: self.sender.address.clone(),
            to,
            subject: subject.to_string(),
            html_body: rendered.html,
            plain_body: rendered.plain,
            headers,
        }
    }

    async fn deliver(
        &self,
        kind: EmailKind,
        to: EmailAddress,
        subject: &str,
        rendered: RenderedEmail,
    ) -> Result<DeliveryReceipt, SendEmailError> {
        let envelope = self.envelope(to, subject, rendered);

        debug!(
            from = %envelope.from_mailbox(),
            to = %envelope.to,
            subject = %envelope.subject,
            "sending {kind} email"
        );

        match self.mailer.send(&envelope).await {
            Ok(receipt) => {
                info!(
                    to = %envelope.to,
                    message_id = %receipt.message_id,
                    response = %receipt.response,
                    "{kind} email sent"
                );

                Ok(receipt)
            }
            Err(e) => {
                error!(to = %envelope.to, error = %e, "failed to send {kind} email");

                Err(SendEmailError::delivery(kind, envelope.to.as_str(), e))
            }
        }
    }
}

#[async_trait]
impl<R, M> EmailService for EmailServiceImpl<R, M>
where
    R: TemplateRenderer,
    M: Mailer,
{
    async fn send_magic_link_email(
        &self,
        to: &str,
        subject: &str,
        props: &MagicLinkProps,
    ) -> Result<DeliveryReceipt, SendEmailError> {
        let kind = EmailKind::MagicLink;
        let recipient = Self::recipient(to)?;

        debug!(to = %recipient, "rendering {kind} email");

        let rendered = self
            .renderer
            .render_magic_link(props)
            .await
            .map_err(|e| {
                error!(to = %recipient, error = %e, "failed to render {kind} email");
                SendEmailError::render(kind, recipient.as_str(), e)
            })?;

        self.deliver(kind, recipient, subject, rendered).await
    }

    async fn send_workspace_invitation_email(
        &self,
        to: &str,
        subject: &str,
        props: &WorkspaceInvitationProps,
    ) -> Result<DeliveryReceipt, SendEmailError> {
        let kind = EmailKind::WorkspaceInvitation;
        let recipient = Self::recipient(to)?;

        debug!(to = %recipient, "rendering {kind} email");

        let rendered = self
            .renderer
            .render_workspace_invitation(props, &recipient)
            .await
            .map_err(|e| {
                error!(to = %recipient, error = %e, "failed to render {kind} email");
                SendEmailError::render(kind, recipient.as_str(), e)
            })?;

        self.deliver(kind, recipient, subject, rendered).await
    }
}
