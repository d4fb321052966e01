//! Workspace invitation email

use askama::Template;

use crate::domain::communication::email_addresses::EmailAddress;

use super::{errors::RenderError, templates::require_http_url};

/// Data needed to render the workspace invitation email
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceInvitationProps {
    /// Name of the workspace the recipient is invited to
    pub workspace_name: String,

    /// Name of the member who sent the invitation
    pub inviter_name: String,

    /// Address of the member who sent the invitation
    pub inviter_email: Option<String>,

    /// Link to accept the invitation
    pub invitation_link: String,
}

/// Workspace invitation email template
#[derive(Debug, Template)]
#[template(path = "emails/workspace_invitation.html")]
pub struct WorkspaceInvitationTemplate {
    /// Name of the workspace
    pub workspace_name: String,

    /// Who sent the invitation
    pub inviter: String,

    /// Link to accept the invitation
    pub link: String,

    /// Address the invitation was sent to
    pub to: String,
}

impl WorkspaceInvitationTemplate {
    /// Creates a new `WorkspaceInvitationTemplate` for `to`
    pub fn new(props: &WorkspaceInvitationProps, to: &EmailAddress) -> Result<Self, RenderError> {
        require_http_url("invitation_link", &props.invitation_link)?;

        let workspace_name = props.workspace_name.trim();
        if workspace_name.is_empty() {
            return Err(RenderError::InvalidProps(
                "workspace_name must not be empty".to_string(),
            ));
        }

        let inviter_name = props.inviter_name.trim();
        let inviter = match props.inviter_email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() && !inviter_name.is_empty() => {
                format!("{inviter_name} ({email})")
            }
            Some(email) if !email.is_empty() => email.to_string(),
            _ if !inviter_name.is_empty() => inviter_name.to_string(),
            _ => "A teammate".to_string(),
        };

        Ok(Self {
            workspace_name: workspace_name.to_string(),
            inviter,
            link: props.invitation_link.trim().to_string(),
            to: to.to_string(),
        })
    }

    /// Renders the plain text version of the email
    pub fn render_plain(&self) -> String {
        format!(
            "{inviter} has invited you to join the {workspace} workspace on Kaneo.\n\n\
             Accept the invitation: {link}\n\n\
             This invitation was intended for {to}. If you were not expecting it, you can ignore this email.\n",
            inviter = self.inviter,
            workspace = self.workspace_name,
            link = self.link,
            to = self.to,
        )
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn props() -> WorkspaceInvitationProps {
        WorkspaceInvitationProps {
            workspace_name: "Platform".to_string(),
            inviter_name: "Grace".to_string(),
            inviter_email: Some("grace@kaneo.app".to_string()),
            invitation_link: "https://kaneo.app/invitations/42".to_string(),
        }
    }

    fn to() -> EmailAddress {
        EmailAddress::new_unchecked("user@test.com")
    }

    #[test]
    fn test_inviter_includes_email() -> TestResult {
        let template = WorkspaceInvitationTemplate::new(&props(), &to())?;

        assert_eq!(template.inviter, "Grace (grace@kaneo.app)");
        assert_eq!(template.to, "user@test.com");

        Ok(())
    }

    #[test]
    fn test_inviter_falls_back_to_name() -> TestResult {
        let template = WorkspaceInvitationTemplate::new(
            &WorkspaceInvitationProps {
                inviter_email: None,
                ..props()
            },
            &to(),
        )?;

        assert_eq!(template.inviter, "Grace");

        Ok(())
    }

    #[test]
    fn test_empty_workspace_name_is_invalid() {
        let result = WorkspaceInvitationTemplate::new(
            &WorkspaceInvitationProps {
                workspace_name: " ".to_string(),
                ..props()
            },
            &to(),
        );

        assert!(matches!(result, Err(RenderError::InvalidProps(_))));
    }

    #[test]
    fn test_plain_text_mentions_workspace_and_link() -> TestResult {
        let plain = WorkspaceInvitationTemplate::new(&props(), &to())?.render_plain();

        assert!(plain.contains("join the Platform workspace"));
        assert!(plain.contains("https://kaneo.app/invitations/42"));
        assert!(plain.contains("intended for user@test.com"));

        Ok(())
    }

    #[test]
    fn test_html_escapes_workspace_name() -> TestResult {
        let template = WorkspaceInvitationTemplate::new(
            &WorkspaceInvitationProps {
                workspace_name: "<script>".to_string(),
                ..props()
            },
            &to(),
        )?;

        let html = template.render()?;

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));

        Ok(())
    }
}
