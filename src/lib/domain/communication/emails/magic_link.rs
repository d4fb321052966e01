//! Magic link sign-in email

use askama::Template;
use chrono::{DateTime, Utc};

use super::{errors::RenderError, templates::require_http_url};

/// Data needed to render the magic link email
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MagicLinkProps {
    /// The single-use sign-in URL
    pub url: String,

    /// The recipient's name, if known
    pub name: Option<String>,

    /// When the link stops working
    pub expires_at: Option<DateTime<Utc>>,
}

/// Magic link email template
#[derive(Debug, Template)]
#[template(path = "emails/magic_link.html")]
pub struct MagicLinkTemplate {
    /// How the recipient is greeted
    pub greeting: String,

    /// Link to sign in
    pub link: String,

    /// Human-readable expiry, if the link expires
    pub expiry: Option<String>,
}

impl MagicLinkTemplate {
    /// Creates a new `MagicLinkTemplate`, rejecting props without a usable link
    pub fn new(props: &MagicLinkProps) -> Result<Self, RenderError> {
        require_http_url("url", &props.url)?;

        let greeting = match props.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("Hi {name},"),
            _ => "Hi,".to_string(),
        };

        Ok(Self {
            greeting,
            link: props.url.trim().to_string(),
            expiry: props
                .expires_at
                .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string()),
        })
    }

    /// Renders the plain text version of the email
    pub fn render_plain(&self) -> String {
        let mut plain = format!(
            "{greeting}\n\nUse the following link to sign in to Kaneo: {link}\n",
            greeting = self.greeting,
            link = self.link
        );

        if let Some(expiry) = &self.expiry {
            plain.push_str(&format!("\nThis link expires at {expiry}.\n"));
        }

        plain.push_str("\nIf you didn't request this email, you can safely ignore it.\n");

        plain
    }
}
