#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Command-line tool for sending Kaneo's transactional emails

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{ArgAction, Parser, Subcommand};
use kaneo_mailer::{
    domain::communication::{
        emails::{
            EmailService, EmailServiceImpl, HtmlTemplateRenderer, MagicLinkProps,
            WorkspaceInvitationProps,
        },
        mailer::{verify_on_startup, DeliveryReceipt},
    },
    infrastructure::email::smtp::{SMTPConfig, SMTPMailer},
};
use tracing_subscriber::EnvFilter;

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
#[command(name = "mailer", about = "Send Kaneo's transactional emails over SMTP")]
pub struct Args {
    /// The SMTP configuration
    #[clap(flatten)]
    pub smtp: SMTPConfig,

    /// Log every step of the SMTP exchange
    #[arg(long, env = "DEBUG_EMAIL", default_value_t = false, action = ArgAction::Set)]
    pub debug_email: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Mailer commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the SMTP server accepts the configured credentials
    Verify,

    /// Send a magic link sign-in email
    MagicLink {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Subject line
        #[arg(long, default_value = "Sign in to Kaneo")]
        subject: String,

        /// Sign-in URL
        #[arg(long)]
        url: String,

        /// Recipient's name
        #[arg(long)]
        name: Option<String>,

        /// Minutes until the link expires
        #[arg(long)]
        expires_in_minutes: Option<i64>,
    },

    /// Send a workspace invitation email
    Invite {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// Workspace name
        #[arg(long)]
        workspace: String,

        /// Name of the inviting member
        #[arg(long)]
        inviter_name: String,

        /// Address of the inviting member
        #[arg(long)]
        inviter_email: Option<String>,

        /// Invitation acceptance URL
        #[arg(long)]
        url: String,
    },
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter = if args.debug_email {
        EnvFilter::new("info,kaneo_mailer=debug,lettre=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mailer = Arc::new(SMTPMailer::new(&args.smtp)?);
    let verified = verify_on_startup(mailer.as_ref()).await;

    let service = EmailServiceImpl::new(
        Arc::new(HtmlTemplateRenderer::new()),
        mailer,
        args.smtp.sender_settings()?,
    );

    let receipt = match args.command {
        Command::Verify => {
            if !verified {
                bail!("SMTP connection check failed");
            }

            return Ok(());
        }
        Command::MagicLink {
            to,
            subject,
            url,
            name,
            expires_in_minutes,
        } => {
            let props = MagicLinkProps {
                url,
                name,
                expires_at: expires_in_minutes
                    .map(|minutes| expires_at(Utc::now(), minutes))
                    .transpose()?,
            };

            service.send_magic_link_email(&to, &subject, &props).await?
        }
        Command::Invite {
            to,
            subject,
            workspace,
            inviter_name,
            inviter_email,
            url,
        } => {
            let props = WorkspaceInvitationProps {
                workspace_name: workspace,
                inviter_name,
                inviter_email,
                invitation_link: url,
            };

            service
                .send_workspace_invitation_email(&to, &subject, &props)
                .await?
        }
    };

    print_receipt(&receipt)
}

fn expires_at(now: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>> {
    match TimeDelta::try_minutes(minutes).and_then(|delta| now.checked_add_signed(delta)) {
        Some(at) => Ok(at),
        None => bail!("--expires-in-minutes {minutes} is out of range"),
    }
}

fn print_receipt(receipt: &DeliveryReceipt) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(receipt)?);

    Ok(())
}
