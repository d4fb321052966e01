//! Mail transport capability

use async_trait::async_trait;
use tracing::{error, info};

#[cfg(test)]
use mockall::mock;

mod errors;
mod message;

pub use errors::MailerError;
pub use message::{DeliveryReceipt, Envelope, MailHeader, X_MAILER};

/// A transport able to deliver a fully assembled [`Envelope`].
///
/// Implementations are built once at startup and shared by every send; they
/// must tolerate concurrent use.
#[async_trait]
pub trait Mailer: Clone + Send + Sync + 'static {
    /// Submit an envelope for delivery.
    ///
    /// # Arguments
    /// * `envelope` - The assembled [`Envelope`] to send.
    ///
    /// # Returns
    /// - [`Ok`] with the provider's [`DeliveryReceipt`] if the relay accepted the message.
    /// - [`Err`] containing a [`MailerError`] otherwise.
    async fn send(&self, envelope: &Envelope) -> Result<DeliveryReceipt, MailerError>;

    /// Checks that the relay is reachable and accepts the configured credentials.
    async fn verify_connection(&self) -> Result<(), MailerError>;
}

#[cfg(test)]
mock! {
    pub Mailer {}

    impl Clone for Mailer {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl Mailer for Mailer {
        async fn send(&self, envelope: &Envelope) -> Result<DeliveryReceipt, MailerError>;
        async fn verify_connection(&self) -> Result<(), MailerError>;
    }
}

/// Runs the connectivity check once, logging the outcome.
///
/// A failure is reported but not fatal: later sends may still succeed, or
/// will surface their own errors to the caller.
pub async fn verify_on_startup<M: Mailer>(mailer: &M) -> bool {
    match mailer.verify_connection().await {
        Ok(()) => {
            info!("SMTP connection verified");
            true
        }
        Err(e) => {
            error!(error = %e, "SMTP connection check failed");
            false
        }
    }
}
