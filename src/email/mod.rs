//! Email notification delivery via SMTP.
//!
//! [`Mailer`] wraps lettre's async SMTP transport. It is only constructed when
//! `SMTP_HOST` is configured; otherwise notifications are logged and skipped.
//! Sends are fire-and-forget: a failed email never fails the request that
//! triggered it.

pub mod templates;

use std::sync::Arc;

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::config::Config;
pub use templates::EmailTemplate;

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),
}

/// Sends rendered templates through a shared SMTP connection pool.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    app_base_url: String,
}

impl Mailer {
    /// Build a mailer from config, or `None` when SMTP is not configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, EmailError> {
        let Some(host) = config.smtp_host.as_deref().filter(|h| !h.is_empty()) else {
            return Ok(None);
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Some(Self {
            transport: builder.build(),
            from: config.smtp_from.parse()?,
            app_base_url: config.app_base_url.clone(),
        }))
    }

    /// Render and send one email.
    pub async fn send(&self, to: &str, template: &EmailTemplate) -> Result<(), EmailError> {
        let rendered = template.render(&self.app_base_url);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(rendered.subject)
            .header(ContentType::TEXT_HTML)
            .body(rendered.html)?;

        self.transport.send(message).await?;

        tracing::info!(to, kind = template.kind(), "notification email sent");
        Ok(())
    }
}

/// Send `template` to `to` in the background.
///
/// Does nothing but log when no mailer is configured.
pub fn notify(mailer: Option<Arc<Mailer>>, to: String, template: EmailTemplate) {
    let Some(mailer) = mailer else {
        tracing::debug!(to = %to, kind = template.kind(), "SMTP not configured, email skipped");
        return;
    };

    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, &template).await {
            tracing::error!(to = %to, kind = template.kind(), error = %e, "failed to send email");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_smtp(host: Option<&str>) -> Config {
        let mut vars = vec![
            ("DATABASE_URL".to_string(), "postgres://localhost/x".to_string()),
            ("CSRF_SECRET".to_string(), "secret".to_string()),
        ];
        if let Some(host) = host {
            vars.push(("SMTP_HOST".to_string(), host.to_string()));
        }
        envy::from_iter(vars).unwrap()
    }

    #[test]
    fn mailer_is_disabled_without_smtp_host() {
        let config = config_with_smtp(None);
        assert!(Mailer::from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn mailer_is_built_when_smtp_host_set() {
        let config = config_with_smtp(Some("smtp.example.com"));
        assert!(Mailer::from_config(&config).unwrap().is_some());
    }

    #[test]
    fn email_error_display_address() {
        let addr_err: Result<lettre::Address, _> = "not-an-email".parse();
        let err = EmailError::Address(addr_err.unwrap_err());
        assert!(err.to_string().contains("Email address parse error"));
    }
}
