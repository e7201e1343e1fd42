use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::repositories::auth_repository::RESET_TOKEN_TTL_MINUTES;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Writes mail to the log instead of delivering it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "mail (log delivery)");
        Ok(())
    }
}

/// POSTs mail as JSON to an HTTP relay.
pub struct WebhookMailer {
    client: Client,
    url: String,
}

impl WebhookMailer {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let resp = self.client.post(&self.url).json(mail).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "mail relay rejected message");
            return Err(Error::Internal(format!("mail relay returned {}", status)));
        }
        Ok(())
    }
}

pub fn mailer_from_config(config: &Config) -> Arc<dyn Mailer> {
    match config.mail_webhook_url.as_deref() {
        Some(url) => Arc::new(WebhookMailer::new(url.to_string())),
        None => Arc::new(LogMailer),
    }
}

/// Builds `{base}?token=…&email=…` with both values percent-encoded.
pub fn reset_link(base: &str, token: &str, email: &str) -> String {
    match reqwest::Url::parse_with_params(base, &[("token", token), ("email", email)]) {
        Ok(url) => url.to_string(),
        Err(err) => {
            tracing::warn!(base = %base, error = %err, "password reset url is not absolute");
            format!("{}?token={}&email={}", base, token, email)
        }
    }
}

#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    from: String,
    reset_url: String,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>, config: &Config) -> Self {
        Self {
            mailer,
            from: config.mail_from.clone(),
            reset_url: config.password_reset_url.clone(),
        }
    }

    pub fn password_reset_mail(&self, to: &str, full_name: &str, token: &str) -> OutgoingMail {
        let link = reset_link(&self.reset_url, token, to);
        OutgoingMail {
            from: self.from.clone(),
            to: to.to_string(),
            subject: "Reset your password".to_string(),
            body: format!(
                "Hello {},\n\nWe received a request to reset your password. Open the link below to choose a new one:\n\n{}\n\nThe link is valid for {} minutes. If you did not request this, you can ignore this email.",
                full_name, link, RESET_TOKEN_TTL_MINUTES
            ),
        }
    }

    pub async fn send_password_reset(&self, to: &str, full_name: &str, token: &str) -> Result<()> {
        let mail = self.password_reset_mail(to, full_name, token);
        self.mailer.send(&mail).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::tests::test_config;

    #[test]
    fn reset_link_encodes_parameters() {
        let link = reset_link("http://localhost:3000/reset-password", "a+b/c", "jane@example.com");
        assert_eq!(
            link,
            "http://localhost:3000/reset-password?token=a%2Bb%2Fc&email=jane%40example.com"
        );
        let with_query = reset_link("http://app/reset?lang=en", "t", "x@y.z");
        assert!(with_query.starts_with("http://app/reset?lang=en&token=t"));
    }

    #[tokio::test]
    async fn password_reset_goes_through_mailer() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|mail| {
                mail.to == "jane@example.com"
                    && mail.from == "no-reply@job-board.local"
                    && mail.body.contains("token=tok123")
                    && mail.body.contains("15 minutes")
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = EmailService::new(Arc::new(mailer), &test_config());
        service
            .send_password_reset("jane@example.com", "Jane", "tok123")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mailer_failure_is_returned() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_| Err(Error::Internal("relay down".into())));
        let service = EmailService::new(Arc::new(mailer), &test_config());
        assert!(service
            .send_password_reset("jane@example.com", "Jane", "tok")
            .await
            .is_err());
    }
}
