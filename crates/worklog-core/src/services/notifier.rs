//! Outbound notifications: email to report owners, Slack webhook to
//! the team channel.
//!
//! Both channels are best-effort. Failures are logged and reported as
//! `false`; they never abort the operation that triggered them.

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use worklog_common::config::{SlackConfig, SmtpConfig};

/// Notification service.
#[derive(Clone)]
pub struct NotifierService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
    webhook_url: Option<String>,
    http: reqwest::Client,
}

impl NotifierService {
    /// Build a notifier from configuration.
    ///
    /// Without an SMTP host the email channel runs in log-only mode:
    /// messages are written to the log and counted as delivered, which
    /// keeps local development working without a mail server. Without
    /// a webhook URL the Slack channel is a silent no-op.
    #[must_use]
    pub fn new(smtp: &SmtpConfig, slack: &SlackConfig) -> Self {
        let transport = smtp.host.as_deref().and_then(|host| {
            let builder = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(builder) => builder.port(smtp.port),
                Err(e) => {
                    tracing::warn!(error = %e, host, "Invalid SMTP relay, email disabled");
                    return None;
                }
            };
            let builder = match (smtp.username.clone(), smtp.password.clone()) {
                (Some(username), Some(password)) => {
                    builder.credentials(Credentials::new(username, password))
                }
                _ => builder,
            };
            Some(builder.build())
        });

        Self {
            transport,
            from: smtp.from.clone(),
            webhook_url: slack.webhook_url.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// A notifier with both channels disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from: "worklog@localhost".to_string(),
            webhook_url: None,
            http: reqwest::Client::new(),
        }
    }

    /// Send a plain-text email. Returns whether delivery succeeded.
    pub async fn send_email(&self, to: &str, subject: &str, body: &str) -> bool {
        let Some(transport) = &self.transport else {
            tracing::info!(to, subject, "SMTP not configured, logging email instead");
            return true;
        };

        let message = Message::builder()
            .from(match self.from.parse() {
                Ok(from) => from,
                Err(e) => {
                    tracing::warn!(error = %e, from = %self.from, "Invalid sender address");
                    return false;
                }
            })
            .to(match to.parse() {
                Ok(to) => to,
                Err(e) => {
                    tracing::warn!(error = %e, to, "Invalid recipient address");
                    return false;
                }
            })
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string());

        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, to, "Failed to build email");
                return false;
            }
        };

        match transport.send(message).await {
            Ok(_) => {
                tracing::debug!(to, subject, "Email sent");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, to, "Failed to send email");
                false
            }
        }
    }

    /// Post a message to the Slack webhook. Returns whether the post
    /// succeeded; an unconfigured webhook counts as a silent no-op.
    pub async fn send_slack(&self, text: &str) -> bool {
        let Some(url) = &self.webhook_url else {
            return false;
        };

        let payload = serde_json::json!({ "text": text });
        match self.http.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Slack webhook refused message");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to reach Slack webhook");
                false
            }
        }
    }
}
