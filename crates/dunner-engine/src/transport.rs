// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mail transport implementations.
//!
//! `SmtpMailer` is the production path over lettre's async SMTP client.
//! `LogTransport` is the dry-run path for local development without a
//! relay. `MockTransport` is the in-memory capture double used across the
//! engine and gateway test suites.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use dunner_config::SmtpConfig;
use dunner_core::error::DunnerError;
use dunner_core::traits::MailTransport;
use dunner_core::types::EmailMessage;

/// Production SMTP delivery via lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build a mailer from config. Port 465-style implicit TLS and
    /// STARTTLS are both supported; credentials are optional for
    /// unauthenticated relays.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, DunnerError> {
        let mut builder = if config.implicit_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| DunnerError::Transport {
            message: format!("invalid smtp relay {}", config.host),
            source: Some(Box::new(e)),
        })?
        .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    fn build_message(message: &EmailMessage) -> Result<Message, DunnerError> {
        let from: Mailbox = message.from.parse().map_err(|e| DunnerError::Transport {
            message: format!("invalid from address {}", message.from),
            source: Some(Box::new(e)),
        })?;
        let to: Mailbox = message.to.parse().map_err(|e| DunnerError::Transport {
            message: format!("invalid recipient address {}", message.to),
            source: Some(Box::new(e)),
        })?;
        Message::builder()
            .from(from)
            .to(to)
            .subject(&message.subject)
            .body(message.body.clone())
            .map_err(|e| DunnerError::Transport {
                message: "failed to assemble message".to_string(),
                source: Some(Box::new(e)),
            })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, message: &EmailMessage) -> Result<(), DunnerError> {
        let email = Self::build_message(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| DunnerError::Transport {
                message: format!("smtp delivery to {} failed", message.to),
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }
}

/// Dry-run transport: logs the message instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, message: &EmailMessage) -> Result<(), DunnerError> {
        info!(
            to = message.to.as_str(),
            subject = message.subject.as_str(),
            "dry-run email (not delivered)"
        );
        Ok(())
    }
}

/// In-memory capture transport for tests.
///
/// Records every delivered message and fails deliveries to addresses
/// registered via [`MockTransport::fail_for`].
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: std::sync::Mutex<Vec<EmailMessage>>,
    failing: std::sync::Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subsequent deliveries to `address` will fail.
    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().push(address.to_string());
    }

    /// Messages delivered so far, in delivery order.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn deliver(&self, message: &EmailMessage) -> Result<(), DunnerError> {
        if self.failing.lock().unwrap().contains(&message.to) {
            return Err(DunnerError::transport(format!(
                "mock failure for {}",
                message.to
            )));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
