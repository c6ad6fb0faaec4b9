use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::scan_types::{CampsiteRow, NotificationError, ScanError};

/// Trait for secret store implementations
#[async_trait::async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the named secrets in one request, decrypted.
    ///
    /// Names that do not exist are simply absent from the returned map.
    async fn get_secrets(&self, names: &[String]) -> Result<HashMap<String, String>, ScanError>;
}

/// Trait for SMS service implementations
#[async_trait::async_trait]
pub trait SmsService: Send + Sync {
    /// Send one message and return the provider's message id
    async fn send_sms(
        &self,
        account: &SmsAccount,
        to: &str,
        message: &str,
    ) -> Result<String, NotificationError>;
}

/// Messaging provider credentials resolved from the secret store
#[derive(Clone)]
pub struct SmsAccount {
    /// Provider account identifier
    pub account_sid: String,
    /// Provider auth token
    pub auth_token: String,
    /// Sender phone number
    pub from_number: String,
}

impl std::fmt::Debug for SmsAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsAccount")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_number", &self.from_number)
            .finish()
    }
}

/// Names of the four secrets the dispatcher needs
#[derive(Debug, Clone)]
pub struct SecretNames {
    /// Account identifier secret
    pub account_sid: String,
    /// Auth token secret
    pub auth_token: String,
    /// Sender number secret
    pub from_number: String,
    /// Comma-separated recipient list secret
    pub recipients: String,
}

impl SecretNames {
    /// Standard names under a deployment prefix (e.g. `napali_`)
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            account_sid: format!("{prefix}TWILIO_ACCOUNT_SID"),
            auth_token: format!("{prefix}TWILIO_AUTH_TOKEN"),
            from_number: format!("{prefix}TWILIO_PHONE_NUMBER"),
            recipients: format!("{prefix}RECIPIENT_NUMBERS"),
        }
    }

    fn all(&self) -> Vec<String> {
        vec![
            self.account_sid.clone(),
            self.auth_token.clone(),
            self.from_number.clone(),
            self.recipients.clone(),
        ]
    }
}

/// Build the alert text for the days that have permits.
///
/// Returns `None` when no day has availability.
pub fn compose_message(row: &CampsiteRow, trail_name: &str, claim_url: &str) -> Option<String> {
    let lines: Vec<String> = row
        .available_days()
        .map(|record| {
            format!(
                "- {}: {} permit{}",
                record.date,
                record.available,
                if record.available == 1 { "" } else { "s" }
            )
        })
        .collect();

    if lines.is_empty() {
        return None;
    }

    Some(format!(
        "Beep-boop. Some availability has changed on the {} trail.\n\n{}\n\nYou can claim a permit here: {}",
        trail_name,
        lines.join("\n"),
        claim_url
    ))
}

/// Sends alerts to the configured recipients, one at a time
pub struct NotificationDispatcher {
    secret_store: Arc<dyn SecretStore>,
    sms_service: Arc<dyn SmsService>,
    secret_names: SecretNames,
}

impl NotificationDispatcher {
    /// Create a dispatcher reading credentials from `secret_store`
    pub fn new(
        secret_store: Arc<dyn SecretStore>,
        sms_service: Arc<dyn SmsService>,
        secret_names: SecretNames,
    ) -> Self {
        Self {
            secret_store,
            sms_service,
            secret_names,
        }
    }

    /// Send `message` to every recipient and return how many were messaged.
    ///
    /// Recipients are messaged in list order. A failed send does not stop the
    /// rest; all failures are returned together as [`ScanError::Dispatch`].
    pub async fn dispatch(&self, message: &str) -> Result<usize, ScanError> {
        info!("Sending message: {}", message);

        let (account, recipients) = self.load_credentials().await?;

        let mut failures = Vec::new();
        for recipient in &recipients {
            match self.sms_service.send_sms(&account, recipient, message).await {
                Ok(external_id) => {
                    info!("SMS sent successfully to {} ({})", recipient, external_id);
                }
                Err(e) => {
                    error!("Failed to send SMS to {}: {}", recipient, e);
                    failures.push(format!("{recipient}: {e}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(recipients.len())
        } else {
            Err(ScanError::Dispatch {
                failed: failures.len(),
                attempted: recipients.len(),
                details: failures.join("; "),
            })
        }
    }

    /// Resolve provider credentials and the recipient list
    async fn load_credentials(&self) -> Result<(SmsAccount, Vec<String>), ScanError> {
        let secrets = self.secret_store.get_secrets(&self.secret_names.all()).await?;

        let find = |name: &str| {
            secrets
                .get(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    ScanError::Configuration(format!("Failed to find messaging secret {name}"))
                })
        };

        let account = SmsAccount {
            account_sid: find(&self.secret_names.account_sid)?,
            auth_token: find(&self.secret_names.auth_token)?,
            from_number: find(&self.secret_names.from_number)?,
        };

        let recipients: Vec<String> = find(&self.secret_names.recipients)?
            .split(',')
            .map(str::trim)
            .filter(|number| !number.is_empty())
            .map(str::to_string)
            .collect();

        if recipients.is_empty() {
            return Err(ScanError::Configuration(format!(
                "{} does not list any recipients",
                self.secret_names.recipients
            )));
        }

        Ok((account, recipients))
    }
}
