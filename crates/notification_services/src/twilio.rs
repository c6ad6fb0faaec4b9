use std::time::Duration;

use async_trait::async_trait;
use permit_scan::{NotificationError, SmsAccount, SmsService};
use reqwest::Client;
use serde::Deserialize;

/// Public Twilio REST API host.
pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// SMS service that sends through the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioSmsService {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorResponse {
    message: String,
    code: Option<i64>,
}

impl TwilioSmsService {
    /// Creates a service pointed at the public Twilio API.
    pub fn new() -> Result<Self, NotificationError> {
        Self::with_base_url(TWILIO_API_BASE)
    }

    /// Creates a service pointed at another API host, such as a local mock.
    pub fn with_base_url(base_url: &str) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| NotificationError::Sms(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SmsService for TwilioSmsService {
    async fn send_sms(
        &self,
        account: &SmsAccount,
        to: &str,
        message: &str,
    ) -> Result<String, NotificationError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, account.account_sid
        );

        let form_body = [
            ("From", account.from_number.as_str()),
            ("To", to),
            ("Body", message),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&account.account_sid, Some(&account.auth_token))
            .form(&form_body)
            .send()
            .await
            .map_err(|e| NotificationError::Sms(format!("Request to Twilio failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            log::error!("❌ Twilio error ({}): {}", status, error_body);

            let message = match serde_json::from_str::<TwilioErrorResponse>(&error_body) {
                Ok(TwilioErrorResponse {
                    message,
                    code: Some(code),
                }) => format!("{} (code {})", message, code),
                Ok(TwilioErrorResponse { message, .. }) => message,
                Err(_) => error_body,
            };

            return Err(NotificationError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let sent: TwilioMessageResponse = response.json().await.map_err(|e| {
            NotificationError::Sms(format!("Failed to parse Twilio response: {}", e))
        })?;

        log::info!("📱 Twilio accepted message {} to {}", sent.sid, to);
        Ok(sent.sid)
    }
}
