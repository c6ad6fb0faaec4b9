use async_trait::async_trait;
use tracing::info;

use crate::{NotificationError, SmsAccount, SmsService};

/// Mock SMS service for dry runs: logs the message instead of sending it
pub struct MockSmsService;

#[async_trait]
impl SmsService for MockSmsService {
    async fn send_sms(
        &self,
        account: &SmsAccount,
        to: &str,
        message: &str,
    ) -> Result<String, NotificationError> {
        info!("📱 [MOCK SMS] From: {} To: {}", account.from_number, to);
        info!("📱 [MOCK SMS] Message: {}", message);

        let mock_id = format!("mock-sms-{}", uuid::Uuid::new_v4());
        Ok(mock_id)
    }
}
