use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ssm::Client as SsmClient;
use aws_sdk_ssm::error::DisplayErrorContext;
use permit_scan::{ScanError, SecretStore};

/// Secret store backed by AWS Systems Manager Parameter Store.
#[derive(Debug, Clone)]
pub struct SsmSecretStore {
    ssm_client: SsmClient,
}

impl SsmSecretStore {
    /// Creates a new store using the default AWS configuration chain.
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        Self {
            ssm_client: SsmClient::new(&config),
        }
    }

    /// Creates a store from an already configured client.
    pub fn from_client(ssm_client: SsmClient) -> Self {
        Self { ssm_client }
    }
}

#[async_trait]
impl SecretStore for SsmSecretStore {
    async fn get_secrets(&self, names: &[String]) -> Result<HashMap<String, String>, ScanError> {
        log::debug!("🔐 Reading {} parameters from SSM", names.len());

        let output = self
            .ssm_client
            .get_parameters()
            .set_names(Some(names.to_vec()))
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ AWS SSM error: {}", DisplayErrorContext(&e));
                ScanError::Configuration(format!(
                    "Failed to read messaging secrets: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        if !output.invalid_parameters().is_empty() {
            log::warn!(
                "⚠️ SSM parameters not found: {}",
                output.invalid_parameters().join(", ")
            );
        }

        Ok(output
            .parameters()
            .iter()
            .filter_map(|parameter| {
                Some((
                    parameter.name()?.to_string(),
                    parameter.value()?.to_string(),
                ))
            })
            .collect())
    }
}
