use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use tracing::{debug, warn};

use crate::scan_types::ScanError;

/// Source of the raw reservation listing
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the listing document covering the window starting at `start_date`
    async fn fetch_listing(&self, start_date: NaiveDate) -> Result<String, ScanError>;

    /// Link where a permit for the watched site can be claimed
    fn details_url(&self) -> String;
}

/// Client for the camping.ehawaii.gov reservation pages
pub struct EhawaiiClient {
    client: Client,
    base_url: String,
    site_id: u32,
    days_to_search: usize,
}

impl EhawaiiClient {
    /// Create a new client for one site and lookahead window
    pub fn new(base_url: &str, site_id: u32, days_to_search: usize) -> Result<Self, ScanError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScanError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            site_id,
            days_to_search,
        })
    }

    /// Listing URL for a window starting at `start_date`.
    ///
    /// The path is a comma-separated parameter list; the trailing number is a
    /// millisecond timestamp that keeps intermediaries from serving a cached page.
    pub fn listing_url(&self, start_date: NaiveDate, cache_buster: i64) -> String {
        format!(
            "{}/camping/all,sites,0,25,1,{},,,,{},{},,,1,{}.html",
            self.base_url,
            self.site_id,
            start_date.format("%Y%m%d"),
            self.days_to_search,
            cache_buster
        )
    }
}

#[async_trait]
impl ListingSource for EhawaiiClient {
    async fn fetch_listing(&self, start_date: NaiveDate) -> Result<String, ScanError> {
        let url = self.listing_url(start_date, Utc::now().timestamp_millis());
        debug!("Fetching listing: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ScanError::Fetch(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            let snippet: String = body.chars().take(200).collect();
            warn!("Listing request failed with status {}: {}", status, snippet);

            return Err(match status.as_u16() {
                429 => ScanError::Fetch("Rate limited by listing site".to_string()),
                404 => ScanError::Fetch(format!("Listing not found for site {}", self.site_id)),
                _ => ScanError::Fetch(format!("HTTP {} - {}", status, snippet)),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ScanError::Fetch(format!("Failed to read listing body: {}", e)))
    }

    fn details_url(&self) -> String {
        format!("{}/camping/all,details,{}.html", self.base_url, self.site_id)
    }
}
