use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::{debug, info};

use crate::change_detector::detect_changes;
use crate::config::WatcherConfig;
use crate::ehawaii_client::ListingSource;
use crate::known_state::{KnownStateStore, upsert_all};
use crate::notification_service::{NotificationDispatcher, compose_message};
use crate::scan_types::{CheckOutcome, ScanError};
use crate::table_extractor::extract_campsite_row;

/// Hawaii Standard Time; the islands do not observe daylight saving
const LISTING_UTC_OFFSET_SECS: i32 = 10 * 3600;

/// Current calendar date at the campground
fn listing_today(now: DateTime<Utc>) -> NaiveDate {
    match FixedOffset::west_opt(LISTING_UTC_OFFSET_SECS) {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => now.date_naive(),
    }
}

/// Runs one availability check: fetch, extract, compare, persist, alert
pub struct PermitChecker {
    config: WatcherConfig,
    source: Arc<dyn ListingSource>,
    store: Arc<dyn KnownStateStore>,
    dispatcher: NotificationDispatcher,
}

impl PermitChecker {
    /// Wire a checker from its collaborators
    pub fn new(
        config: WatcherConfig,
        source: Arc<dyn ListingSource>,
        store: Arc<dyn KnownStateStore>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            config,
            source,
            store,
            dispatcher,
        }
    }

    /// Check the listing once.
    ///
    /// Nothing is written unless the row differs from the stored snapshot, and
    /// an alert is only sent when the row changed and some day has permits.
    /// Every failure aborts the check; the next scheduled check starts over.
    pub async fn run_check(&self) -> Result<CheckOutcome, ScanError> {
        let start_date = self
            .config
            .start_date
            .unwrap_or_else(|| listing_today(Utc::now()));
        debug!(
            "Checking {} for {} days from {}",
            self.config.campsite_name, self.config.days_to_search, start_date
        );

        let document = self.source.fetch_listing(start_date).await?;
        let table = extract_campsite_row(
            &document,
            &self.config.campsite_name,
            self.config.days_to_search,
        )?;
        info!(
            "Found availability: {}",
            serde_json::to_string_pretty(&table.row).unwrap_or_default()
        );

        let known = self.store.scan_all().await?;
        let previous: BTreeMap<_, _> = known.iter().collect();
        info!("Found availability from previous run: {:?}", previous);

        let decision = detect_changes(&table.row, &known);
        if !decision.changed {
            info!("There is no new information, exiting.");
            return Ok(CheckOutcome::Unchanged);
        }

        info!("Updating known availability with new values");
        upsert_all(self.store.as_ref(), &decision.updates).await?;

        let days = decision.updates.len();
        if !decision.has_availability {
            info!("There is no availability, exiting.");
            return Ok(CheckOutcome::UpdatedWithoutAvailability { days });
        }

        let Some(message) = compose_message(
            &table.row,
            &self.config.trail_name,
            &self.source.details_url(),
        ) else {
            return Ok(CheckOutcome::UpdatedWithoutAvailability { days });
        };

        let recipients = self.dispatcher.dispatch(&message).await?;
        Ok(CheckOutcome::Notified {
            available_days: table.row.available_days().count(),
            recipients,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_listing_today_uses_hawaii_date() {
        // 2023-05-22 01:30 UTC is still the afternoon of 5/21 in Honolulu
        let evening = Utc.with_ymd_and_hms(2023, 5, 22, 1, 30, 0).unwrap();
        assert_eq!(
            listing_today(evening),
            NaiveDate::from_ymd_opt(2023, 5, 21).unwrap()
        );

        let morning = Utc.with_ymd_and_hms(2023, 5, 21, 18, 0, 0).unwrap();
        assert_eq!(
            listing_today(morning),
            NaiveDate::from_ymd_opt(2023, 5, 21).unwrap()
        );
    }
}
