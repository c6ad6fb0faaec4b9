use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Availability of one permit day, keyed by the label the listing uses for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    /// Date label taken verbatim from the listing header (e.g. "5/23")
    pub date: String,
    /// Number of open permits; unreadable cells count as zero
    pub available: u32,
}

/// One campsite row of the listing, restricted to the lookahead window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampsiteRow {
    /// Name in the first cell of the row
    pub campsite_name: String,
    /// Availability in header order, one entry per searched day
    pub availability: Vec<AvailabilityRecord>,
}

impl CampsiteRow {
    /// Records with at least one open permit, in row order
    pub fn available_days(&self) -> impl Iterator<Item = &AvailabilityRecord> {
        self.availability.iter().filter(|record| record.available > 0)
    }
}

/// Last persisted availability per date label
pub type KnownState = HashMap<String, u32>;

/// Result of comparing a fresh row against the known state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDecision {
    /// Whether any date label differs from (or is missing in) the snapshot
    pub changed: bool,
    /// Every record of the row when changed, empty otherwise
    pub updates: Vec<AvailabilityRecord>,
    /// Whether any day currently has open permits
    pub has_availability: bool,
}

impl ChangeDecision {
    /// Whether the decision calls for an alert
    pub fn should_notify(&self) -> bool {
        self.changed && self.has_availability
    }
}

/// What a successful check did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Nothing differed from the stored snapshot
    Unchanged,
    /// The snapshot was rewritten but no day had permits
    UpdatedWithoutAvailability {
        /// Number of date labels written
        days: usize,
    },
    /// The snapshot was rewritten and recipients were alerted
    Notified {
        /// Number of days listed in the alert
        available_days: usize,
        /// Number of recipients messaged
        recipients: usize,
    },
}

/// Custom error type for permit check operations
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The listing could not be retrieved
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The listing did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// The known-state snapshot could not be read or holds corrupt data
    #[error("Store read error: {0}")]
    StoreRead(String),

    /// One or more known-state writes failed
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// Required configuration or secrets are missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// At least one recipient could not be messaged
    #[error("Dispatch error: {failed} of {attempted} sends failed: {details}")]
    Dispatch {
        /// Number of failed sends
        failed: usize,
        /// Number of sends attempted
        attempted: usize,
        /// Recipient and reason for each failure
        details: String,
    },
}

/// Error raised by a single outbound message
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Transport or local failure while sending
    #[error("SMS error: {0}")]
    Sms(String),
    /// The messaging provider rejected the request
    #[error("Provider rejected message ({status}): {message}")]
    Provider {
        /// HTTP status returned by the provider
        status: u16,
        /// Provider error message
        message: String,
    },
}
