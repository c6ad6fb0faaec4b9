use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::scan_types::{AvailabilityRecord, KnownState, ScanError};

/// Upper bound on in-flight writes when syncing a row
pub const MAX_CONCURRENT_WRITES: usize = 8;

/// Persistence for the last observed availability per date label
#[async_trait]
pub trait KnownStateStore: Send + Sync {
    /// Read every stored date label and count.
    ///
    /// A stored value that is not a valid count must fail with
    /// [`ScanError::StoreRead`] rather than read as zero.
    async fn scan_all(&self) -> Result<KnownState, ScanError>;

    /// Insert or overwrite the count for one date label
    async fn upsert(&self, date: &str, availability: u32) -> Result<(), ScanError>;
}

async fn upsert_record<'a>(
    store: &'a dyn KnownStateStore,
    record: &'a AvailabilityRecord,
) -> (&'a str, Result<(), ScanError>) {
    (
        record.date.as_str(),
        store.upsert(&record.date, record.available).await,
    )
}

fn failure_detail(error: ScanError) -> String {
    match error {
        ScanError::StoreWrite(detail) => detail,
        other => other.to_string(),
    }
}

/// Write every record to the store concurrently.
///
/// All writes are awaited even when some fail. Failures are reported together
/// and successful writes are kept; the next check reconciles any stale labels.
pub async fn upsert_all(
    store: &dyn KnownStateStore,
    records: &[AvailabilityRecord],
) -> Result<(), ScanError> {
    let mut results = Vec::with_capacity(records.len());
    for chunk in records.chunks(MAX_CONCURRENT_WRITES) {
        let written: Vec<(&str, Result<(), ScanError>)> = chunk
            .iter()
            .map(|record| upsert_record(store, record))
            .collect::<FuturesUnordered<_>>()
            .collect()
            .await;
        results.extend(written);
    }

    let failures: Vec<String> = results
        .into_iter()
        .filter_map(|(date, result)| {
            result
                .err()
                .map(|e| format!("{date} ({})", failure_detail(e)))
        })
        .collect();

    if failures.is_empty() {
        debug!("Stored availability for {} dates", records.len());
        return Ok(());
    }

    error!(
        "Failed to store {} of {} dates",
        failures.len(),
        records.len()
    );
    Err(ScanError::StoreWrite(format!(
        "{} of {} updates failed: {}",
        failures.len(),
        records.len(),
        failures.join(", ")
    )))
}

/// In-process store, used for development runs and tests
#[derive(Debug, Default)]
pub struct MemoryKnownStateStore {
    state: RwLock<KnownState>,
}

impl MemoryKnownStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with a snapshot
    pub fn with_state(state: KnownState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the current contents
    pub async fn snapshot(&self) -> KnownState {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl KnownStateStore for MemoryKnownStateStore {
    async fn scan_all(&self) -> Result<KnownState, ScanError> {
        Ok(self.snapshot().await)
    }

    async fn upsert(&self, date: &str, availability: u32) -> Result<(), ScanError> {
        self.state
            .write()
            .await
            .insert(date.to_string(), availability);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyStore {
        inner: MemoryKnownStateStore,
        failing_date: &'static str,
    }

    #[async_trait]
    impl KnownStateStore for FlakyStore {
        async fn scan_all(&self) -> Result<KnownState, ScanError> {
            self.inner.scan_all().await
        }

        async fn upsert(&self, date: &str, availability: u32) -> Result<(), ScanError> {
            if date == self.failing_date {
                return Err(ScanError::StoreWrite("throttled".to_string()));
            }
            self.inner.upsert(date, availability).await
        }
    }

    fn records(values: &[(&str, u32)]) -> Vec<AvailabilityRecord> {
        values
            .iter()
            .map(|(date, available)| AvailabilityRecord {
                date: date.to_string(),
                available: *available,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_upsert_then_scan_round_trips() {
        let store = MemoryKnownStateStore::new();

        store.upsert("5/23", 2).await.unwrap();
        store.upsert("5/23", 7).await.unwrap();
        store.upsert("5/24", 0).await.unwrap();

        let state = store.scan_all().await.unwrap();
        assert_eq!(state.get("5/23"), Some(&7));
        assert_eq!(state.get("5/24"), Some(&0));
        assert_eq!(state.len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_all_writes_every_record() {
        let store = MemoryKnownStateStore::new();
        let batch = records(&[("5/21", 0), ("5/22", 1), ("5/23", 2)]);

        upsert_all(&store, &batch).await.unwrap();

        let state = store.snapshot().await;
        assert_eq!(state.len(), 3);
        assert_eq!(state["5/23"], 2);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_successful_writes() {
        let store = FlakyStore {
            inner: MemoryKnownStateStore::new(),
            failing_date: "5/22",
        };
        let batch = records(&[("5/21", 1), ("5/22", 1), ("5/23", 1)]);

        let err = upsert_all(&store, &batch).await.unwrap_err();

        match err {
            ScanError::StoreWrite(message) => {
                assert!(message.starts_with("1 of 3 updates failed"));
                assert_eq!(message, "1 of 3 updates failed: 5/22 (throttled)");
            }
            other => panic!("expected StoreWrite, got {other:?}"),
        }
        let state = store.inner.snapshot().await;
        assert_eq!(state.len(), 2);
        assert!(!state.contains_key("5/22"));
    }
}
