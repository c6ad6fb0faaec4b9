use crate::scan_types::{CampsiteRow, ChangeDecision, KnownState};

/// Compare the current row against the stored snapshot.
///
/// A date missing from the snapshot counts as changed. When anything changed
/// the whole row is returned for writing so the snapshot stays in sync with
/// the latest listing.
pub fn detect_changes(row: &CampsiteRow, known: &KnownState) -> ChangeDecision {
    let changed = row
        .availability
        .iter()
        .any(|record| known.get(&record.date) != Some(&record.available));

    let updates = if changed {
        row.availability.clone()
    } else {
        Vec::new()
    };

    ChangeDecision {
        changed,
        updates,
        has_availability: row.available_days().next().is_some(),
    }
}
