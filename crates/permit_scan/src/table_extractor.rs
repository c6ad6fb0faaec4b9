use scraper::{ElementRef, Html, Selector};

use crate::scan_types::{AvailabilityRecord, CampsiteRow, ScanError};

/// Header labels and the watched row pulled out of the listing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTable {
    /// Last `days_to_search` header labels, trimmed
    pub date_labels: Vec<String>,
    /// Row whose first cell matched the campsite name
    pub row: CampsiteRow,
}

/// Parse the listing document and pick out the availability of one campsite.
///
/// The listing is an HTML table with one header row of date labels and one
/// body row per campsite. Only the trailing `days_to_search` columns carry
/// availability; anything in front of them is descriptive.
pub fn extract_campsite_row(
    document: &str,
    campsite_name: &str,
    days_to_search: usize,
) -> Result<ExtractedTable, ScanError> {
    let html = Html::parse_document(document);

    let date_labels = extract_date_labels(&html, days_to_search)?;
    if date_labels.len() != days_to_search {
        return Err(ScanError::Parse(format!(
            "Failed to find names for all dates: expected {}, found {}",
            days_to_search,
            date_labels.len()
        )));
    }

    let tbody_selector = selector("tbody")?;
    let tr_selector = selector("tr")?;
    let td_selector = selector("td")?;

    let tbody = html
        .select(&tbody_selector)
        .next()
        .ok_or_else(|| ScanError::Parse("Listing has no table body".to_string()))?;

    let cells = tbody
        .select(&tr_selector)
        .map(|row| cell_texts(row, &td_selector))
        .find(|cells| cells.first().map(String::as_str) == Some(campsite_name))
        .ok_or_else(|| {
            ScanError::Parse(format!(
                "Could not find the expected row for {campsite_name} permits"
            ))
        })?;

    let availability_cells = last_n(&cells, days_to_search);
    if availability_cells.len() != days_to_search {
        return Err(ScanError::Parse(format!(
            "Row for {} has {} availability cells, expected {}",
            campsite_name,
            availability_cells.len(),
            days_to_search
        )));
    }

    let availability = availability_cells
        .iter()
        .zip(&date_labels)
        .map(|(cell, date)| AvailabilityRecord {
            date: date.clone(),
            available: parse_permit_count(cell),
        })
        .collect();

    Ok(ExtractedTable {
        date_labels,
        row: CampsiteRow {
            campsite_name: campsite_name.to_string(),
            availability,
        },
    })
}

fn extract_date_labels(html: &Html, days_to_search: usize) -> Result<Vec<String>, ScanError> {
    let thead_selector = selector("thead")?;
    let tr_selector = selector("tr")?;
    let th_selector = selector("th")?;

    let header_row = html
        .select(&thead_selector)
        .next()
        .and_then(|thead| thead.select(&tr_selector).next());

    Ok(header_row
        .map(|row| last_n(&cell_texts(row, &th_selector), days_to_search).to_vec())
        .unwrap_or_default())
}

fn cell_texts(row: ElementRef<'_>, cell_selector: &Selector) -> Vec<String> {
    row.select(cell_selector)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

fn selector(css: &str) -> Result<Selector, ScanError> {
    Selector::parse(css).map_err(|e| ScanError::Parse(format!("Invalid selector {css}: {e}")))
}

/// Read a permit count from a table cell.
///
/// The leading run of digits is the count. Cells holding letter codes such as
/// "C" (closed), signs, or numbers too large for a count read as zero.
pub fn parse_permit_count(cell: &str) -> u32 {
    let trimmed = cell.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());

    trimmed[..digits_end].parse().unwrap_or(0)
}
