//! # Permit Scan
//!
//! This crate watches the e-Hawaii camping listing for Kalalau trail permits.
//! It extracts the availability row from the listing, compares it with the
//! last known state, persists changes and alerts recipients by SMS when new
//! permits open up.

/// Types shared by the check pipeline
mod scan_types;
pub use scan_types::*;

/// Watcher configuration loaded from the environment
mod config;
pub use config::*;

/// Listing table parsing
mod table_extractor;
pub use table_extractor::*;

/// Comparison of a fresh row against the known state
mod change_detector;
pub use change_detector::*;

/// Known-state store trait, batch writes and the in-memory store
mod known_state;
pub use known_state::*;

/// Alert composition and sequential delivery
mod notification_service;
pub use notification_service::*;

/// Logging SMS service for dry runs
mod sms_service;
pub use sms_service::*;

/// HTTP client for the reservation listing
mod ehawaii_client;
pub use ehawaii_client::*;

/// One end-to-end availability check
mod executor;
pub use executor::*;
