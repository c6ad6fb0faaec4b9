//! # Notification Services
//!
//! This crate provides the production adapters behind the permit watcher's alerts:
//! an AWS SSM Parameter Store secret store and a Twilio SMS sender.

/// Secret resolution through AWS Systems Manager Parameter Store.
pub mod secret_store;
/// SMS delivery through the Twilio Messages API.
pub mod twilio;

pub use secret_store::SsmSecretStore;
pub use twilio::{TWILIO_API_BASE, TwilioSmsService};
