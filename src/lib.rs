#![forbid(unsafe_code)]

//! Resumable, quota-throttled research outreach.
//!
//! Contacts come from a spreadsheet, each message is generated by a
//! language model and sent over SMTP with the applicant's profile attached.
//! A JSON checkpoint makes repeated runs resume where the last one stopped.

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod generator;
pub mod models;
pub mod persistence;
pub mod profile;
pub mod runner;
pub mod sources;

pub use config::OutreachConfig;
pub use errors::{AppError, Result};
pub use runner::{BatchRunner, RunReport, RunSettings};
