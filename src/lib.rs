//! Herald collects DMARC aggregate reports from email, stores a summary of each one and
//! raises a notification when a receiver quarantined or rejected mail.

pub mod config;
pub mod dmarc;
pub mod error;
pub mod message;
pub mod notify;
pub mod pipeline;
pub mod query;
pub mod source;
pub mod store;

pub use error::{Error, Result};
