//! Traits describing provider capabilities and shared error types.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Error as ReqwestError;

use crate::model::Schedule;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while fetching or parsing a schedule page.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The request did not finish within the configured timeout.
    #[error("Request timed out")]
    Timeout,
    /// The server answered with a non-success status code.
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    /// No table caption on the page matches the address.
    #[error("Address not found on page: {0}")]
    AddressNotFound(String),
    /// The schedule table for the address has no rows.
    #[error("Schedule table for {0} has no rows")]
    EmptyTable(String),
    /// A table row does not have the expected structure.
    #[error("Malformed row {row}: {reason}")]
    MalformedRow {
        /// Zero-based row index within the table body.
        row: usize,
        /// What was wrong with the row.
        reason: String,
    },
    /// The date token of a row is not a `DD.MM.YYYY` date.
    #[error("Invalid date {token:?} in row {row}")]
    InvalidDate {
        /// Zero-based row index within the table body.
        row: usize,
        /// The offending token.
        token: String,
    },
}

impl PortError {
    /// Whether the error happened on the transport rather than in the page.
    #[must_use]
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout | Self::Status(_))
    }
}

#[async_trait]
/// Trait for provider-specific schedule backends.
pub trait SchedulePort: Send + Sync {
    /// Fetch and parse the schedule of `address`, querying the page by `street`.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails or the page does not
    /// contain a well-formed schedule for the address.
    async fn fetch_schedule(&self, address: &str, street: &str) -> Result<Schedule, PortError>;
}

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    /// Today's date.
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
/// Clock reading the local calendar date.
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
