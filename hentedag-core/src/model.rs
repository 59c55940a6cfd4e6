//! Domain data structures for addresses and pickup schedules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attribute key holding the configured address.
pub const ATTR_ADDRESS: &str = "address";
/// Attribute key holding the category name shown to users.
pub const ATTR_FRIENDLY_NAME: &str = "friendly_name";
/// Attribute key holding the next pickup date as an ISO-8601 string.
pub const ATTR_PICKUP_DATE: &str = "pickup_date";
/// Attribute key holding the free-text pickup frequency.
pub const ATTR_PICKUP_FREQUENCY: &str = "pickup_frequency";
/// Attribute key holding the data attribution.
pub const ATTR_ATTRIBUTION: &str = "attribution";
/// Attribution text exposed on every populated sensor.
pub const ATTRIBUTION: &str = "Data is provided by www.oslo.kommune.no";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Next pickup of a single waste category.
pub struct PickupRecord {
    /// Category name as shown in the source table, e.g. "Restavfall".
    pub category: String,
    /// Date of the next pickup.
    pub date: NaiveDate,
    /// Pickup cadence, e.g. "Hver 4. uke".
    pub frequency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Pickup records of one address, in table row order and unique by category.
pub struct Schedule {
    records: Vec<PickupRecord>,
}

impl Schedule {
    /// Build a schedule from parsed rows.
    ///
    /// A later record for an already known category replaces the earlier one
    /// but keeps its position.
    #[must_use]
    pub fn from_records<I: IntoIterator<Item = PickupRecord>>(records: I) -> Self {
        let mut schedule = Self::default();
        for record in records {
            if let Some(existing) = schedule
                .records
                .iter_mut()
                .find(|known| known.category == record.category)
            {
                *existing = record;
            } else {
                schedule.records.push(record);
            }
        }
        schedule
    }

    /// Category names in table order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.category.clone())
            .collect()
    }

    /// Look up the record of a category.
    #[must_use]
    pub fn get(&self, category: &str) -> Option<&PickupRecord> {
        self.records
            .iter()
            .find(|record| record.category == category)
    }

    /// Iterator over all records.
    pub fn iter(&self) -> impl Iterator<Item = &PickupRecord> {
        self.records.iter()
    }

    /// Number of known categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no category is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Address configuration supplied once when the sensors are set up.
pub struct PlatformConfig {
    /// Address as printed in the table caption of the schedule page.
    pub address: String,
    /// Street used as query parameter; falls back to the address.
    #[serde(default)]
    pub street: Option<String>,
}

impl PlatformConfig {
    /// Construct a new configuration.
    #[must_use]
    pub fn new<A: Into<String>, S: Into<String>>(address: A, street: Option<S>) -> Self {
        Self {
            address: address.into(),
            street: street.map(Into::into),
        }
    }

    /// Street to query, defaulting to the address when unset or blank.
    #[must_use]
    pub fn street(&self) -> &str {
        self.street
            .as_deref()
            .map(str::trim)
            .filter(|street| !street.is_empty())
            .unwrap_or(&self.address)
    }
}
