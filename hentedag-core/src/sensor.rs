//! Per-category view on the shared store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::model::{
    ATTR_ADDRESS, ATTR_ATTRIBUTION, ATTR_FRIENDLY_NAME, ATTR_PICKUP_DATE, ATTR_PICKUP_FREQUENCY,
    ATTRIBUTION,
};
use crate::ports::Clock;
use crate::store::{StoreError, WasteDataStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What a sensor refresh did.
pub enum RefreshOutcome {
    /// The cached pickup date is still ahead; nothing was fetched.
    Cached,
    /// The store was refreshed and the sensor picked up the current record.
    Refreshed,
}

/// Days-until-pickup sensor for one waste category.
///
/// The sensor only asks the store for new data once its cached pickup date
/// has arrived. Failed refreshes leave the last known values in place.
pub struct CategorySensor {
    store: Arc<WasteDataStore>,
    clock: Arc<dyn Clock>,
    category: String,
    pickup_date: Option<NaiveDate>,
    attributes: BTreeMap<String, String>,
}

impl CategorySensor {
    /// Create a sensor for a category discovered by the store.
    #[must_use]
    pub fn new(store: Arc<WasteDataStore>, category: String, clock: Arc<dyn Clock>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(ATTR_ADDRESS.to_owned(), store.address().to_owned());
        attributes.insert(ATTR_FRIENDLY_NAME.to_owned(), category.clone());

        Self {
            store,
            clock,
            category,
            pickup_date: None,
            attributes,
        }
    }

    /// Waste category of this sensor.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Last known pickup date.
    #[must_use]
    pub fn pickup_date(&self) -> Option<NaiveDate> {
        self.pickup_date
    }

    /// Days until the next pickup; negative when overdue.
    #[must_use]
    pub fn days_remaining(&self) -> Option<i64> {
        self.pickup_date
            .map(|date| (date - self.clock.today()).num_days())
    }

    /// Whether the cached pickup date is missing or has arrived.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.days_remaining().is_none_or(|days| days <= 0)
    }

    /// Descriptive attributes of the sensor.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Unit of [`CategorySensor::days_remaining`].
    #[must_use]
    pub fn unit_of_measurement(&self) -> &'static str {
        "days"
    }

    /// Refresh the store if the cached date is stale, then read the category.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError::Fetch`] and [`StoreError::Parse`] from the
    /// store, and returns [`StoreError::NotFound`] when the category vanished
    /// from the page. The previous values are kept in every error case.
    pub async fn refresh(&mut self) -> Result<RefreshOutcome, StoreError> {
        if !self.is_stale() {
            return Ok(self.skip());
        }

        let fetched = self.store.refresh().await;
        self.apply(&fetched)
    }

    /// Apply a store refresh that was run on behalf of several sensors.
    ///
    /// A fresh sensor ignores `fetched` and reports [`RefreshOutcome::Cached`].
    pub(crate) fn apply(
        &mut self,
        fetched: &Result<(), StoreError>,
    ) -> Result<RefreshOutcome, StoreError> {
        if !self.is_stale() {
            return Ok(self.skip());
        }

        if let Err(err) = fetched {
            return Err(err.clone());
        }

        let record = self.store.get(&self.category)?;
        self.attributes
            .insert(ATTR_PICKUP_DATE.to_owned(), record.date.to_string());
        self.attributes
            .insert(ATTR_PICKUP_FREQUENCY.to_owned(), record.frequency);
        self.attributes
            .insert(ATTR_ATTRIBUTION.to_owned(), ATTRIBUTION.to_owned());
        self.pickup_date = Some(record.date);

        Ok(RefreshOutcome::Refreshed)
    }

    fn skip(&self) -> RefreshOutcome {
        log::info!(
            "{} {} - Skipping update.",
            self.store.address(),
            self.category
        );
        RefreshOutcome::Cached
    }
}
