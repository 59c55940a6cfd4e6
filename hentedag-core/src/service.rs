//! High-level service wiring the store and its sensors together.

use std::sync::Arc;

use crate::model::PlatformConfig;
use crate::ports::{Clock, SchedulePort};
use crate::sensor::{CategorySensor, RefreshOutcome};
use crate::store::{StoreError, WasteDataStore};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of refreshing one sensor during a polling cycle.
pub struct PollReport {
    /// Category of the sensor.
    pub category: String,
    /// Outcome of the sensor refresh.
    pub outcome: Result<RefreshOutcome, StoreError>,
}

/// Public entry point owning the sensors of one configured address.
pub struct WasteService {
    store: Arc<WasteDataStore>,
    sensors: Vec<CategorySensor>,
}

impl WasteService {
    /// Load the schedule once and create a sensor for every category on the page.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the initial refresh fails; categories
    /// cannot be discovered without it.
    pub async fn setup(
        config: PlatformConfig,
        port: Arc<dyn SchedulePort>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let store = Arc::new(WasteDataStore::new(config, port));
        store.refresh().await?;

        let sensors = store
            .categories()
            .into_iter()
            .map(|category| {
                log::info!("Adding sensor for {} ({category})", store.address());
                CategorySensor::new(Arc::clone(&store), category, Arc::clone(&clock))
            })
            .collect();

        Ok(Self { store, sensors })
    }

    /// Shared store behind all sensors.
    #[must_use]
    pub fn store(&self) -> &Arc<WasteDataStore> {
        &self.store
    }

    /// All sensors in table order.
    #[must_use]
    pub fn sensors(&self) -> &[CategorySensor] {
        &self.sensors
    }

    /// Look up the sensor of a category.
    #[must_use]
    pub fn sensor(&self, category: &str) -> Option<&CategorySensor> {
        self.sensors
            .iter()
            .find(|sensor| sensor.category() == category)
    }

    /// Run one polling cycle.
    ///
    /// The store is fetched at most once, and only when some sensor is stale;
    /// every stale sensor then reads the outcome of that one fetch.
    pub async fn poll(&mut self) -> Vec<PollReport> {
        let fetched = if self.sensors.iter().any(CategorySensor::is_stale) {
            self.store.refresh().await
        } else {
            Ok(())
        };

        self.sensors
            .iter_mut()
            .map(|sensor| PollReport {
                category: sensor.category().to_owned(),
                outcome: sensor.apply(&fetched),
            })
            .collect()
    }
}
