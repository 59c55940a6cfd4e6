//! Shared schedule cache for one configured address.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Local};
use tokio::sync::Mutex;

use crate::model::{PickupRecord, PlatformConfig, Schedule};
use crate::ports::{PortError, SchedulePort};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors surfaced by the store and the sensors built on it.
pub enum StoreError {
    /// The page could not be fetched (transport failure or timeout).
    #[error("Fetch error: {0}")]
    Fetch(String),
    /// The page was fetched but its schedule table could not be read.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The category is not part of the current schedule.
    #[error("Unknown category: {0}")]
    NotFound(String),
}

impl From<PortError> for StoreError {
    fn from(err: PortError) -> Self {
        if err.is_fetch() {
            Self::Fetch(err.to_string())
        } else {
            Self::Parse(err.to_string())
        }
    }
}

#[derive(Default)]
struct Loaded {
    schedule: Arc<Schedule>,
    refreshed_at: Option<DateTime<Local>>,
}

struct RefreshGate {
    generation: u64,
    outcome: Result<(), StoreError>,
}

/// Cache of the pickup schedule of one address, shared by all its sensors.
///
/// The store never fetches on its own. [`WasteDataStore::refresh`] replaces the
/// whole schedule at once and only one fetch runs at a time: callers arriving
/// while a fetch is in flight receive the outcome of that fetch.
pub struct WasteDataStore {
    config: PlatformConfig,
    port: Arc<dyn SchedulePort>,
    records: RwLock<Loaded>,
    completed: AtomicU64,
    gate: Mutex<RefreshGate>,
}

impl WasteDataStore {
    /// Create an empty store for the configured address.
    #[must_use]
    pub fn new(config: PlatformConfig, port: Arc<dyn SchedulePort>) -> Self {
        Self {
            config,
            port,
            records: RwLock::new(Loaded::default()),
            completed: AtomicU64::new(0),
            gate: Mutex::new(RefreshGate {
                generation: 0,
                outcome: Ok(()),
            }),
        }
    }

    /// Configured address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.config.address
    }

    /// Street used to query the page.
    #[must_use]
    pub fn street(&self) -> &str {
        self.config.street()
    }

    /// Currently known categories in table order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.snapshot().categories()
    }

    /// Consistent view of the current schedule.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Schedule> {
        let loaded = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&loaded.schedule)
    }

    /// Time of the last successful refresh.
    #[must_use]
    pub fn last_refreshed(&self) -> Option<DateTime<Local>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refreshed_at
    }

    /// Look up the record of a category without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the category is unknown.
    pub fn get(&self, category: &str) -> Result<PickupRecord, StoreError> {
        self.snapshot()
            .get(category)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(category.to_owned()))
    }

    /// Fetch the page and replace the schedule.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Fetch`] or [`StoreError::Parse`]; the previous
    /// schedule is kept in both cases.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let seen = self.completed.load(Ordering::Acquire);
        let mut gate = self.gate.lock().await;

        if gate.generation != seen {
            log::debug!("{} - Joined in-flight refresh", self.address());
            return gate.outcome.clone();
        }

        let outcome = self.fetch_and_swap().await;

        gate.generation = gate.generation.wrapping_add(1);
        gate.outcome.clone_from(&outcome);
        self.completed.store(gate.generation, Ordering::Release);

        outcome
    }

    async fn fetch_and_swap(&self) -> Result<(), StoreError> {
        log::debug!(
            "{} - Fetching schedule (street {})",
            self.address(),
            self.street()
        );

        let schedule = match self
            .port
            .fetch_schedule(&self.config.address, self.config.street())
            .await
        {
            Ok(schedule) => schedule,
            Err(err) if err.is_fetch() => {
                log::warn!("{} - Fetching schedule failed: {err}", self.address());
                return Err(err.into());
            }
            Err(err) => {
                log::error!(
                    "{} - Schedule page could not be read, the layout may have changed: {err}",
                    self.address()
                );
                return Err(err.into());
            }
        };

        log::info!(
            "{} - Loaded {} categories",
            self.address(),
            schedule.len()
        );

        let replacement = Loaded {
            schedule: Arc::new(schedule),
            refreshed_at: Some(Local::now()),
        };
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = replacement;

        Ok(())
    }
}
