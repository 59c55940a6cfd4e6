//! Test doubles for the provider and clock ports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};

use crate::model::{PickupRecord, Schedule};
use crate::ports::{Clock, PortError, SchedulePort};

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// The two rows of the "STORGATA 1" fixture page.
pub(crate) fn storgata() -> Schedule {
    Schedule::from_records([
        PickupRecord {
            category: "Restavfall".to_owned(),
            date: date(2024, 3, 5),
            frequency: "Hver uke".to_owned(),
        },
        PickupRecord {
            category: "Papir".to_owned(),
            date: date(2024, 3, 10),
            frequency: "Hver 4. uke".to_owned(),
        },
    ])
}

pub(crate) enum Script {
    Serve(Schedule),
    Timeout,
    MissingAddress,
}

/// Scripted schedule port counting its fetches.
pub(crate) struct FakePort {
    script: Mutex<Script>,
    calls: AtomicUsize,
    last_street: Mutex<Option<String>>,
    delay: Duration,
}

impl FakePort {
    pub(crate) fn serving(schedule: Schedule) -> Self {
        Self {
            script: Mutex::new(Script::Serve(schedule)),
            calls: AtomicUsize::new(0),
            last_street: Mutex::new(None),
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn set(&self, script: Script) {
        *self.script.lock().unwrap_or_else(PoisonError::into_inner) = script;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_street(&self) -> Option<String> {
        self.last_street
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SchedulePort for FakePort {
    async fn fetch_schedule(&self, address: &str, street: &str) -> Result<Schedule, PortError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_street.lock().unwrap_or_else(PoisonError::into_inner) = Some(street.to_owned());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &*self.script.lock().unwrap_or_else(PoisonError::into_inner) {
            Script::Serve(schedule) => Ok(schedule.clone()),
            Script::Timeout => Err(PortError::Timeout),
            Script::MissingAddress => Err(PortError::AddressNotFound(address.to_uppercase())),
        }
    }
}

/// Clock pinned to a settable date.
pub(crate) struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub(crate) fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub(crate) fn advance(&self, days: u64) {
        let mut today = self.today.lock().unwrap_or_else(PoisonError::into_inner);
        *today = today
            .checked_add_days(Days::new(days))
            .expect("date in range");
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
