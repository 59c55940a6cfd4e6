use std::time::Duration;

use chrono::{DateTime, Local};
use hentedag_core::{CategorySensor, PollReport, WasteService};

pub(crate) struct App {
    pub service: WasteService,
    pub poll_interval: Duration,

    pub selected: usize,

    pub last_poll: Option<DateTime<Local>>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(service: WasteService, poll_interval: Duration) -> Self {
        Self {
            service,
            poll_interval,
            selected: 0,
            last_poll: None,
            is_loading: false,
            error_message: None,
        }
    }

    pub(crate) fn address(&self) -> &str {
        self.service.store().address()
    }

    pub(crate) fn sensors(&self) -> &[CategorySensor] {
        self.service.sensors()
    }

    pub(crate) fn selected_sensor(&self) -> Option<&CategorySensor> {
        self.sensors().get(self.selected)
    }

    pub(crate) fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub(crate) fn select_next(&mut self) {
        if self.selected + 1 < self.sensors().len() {
            self.selected += 1;
        }
    }

    pub(crate) async fn poll(&mut self) {
        let reports = self.service.poll().await;
        self.record(&reports);
    }

    fn record(&mut self, reports: &[PollReport]) {
        self.last_poll = Some(Local::now());

        let failures = reports
            .iter()
            .filter_map(|report| {
                report
                    .outcome
                    .as_ref()
                    .err()
                    .map(|err| format!("{}: {err}", report.category))
            })
            .collect::<Vec<_>>();

        self.error_message = if failures.is_empty() {
            None
        } else {
            for failure in &failures {
                log::warn!("Refresh failed for {failure}");
            }
            Some(format!("Refresh failed ({})", failures.join("; ")))
        };
    }
}
