//! Test utilities for tarmac development.
//!
//! - [`CollectingReporter`] keeps every event and the final report behind
//!   a shared [`EventLog`] so tests can inspect them after `finish`.
//! - [`fixtures`] builds millisecond-scale configurations and scripts.
//! - [`checks`] asserts whole-run properties over an event stream.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod checks;
pub mod fixtures;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tarmac_core::{AircraftId, EventKind, SimEvent};
use tarmac_engine::{Reporter, SimulationReport};

#[derive(Debug, Default)]
struct LogInner {
    events: Vec<SimEvent>,
    finished: Option<SimulationReport>,
    finish_calls: usize,
}

/// Shared view of what a [`CollectingReporter`] received.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    inner: Arc<Mutex<LogInner>>,
}

impl EventLog {
    fn lock(&self) -> MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every event delivered so far, in delivery order.
    pub fn events(&self) -> Vec<SimEvent> {
        self.lock().events.clone()
    }

    /// Events concerning one aircraft.
    pub fn for_aircraft(&self, id: AircraftId) -> Vec<SimEvent> {
        self.lock()
            .events
            .iter()
            .filter(|e| e.kind.aircraft() == Some(id))
            .cloned()
            .collect()
    }

    /// Events matching `pred`.
    pub fn matching(&self, pred: impl Fn(&EventKind) -> bool) -> Vec<SimEvent> {
        self.lock()
            .events
            .iter()
            .filter(|e| pred(&e.kind))
            .cloned()
            .collect()
    }

    /// The report passed to `on_finish`, if it was called.
    pub fn finished(&self) -> Option<SimulationReport> {
        self.lock().finished.clone()
    }

    /// How many times `on_finish` ran.
    pub fn finish_calls(&self) -> usize {
        self.lock().finish_calls
    }
}

/// Reporter that records everything into an [`EventLog`].
#[derive(Debug, Default)]
pub struct CollectingReporter {
    log: EventLog,
}

impl CollectingReporter {
    /// A reporter plus the log it writes to.
    pub fn new() -> (Self, EventLog) {
        let log = EventLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl Reporter for CollectingReporter {
    fn on_event(&mut self, event: &SimEvent) {
        self.log.lock().events.push(event.clone());
    }

    fn on_finish(&mut self, report: &SimulationReport) {
        let mut inner = self.log.lock();
        inner.finished = Some(report.clone());
        inner.finish_calls += 1;
    }
}
