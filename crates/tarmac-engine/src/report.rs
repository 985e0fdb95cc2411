//! Event sink and the [`Reporter`] seam.
//!
//! ```text
//! workers / generator / monitor ──emit()──► Statistics::record
//!                                   │
//!                                   └──► [unbounded channel] ──► reporter thread
//!                                                                 Reporter::on_event
//! ```
//!
//! Statistics are updated synchronously in `emit`, so the final snapshot
//! never depends on how far the reporter thread has got. The reporter
//! thread owns the [`Reporter`] and hands it back when the orchestrator
//! closes the stream; the orchestrator then calls [`Reporter::on_finish`]
//! once.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{select, Receiver, Sender};
use tarmac_core::{EventKind, SimEvent};

use crate::clock::{SimClock, StopToken};
use crate::simulation::SimulationReport;
use crate::stats::Statistics;

/// Consumer of the event stream and the final report.
pub trait Reporter: Send {
    /// Called on the reporter thread for every event, in channel order.
    fn on_event(&mut self, event: &SimEvent);

    /// Called exactly once, after every event has been delivered.
    fn on_finish(&mut self, report: &SimulationReport) {
        let _ = report;
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn on_event(&mut self, event: &SimEvent) {
        (**self).on_event(event);
    }

    fn on_finish(&mut self, report: &SimulationReport) {
        (**self).on_finish(report);
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn on_event(&mut self, _event: &SimEvent) {}
}

/// Stamps, records and forwards events. Cloned into every thread.
#[derive(Clone, Debug)]
pub(crate) struct EventSink {
    clock: SimClock,
    stats: Arc<Statistics>,
    tx: Sender<SimEvent>,
}

impl EventSink {
    pub(crate) fn new(clock: SimClock, stats: Arc<Statistics>, tx: Sender<SimEvent>) -> Self {
        Self { clock, stats, tx }
    }

    pub(crate) fn emit(&self, kind: EventKind) {
        let event = SimEvent {
            at: self.clock.elapsed(),
            kind,
        };
        self.stats.record(&event);
        // The reporter thread outlives every sink; a failed send means it
        // panicked, and the statistics already have the event.
        let _ = self.tx.send(event);
    }
}

/// Start the reporter thread. It returns the reporter once every sink is
/// gone or `close` fires, delivering whatever is already queued first.
pub(crate) fn spawn_reporter<R: Reporter + 'static>(
    mut reporter: R,
    rx: Receiver<SimEvent>,
    close: StopToken,
) -> io::Result<JoinHandle<R>> {
    thread::Builder::new()
        .name("tarmac-reporter".into())
        .spawn(move || {
            loop {
                select! {
                    recv(rx) -> msg => match msg {
                        Ok(event) => reporter.on_event(&event),
                        Err(_) => break,
                    },
                    recv(close.receiver()) -> _ => {
                        for event in rx.try_iter() {
                            reporter.on_event(&event);
                        }
                        break;
                    }
                }
            }
            reporter
        })
}
