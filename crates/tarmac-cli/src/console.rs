//! Line-per-event console output.

use std::time::Duration;

use tarmac::engine::{Reporter, SimulationReport};
use tarmac::types::{EventKind, SimEvent};

use crate::summary;

/// Prints one line per event to stdout and the summary at the end.
pub struct ConsoleReporter {
    unit: Duration,
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(unit: Duration, quiet: bool) -> Self {
        Self { unit, quiet }
    }

    fn units(&self, d: Duration) -> f64 {
        d.as_secs_f64() / self.unit.as_secs_f64()
    }
}

impl Reporter for ConsoleReporter {
    fn on_event(&mut self, event: &SimEvent) {
        if self.quiet {
            return;
        }
        let at = self.units(event.at);
        let subject = match (event.kind.aircraft(), event.kind.class()) {
            (Some(id), Some(class)) => format!("aircraft {}{id}", class.tag()),
            _ => "monitor".to_string(),
        };
        let line = match &event.kind {
            EventKind::Created { .. } => "entered airspace".to_string(),
            EventKind::SpawnFailed { reason, .. } => format!("could not start: {reason}"),
            EventKind::StateChanged { to, .. } => format!("{to}"),
            EventKind::ResourceAcquired {
                resource,
                in_use,
                capacity,
                ..
            } => format!("acquired {resource} ({in_use}/{capacity} in use)"),
            EventKind::ResourceReleased {
                resource,
                in_use,
                capacity,
                ..
            } => format!("released {resource} ({in_use}/{capacity} in use)"),
            EventKind::PhaseCompleted { phase, .. } => format!("{phase} done"),
            EventKind::Completed { cycle_time, .. } => {
                format!("took off after {:.1} units", self.units(*cycle_time))
            }
            EventKind::Alert {
                state,
                waited,
                starvation_cause,
                ..
            } => {
                let mut s = format!("ALERT waiting {:.1} units in {state}", self.units(*waited));
                if let Some(n) = starvation_cause {
                    s.push_str(&format!(", starvation: {n} international flights live"));
                }
                s
            }
            EventKind::Crashed {
                state,
                waited,
                released,
                severe_starvation,
                ..
            } => {
                let mut s = format!(
                    "CRASHED after {:.1} units in {state}, released [{released}]",
                    self.units(*waited),
                );
                if *severe_starvation {
                    s.push_str(", severe starvation");
                }
                s
            }
            EventKind::ForcedTermination {
                state, released, ..
            } => format!("terminated at shutdown in {state}, released [{released}]"),
            EventKind::Liveness(report) => summary::liveness(report),
        };
        println!("[{at:7.1}] {subject}: {line}");
    }

    fn on_finish(&mut self, report: &SimulationReport) {
        summary::print(report, self.unit);
    }
}
