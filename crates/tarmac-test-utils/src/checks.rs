//! Whole-run property checks over an event stream.
//!
//! Each check panics with a message naming the offending aircraft or
//! resource, so they read naturally inside `#[test]` functions.

use std::collections::HashMap;

use tarmac_core::{AircraftId, AircraftState, EventKind, ResourceKind, SimEvent};
use tarmac_engine::SimulationReport;

/// The non-crash path, in order.
pub const LIFECYCLE: [AircraftState; 7] = [
    AircraftState::WaitingLanding,
    AircraftState::Landing,
    AircraftState::WaitingDisembark,
    AircraftState::Disembarking,
    AircraftState::WaitingTakeoff,
    AircraftState::TakingOff,
    AircraftState::Completed,
];

/// States each aircraft passed through, starting at `WaitingLanding`.
pub fn state_sequences(events: &[SimEvent]) -> HashMap<AircraftId, Vec<AircraftState>> {
    let mut seqs: HashMap<AircraftId, Vec<AircraftState>> = HashMap::new();
    for e in events {
        match &e.kind {
            EventKind::Created { aircraft, .. } => {
                seqs.insert(*aircraft, vec![AircraftState::WaitingLanding]);
            }
            EventKind::StateChanged { aircraft, to, .. } => {
                seqs.entry(*aircraft).or_default().push(*to);
            }
            _ => {}
        }
    }
    seqs
}

/// Every aircraft's transitions are a prefix of [`LIFECYCLE`], optionally
/// followed by a single move into `Crashed`.
pub fn assert_lifecycle_prefixes(events: &[SimEvent]) {
    for (id, seq) in state_sequences(events) {
        let (path, crashed) = match seq.split_last() {
            Some((AircraftState::Crashed, rest)) => (rest, true),
            _ => (&seq[..], false),
        };
        let from_completed = crashed && path.last() == Some(&AircraftState::Completed);
        assert!(
            !from_completed && path.len() <= LIFECYCLE.len() && path[..] == LIFECYCLE[..path.len()],
            "aircraft {id}: states {seq:?} are not a lifecycle prefix",
        );
    }
}

/// No acquisition ever reported more units than capacity, and per
/// resource grants and releases balance once every aircraft is terminal.
pub fn assert_capacity_respected(events: &[SimEvent]) {
    let mut outstanding = [0i64; 3];
    for e in events {
        match &e.kind {
            EventKind::ResourceAcquired {
                resource,
                in_use,
                capacity,
                ..
            } => {
                assert!(
                    in_use <= capacity,
                    "{resource}: {in_use} in use exceeds capacity {capacity}",
                );
                outstanding[resource.index()] += 1;
            }
            EventKind::ResourceReleased { resource, .. } => {
                outstanding[resource.index()] -= 1;
            }
            _ => {}
        }
    }
    for kind in ResourceKind::ALL {
        assert_eq!(
            outstanding[kind.index()],
            0,
            "{kind}: grants and releases do not balance",
        );
    }
}

/// Every aircraft in the final report is terminal and holds nothing.
pub fn assert_all_terminal_and_empty(report: &SimulationReport) {
    for v in &report.aircraft {
        assert!(v.state.is_terminal(), "aircraft {} still {}", v.id, v.state);
        assert!(v.held.is_empty(), "aircraft {} ended holding {}", v.id, v.held);
    }
}
