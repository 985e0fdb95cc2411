//! The closed event type flowing from the simulation to its consumers.
//!
//! Every observable occurrence in a run is one [`EventKind`] variant. The
//! statistics aggregator and the reporter each consume the stream with a
//! single exhaustive `match`; adding a variant is a compile error in both.

use std::fmt;
use std::time::Duration;

use crate::flight::{AircraftState, FlightClass, Phase};
use crate::id::AircraftId;
use crate::resource::{ResourceKind, ResourceSet, Usage};

/// A timestamped event.
#[derive(Clone, Debug, PartialEq)]
pub struct SimEvent {
    /// Wall time since the simulation started.
    pub at: Duration,
    /// What happened.
    pub kind: EventKind,
}

/// Everything the simulation reports.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    /// An aircraft entered the airspace and its worker started.
    Created {
        /// The new aircraft.
        aircraft: AircraftId,
        /// Its class.
        class: FlightClass,
    },
    /// The generator could not start a worker for a new aircraft.
    SpawnFailed {
        /// The identifier consumed by the failed attempt.
        aircraft: AircraftId,
        /// Class drawn for the failed attempt.
        class: FlightClass,
        /// Why the worker could not start.
        reason: String,
    },
    /// A lifecycle transition on the non-crash path.
    StateChanged {
        /// The aircraft.
        aircraft: AircraftId,
        /// Its class.
        class: FlightClass,
        /// State left.
        from: AircraftState,
        /// State entered.
        to: AircraftState,
    },
    /// A resource unit was granted.
    ResourceAcquired {
        /// The holder.
        aircraft: AircraftId,
        /// Its class.
        class: FlightClass,
        /// Which resource.
        resource: ResourceKind,
        /// Units in use after the grant.
        in_use: u32,
        /// Resource capacity.
        capacity: u32,
    },
    /// A resource unit was returned.
    ResourceReleased {
        /// The former holder.
        aircraft: AircraftId,
        /// Its class.
        class: FlightClass,
        /// Which resource.
        resource: ResourceKind,
        /// Units in use after the release.
        in_use: u32,
        /// Resource capacity.
        capacity: u32,
    },
    /// A phase's hold elapsed and its resources were released.
    PhaseCompleted {
        /// The aircraft.
        aircraft: AircraftId,
        /// Its class.
        class: FlightClass,
        /// The phase just finished.
        phase: Phase,
    },
    /// The aircraft took off and holds nothing.
    Completed {
        /// The aircraft.
        aircraft: AircraftId,
        /// Its class.
        class: FlightClass,
        /// Creation to completion.
        cycle_time: Duration,
    },
    /// The alert threshold was crossed in the current waiting phase.
    Alert {
        /// The waiting aircraft.
        aircraft: AircraftId,
        /// Its class.
        class: FlightClass,
        /// State at the time of the alert.
        state: AircraftState,
        /// Time spent in the current waiting phase.
        waited: Duration,
        /// For a domestic aircraft, the number of live international
        /// aircraft when that number is non-zero: the probable cause.
        starvation_cause: Option<usize>,
    },
    /// The crash threshold was crossed. Terminal.
    Crashed {
        /// The aircraft.
        aircraft: AircraftId,
        /// Its class.
        class: FlightClass,
        /// State the crash interrupted.
        state: AircraftState,
        /// Time spent in the current waiting phase.
        waited: Duration,
        /// Live domestic aircraft at crash time, this one excluded.
        live_domestic: usize,
        /// Live international aircraft at crash time, this one excluded.
        live_international: usize,
        /// Resources released on the way down.
        released: ResourceSet,
        /// A domestic crash while international traffic was live.
        severe_starvation: bool,
    },
    /// The aircraft was still live after the drain deadline and was
    /// unblocked and terminated by the shutdown sequence. Not a crash.
    ForcedTermination {
        /// The straggler.
        aircraft: AircraftId,
        /// Its class.
        class: FlightClass,
        /// State at termination.
        state: AircraftState,
        /// Resources released on the way out.
        released: ResourceSet,
    },
    /// The liveness monitor found a problem this cycle.
    Liveness(LivenessReport),
}

impl EventKind {
    /// The aircraft this event is about, if any.
    pub fn aircraft(&self) -> Option<AircraftId> {
        match self {
            Self::Created { aircraft, .. }
            | Self::SpawnFailed { aircraft, .. }
            | Self::StateChanged { aircraft, .. }
            | Self::ResourceAcquired { aircraft, .. }
            | Self::ResourceReleased { aircraft, .. }
            | Self::PhaseCompleted { aircraft, .. }
            | Self::Completed { aircraft, .. }
            | Self::Alert { aircraft, .. }
            | Self::Crashed { aircraft, .. }
            | Self::ForcedTermination { aircraft, .. } => Some(*aircraft),
            Self::Liveness(_) => None,
        }
    }

    /// The class of the aircraft this event is about, if any.
    pub fn class(&self) -> Option<FlightClass> {
        match self {
            Self::Created { class, .. }
            | Self::SpawnFailed { class, .. }
            | Self::StateChanged { class, .. }
            | Self::ResourceAcquired { class, .. }
            | Self::ResourceReleased { class, .. }
            | Self::PhaseCompleted { class, .. }
            | Self::Completed { class, .. }
            | Self::Alert { class, .. }
            | Self::Crashed { class, .. }
            | Self::ForcedTermination { class, .. } => Some(*class),
            Self::Liveness(_) => None,
        }
    }

    /// Short stable name, for log fields and filtering.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::SpawnFailed { .. } => "spawn-failed",
            Self::StateChanged { .. } => "state-changed",
            Self::ResourceAcquired { .. } => "resource-acquired",
            Self::ResourceReleased { .. } => "resource-released",
            Self::PhaseCompleted { .. } => "phase-completed",
            Self::Completed { .. } => "completed",
            Self::Alert { .. } => "alert",
            Self::Crashed { .. } => "crashed",
            Self::ForcedTermination { .. } => "forced-termination",
            Self::Liveness(_) => "liveness",
        }
    }
}

/// Classification of a liveness problem, first matching rule wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Diagnosis {
    /// Many blocked aircraft, domestic outnumbering international more
    /// than two to one: priority-driven starvation.
    Starvation,
    /// Many blocked aircraft and at least two resources saturated at
    /// once: circular wait.
    ClassicDeadlock,
    /// Many blocked aircraft without a clearer signature.
    ExtremeContention,
    /// Only domestic aircraft are blocked: the priority-inversion
    /// signature, reported without the full deadlock report.
    DomesticOnlyStarvation,
}

impl Diagnosis {
    /// All diagnoses, in index order.
    pub const ALL: [Diagnosis; 4] = [
        Diagnosis::Starvation,
        Diagnosis::ClassicDeadlock,
        Diagnosis::ExtremeContention,
        Diagnosis::DomesticOnlyStarvation,
    ];

    /// Dense index for per-diagnosis counters.
    pub fn index(self) -> usize {
        match self {
            Self::Starvation => 0,
            Self::ClassicDeadlock => 1,
            Self::ExtremeContention => 2,
            Self::DomesticOnlyStarvation => 3,
        }
    }

    /// Whether this is a "possible deadlock/starvation" report, as
    /// opposed to the lighter domestic-only signal.
    pub fn is_deadlock_report(self) -> bool {
        !matches!(self, Self::DomesticOnlyStarvation)
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starvation => write!(f, "starvation (priority-driven)"),
            Self::ClassicDeadlock => write!(f, "classic deadlock (circular wait)"),
            Self::ExtremeContention => write!(f, "extreme contention"),
            Self::DomesticOnlyStarvation => write!(f, "domestic-only starvation"),
        }
    }
}

/// Count of live aircraft per lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateHistogram([usize; 8]);

impl StateHistogram {
    /// Count one aircraft in `state`.
    pub fn add(&mut self, state: AircraftState) {
        self.0[state.as_u8() as usize] += 1;
    }

    /// Aircraft counted in `state`.
    pub fn get(&self, state: AircraftState) -> usize {
        self.0[state.as_u8() as usize]
    }

    /// Non-zero buckets in lifecycle order.
    pub fn non_zero(&self) -> impl Iterator<Item = (AircraftState, usize)> + '_ {
        AircraftState::ALL
            .into_iter()
            .map(|s| (s, self.get(s)))
            .filter(|(_, n)| *n > 0)
    }

    /// Sum over all buckets.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

/// What the liveness monitor saw when it raised a diagnosis.
#[derive(Clone, Debug, PartialEq)]
pub struct LivenessReport {
    /// The classification.
    pub diagnosis: Diagnosis,
    /// Live aircraft scanned.
    pub live: usize,
    /// Live aircraft waiting longer than the blocked bucket.
    pub blocked: usize,
    /// Live aircraft waiting longer than the critical bucket.
    pub critical: usize,
    /// Domestic share of `blocked`.
    pub domestic_blocked: usize,
    /// International share of `blocked`.
    pub international_blocked: usize,
    /// Resources with every unit granted at scan time.
    pub saturated: ResourceSet,
    /// Occupancy of every resource at scan time.
    pub usage: [Usage; 3],
    /// Live aircraft per state at scan time.
    pub states: StateHistogram,
}
