//! Flight classes, the per-aircraft lifecycle state machine and phases.
//!
//! An aircraft moves strictly forward through
//!
//! ```text
//! WaitingLanding → Landing → WaitingDisembark → Disembarking
//!     → WaitingTakeoff → TakingOff → Completed
//! ```
//!
//! with a single escape edge into `Crashed` from every non-terminal state.

use std::fmt;

use crate::resource::ResourceKind;

/// Flight class, fixed at creation.
///
/// The class decides the order in which a phase's two resources are
/// requested. The asymmetry between classes is the mechanism behind both
/// the priority starvation and the circular-wait deadlock the simulator
/// exists to expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlightClass {
    /// Requests the tower channel first, then the runway or gate.
    Domestic,
    /// Requests the runway or gate first, then the tower channel.
    International,
}

impl FlightClass {
    /// Both classes, in index order.
    pub const ALL: [FlightClass; 2] = [FlightClass::Domestic, FlightClass::International];

    /// Dense index for per-class counters.
    pub fn index(self) -> usize {
        match self {
            Self::Domestic => 0,
            Self::International => 1,
        }
    }

    /// The other class.
    pub fn other(self) -> Self {
        match self {
            Self::Domestic => Self::International,
            Self::International => Self::Domestic,
        }
    }

    /// Three-letter tag used in log lines and reports.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Domestic => "DOM",
            Self::International => "INT",
        }
    }
}

impl fmt::Display for FlightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domestic => write!(f, "domestic"),
            Self::International => write!(f, "international"),
        }
    }
}

/// Lifecycle state of one aircraft.
///
/// Written only by the aircraft's own worker; read by anyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum AircraftState {
    /// Waiting for the runway and tower channel to land.
    WaitingLanding = 0,
    /// Holding runway and tower channel while landing.
    Landing = 1,
    /// Waiting for a gate and the tower channel.
    WaitingDisembark = 2,
    /// Holding gate and tower channel while passengers disembark.
    Disembarking = 3,
    /// Holding a gate, waiting for the runway and tower channel.
    WaitingTakeoff = 4,
    /// Holding gate, runway and tower channel while taking off.
    TakingOff = 5,
    /// Terminal: took off and released everything.
    Completed = 6,
    /// Terminal: timed out, or was force-terminated at shutdown.
    Crashed = 7,
}

impl AircraftState {
    /// Every state, in discriminant order.
    pub const ALL: [AircraftState; 8] = [
        AircraftState::WaitingLanding,
        AircraftState::Landing,
        AircraftState::WaitingDisembark,
        AircraftState::Disembarking,
        AircraftState::WaitingTakeoff,
        AircraftState::TakingOff,
        AircraftState::Completed,
        AircraftState::Crashed,
    ];

    /// Encode for storage in an `AtomicU8`.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a value previously produced by [`as_u8`](Self::as_u8).
    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.get(v as usize).copied()
    }

    /// `Completed` or `Crashed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Crashed)
    }

    /// One of the three `Waiting*` states.
    pub fn is_waiting(self) -> bool {
        matches!(
            self,
            Self::WaitingLanding | Self::WaitingDisembark | Self::WaitingTakeoff
        )
    }

    /// The state that follows this one on the non-crash path.
    ///
    /// `None` for terminal states.
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::WaitingLanding => Some(Self::Landing),
            Self::Landing => Some(Self::WaitingDisembark),
            Self::WaitingDisembark => Some(Self::Disembarking),
            Self::Disembarking => Some(Self::WaitingTakeoff),
            Self::WaitingTakeoff => Some(Self::TakingOff),
            Self::TakingOff => Some(Self::Completed),
            Self::Completed | Self::Crashed => None,
        }
    }

    /// Whether `self → next` is an edge of the lifecycle state machine.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Self::Crashed || self.successor() == Some(next)
    }
}

impl fmt::Display for AircraftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WaitingLanding => "waiting-landing",
            Self::Landing => "landing",
            Self::WaitingDisembark => "waiting-disembark",
            Self::Disembarking => "disembarking",
            Self::WaitingTakeoff => "waiting-takeoff",
            Self::TakingOff => "taking-off",
            Self::Completed => "completed",
            Self::Crashed => "crashed",
        };
        f.write_str(s)
    }
}

/// One unit of work requiring two resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Runway + tower channel.
    Landing,
    /// Gate + tower channel. The gate is kept for takeoff.
    Disembark,
    /// Runway + tower channel, with the gate still held.
    Takeoff,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ALL: [Phase; 3] = [Phase::Landing, Phase::Disembark, Phase::Takeoff];

    /// Dense index for per-phase counters.
    pub fn index(self) -> usize {
        match self {
            Self::Landing => 0,
            Self::Disembark => 1,
            Self::Takeoff => 2,
        }
    }

    /// State while the phase's resources are being requested.
    pub fn waiting_state(self) -> AircraftState {
        match self {
            Self::Landing => AircraftState::WaitingLanding,
            Self::Disembark => AircraftState::WaitingDisembark,
            Self::Takeoff => AircraftState::WaitingTakeoff,
        }
    }

    /// State while the phase's resources are held.
    pub fn active_state(self) -> AircraftState {
        match self {
            Self::Landing => AircraftState::Landing,
            Self::Disembark => AircraftState::Disembarking,
            Self::Takeoff => AircraftState::TakingOff,
        }
    }

    /// The order in which `class` requests this phase's resources.
    ///
    /// International flights take the scarce resource first and the tower
    /// second; domestic flights do the opposite.
    pub fn acquisition_order(self, class: FlightClass) -> [ResourceKind; 2] {
        let primary = match self {
            Self::Landing | Self::Takeoff => ResourceKind::Runway,
            Self::Disembark => ResourceKind::Gate,
        };
        match class {
            FlightClass::International => [primary, ResourceKind::Tower],
            FlightClass::Domestic => [ResourceKind::Tower, primary],
        }
    }

    /// Resources released, in order, when the phase completes normally.
    ///
    /// Disembark frees only the tower; the gate stays held until takeoff
    /// completes.
    pub fn release_order(self) -> &'static [ResourceKind] {
        match self {
            Self::Landing => &[ResourceKind::Runway, ResourceKind::Tower],
            Self::Disembark => &[ResourceKind::Tower],
            Self::Takeoff => &[ResourceKind::Gate, ResourceKind::Runway, ResourceKind::Tower],
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Landing => write!(f, "landing"),
            Self::Disembark => write!(f, "disembark"),
            Self::Takeoff => write!(f, "takeoff"),
        }
    }
}
