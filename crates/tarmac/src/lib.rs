//! Tarmac: an airport contention simulator.
//!
//! Aircraft run as OS threads and compete for three counted resources
//! (runways, gates and tower channels) through a landing, disembark and
//! takeoff lifecycle. Domestic and international flights request the
//! tower in opposite orders, which is enough to produce starvation,
//! circular waits and timeout crashes under load. A monitor thread
//! diagnoses those conditions while the run is live.
//!
//! This is the facade crate. It re-exports the public API of the
//! sub-crates; most users only need `tarmac` as a dependency.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use tarmac::prelude::*;
//!
//! let config = SimConfig {
//!     duration: 20,
//!     time_unit: std::time::Duration::from_millis(10),
//!     ..SimConfig::default()
//! };
//! let report = Simulation::run(config, NullReporter).unwrap();
//! println!(
//!     "{} created, {} completed, {} crashed",
//!     report.stats.created, report.stats.completed, report.stats.crashed,
//! );
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tarmac-core` | IDs, classes, lifecycle states, resources, events, errors |
//! | [`engine`] | `tarmac-engine` | Pool, workers, generator, monitor, statistics, orchestrator |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core vocabulary (`tarmac-core`).
///
/// The lifecycle state machine ([`types::AircraftState`]), the closed
/// event type ([`types::EventKind`]) and the liveness diagnosis types.
pub use tarmac_core as types;

/// The threaded engine (`tarmac-engine`).
///
/// Start a run with [`engine::Simulation`]; observe it through an
/// [`engine::Reporter`].
pub use tarmac_engine as engine;

/// Common imports for typical tarmac usage.
///
/// ```rust
/// use tarmac::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tarmac_core::{
        AircraftId, AircraftState, Diagnosis, EventKind, FlightClass, LivenessReport, Phase,
        ResourceKind, ResourceSet, SimEvent,
    };

    // Errors
    pub use tarmac_core::PoolError;
    pub use tarmac_engine::{ConfigError, SpawnError};

    // Configuration
    pub use tarmac_engine::{
        Arrival, ArrivalPlan, MonitorConfig, ResourceCapacities, SimConfig, UnitRange,
    };

    // Running and observing
    pub use tarmac_engine::{
        NullReporter, Reporter, RunningSimulation, ShutdownReport, Simulation, SimulationReport,
        StatsSnapshot,
    };
}
