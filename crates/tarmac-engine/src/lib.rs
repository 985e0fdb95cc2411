//! Threaded airport contention engine.
//!
//! One OS thread per live aircraft drives the landing → disembark →
//! takeoff lifecycle against a shared [`ResourcePool`](pool::ResourcePool).
//! A generator thread creates aircraft, a monitor thread diagnoses
//! deadlock and starvation from live state, and a reporter thread hands
//! the ordered event stream to a [`Reporter`](report::Reporter).
//! [`Simulation`](simulation::Simulation) wires them together and owns
//! the shutdown state machine.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod aircraft;
pub mod clock;
pub mod config;
pub mod generator;
pub mod lifecycle;
pub mod monitor;
pub mod policy;
pub mod pool;
pub mod report;
pub mod simulation;
pub mod stats;
mod sync;

pub use aircraft::{Aircraft, AircraftRegistry, AircraftView};
pub use clock::{SimClock, StopHandle, StopToken};
pub use config::{Arrival, ArrivalPlan, ConfigError, MonitorConfig, SimConfig, UnitRange};
pub use generator::{SpawnError, ThreadSpawner, WorkerJob, WorkerSpawner};
pub use monitor::diagnose;
pub use policy::{TimeoutPolicy, Verdict};
pub use pool::{Acquire, Permit, ResourceCapacities, ResourcePool};
pub use report::{NullReporter, Reporter};
pub use simulation::{
    RunningSimulation, ShutdownReport, ShutdownState, Simulation, SimulationReport,
};
pub use stats::{fairness_index, ClassTotals, Statistics, StatsSnapshot};
