//! Core types for the tarmac airport contention simulator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the engine, the reporters and the tests: aircraft
//! identifiers, flight classes, the lifecycle state machine, shared
//! resource kinds, the closed event type and the error enums.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod flight;
pub mod id;
pub mod resource;

pub use error::{PoolError, MAX_CAPACITY};
pub use event::{Diagnosis, EventKind, LivenessReport, SimEvent, StateHistogram};
pub use flight::{AircraftState, FlightClass, Phase};
pub use id::AircraftId;
pub use resource::{ResourceKind, ResourceSet, Usage};
