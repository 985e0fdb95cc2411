//! Strongly-typed identifiers.

use std::fmt;

/// Identifies an aircraft for the lifetime of one simulation run.
///
/// Assigned from a monotonic sequence by the generator, starting at 1.
/// Never reused, even when starting the aircraft's worker fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AircraftId(pub u64);

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AircraftId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
