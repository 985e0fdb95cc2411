//! Millisecond-scale configurations and arrival scripts.

use std::time::Duration;

use tarmac_core::{FlightClass, ResourceKind};
use tarmac_engine::{
    Acquire, Arrival, ArrivalPlan, Permit, ResourceCapacities, ResourcePool, SimConfig, UnitRange,
};

/// The default protocol with `unit_ms` milliseconds per time unit, fixed
/// one-unit holds, a one-unit acquire poll, and shutdown budgets generous
/// enough for a loaded CI machine.
pub fn fast_config(unit_ms: u64) -> SimConfig {
    let unit = Duration::from_millis(unit_ms.max(1));
    // Drain and abort budgets in wall time, whatever the unit.
    let budget = |ms: u64| (ms / unit_ms.max(1)).max(1) as u32;
    SimConfig {
        time_unit: unit,
        landing_hold: UnitRange::fixed(1),
        disembark_hold: UnitRange::fixed(1),
        takeoff_hold: UnitRange::fixed(1),
        turnaround_pause: 1,
        acquire_poll: 1,
        drain_deadline: budget(2_000),
        abort_grace: budget(2_000),
        ..SimConfig::default()
    }
}

/// Every capacity set to one.
pub fn single_unit() -> ResourceCapacities {
    ResourceCapacities::uniform(1)
}

/// A scripted plan from `(units after previous, class)` pairs.
pub fn script(arrivals: &[(u32, FlightClass)]) -> ArrivalPlan {
    ArrivalPlan::Scripted(
        arrivals
            .iter()
            .map(|&(after, class)| Arrival::new(after, class))
            .collect(),
    )
}

/// Take one unit of `kind` from `pool` and keep it, standing in for an
/// aircraft that never lets go.
///
/// # Panics
///
/// If the unit is not free within one second.
pub fn hold(pool: &ResourcePool, kind: ResourceKind) -> Permit {
    match pool.acquire(kind, Duration::from_secs(1)) {
        Acquire::Granted(permit) => permit,
        other => panic!("could not take a {kind} unit: {other:?}"),
    }
}
