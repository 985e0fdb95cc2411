//! Benchmark profiles and fixtures for the tarmac simulator.
//!
//! - [`contended_profile`]: single-unit airport, heavy traffic
//! - [`synthetic_events`]: a deterministic event stream for aggregator benches
//! - [`synthetic_views`]: a live-aircraft scan for diagnosis benches

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::time::Duration;

use tarmac_core::{
    AircraftId, AircraftState, EventKind, FlightClass, Phase, ResourceKind, ResourceSet, SimEvent,
};
use tarmac_engine::{AircraftView, ResourceCapacities, SimConfig, UnitRange};

/// One runway, gate and tower channel; arrivals every unit; 1 ms units.
pub fn contended_profile(seed: u64) -> SimConfig {
    SimConfig {
        capacities: ResourceCapacities::uniform(1),
        duration: 50,
        max_aircraft: 40,
        arrival_interval: UnitRange::fixed(1),
        alert_threshold: 10,
        crash_threshold: Some(15),
        acquire_poll: 1,
        drain_deadline: 200,
        abort_grace: 200,
        time_unit: Duration::from_millis(1),
        seed,
        ..SimConfig::default()
    }
}

fn class_of(i: u64) -> FlightClass {
    if i % 2 == 0 {
        FlightClass::Domestic
    } else {
        FlightClass::International
    }
}

/// The events of `aircraft` complete lifecycles, interleaved by aircraft.
pub fn synthetic_events(aircraft: u64) -> Vec<SimEvent> {
    let mut out = Vec::new();
    let mut t = 0u64;
    let mut push = |kind: EventKind| {
        t += 1;
        out.push(SimEvent {
            at: Duration::from_micros(t),
            kind,
        });
    };
    for i in 0..aircraft {
        let id = AircraftId(i);
        let class = class_of(i);
        push(EventKind::Created { aircraft: id, class });
        for phase in Phase::ALL {
            for resource in phase.acquisition_order(class) {
                push(EventKind::ResourceAcquired {
                    aircraft: id,
                    class,
                    resource,
                    in_use: 1,
                    capacity: 3,
                });
            }
            for &resource in phase.release_order() {
                push(EventKind::ResourceReleased {
                    aircraft: id,
                    class,
                    resource,
                    in_use: 0,
                    capacity: 3,
                });
            }
            push(EventKind::PhaseCompleted {
                aircraft: id,
                class,
                phase,
            });
        }
        push(EventKind::Completed {
            aircraft: id,
            class,
            cycle_time: Duration::from_millis(10),
        });
    }
    out
}

/// `n` live aircraft in `WaitingLanding`, waits spread over 0..60 units.
pub fn synthetic_views(n: u64, unit: Duration) -> Vec<AircraftView> {
    (0..n)
        .map(|i| AircraftView {
            id: AircraftId(i),
            class: class_of(i),
            state: AircraftState::WaitingLanding,
            waited: unit.saturating_mul((i % 60) as u32),
            alert_raised: false,
            crashed: false,
            force_terminated: false,
            held: if i % 3 == 0 {
                ResourceSet::EMPTY
            } else {
                [ResourceKind::Tower].into_iter().collect()
            },
        })
        .collect()
}
