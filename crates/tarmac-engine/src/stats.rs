//! Statistics aggregator.
//!
//! [`Statistics::record`] folds each [`SimEvent`] into monotonically
//! increasing counters with one exhaustive `match`. Derived metrics
//! (mean cycle time, completion rates, fairness) are computed from the
//! counters by [`Statistics::snapshot`] and never stored.

use std::sync::Mutex;
use std::time::Duration;

use tarmac_core::{Diagnosis, EventKind, FlightClass, Phase, ResourceKind, SimEvent};

use crate::sync::lock;

/// Per-class counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassTotals {
    /// Aircraft created.
    pub created: usize,
    /// Aircraft that took off.
    pub completed: usize,
    /// Aircraft crashed by the timeout policy.
    pub crashed: usize,
    /// Aircraft terminated by the shutdown sequence.
    pub forced: usize,
    /// Alerts raised.
    pub alerts: usize,
}

impl ClassTotals {
    /// `completed / created`, or `None` before the first creation.
    pub fn completion_rate(&self) -> Option<f64> {
        (self.created > 0).then(|| self.completed as f64 / self.created as f64)
    }
}

/// Ratio of the lower to the higher per-class completion rate.
///
/// `None` unless both classes have at least one created aircraft. Two
/// zero rates are equal, so they score 1.0.
pub fn fairness_index(domestic: &ClassTotals, international: &ClassTotals) -> Option<f64> {
    let d = domestic.completion_rate()?;
    let i = international.completion_rate()?;
    let hi = d.max(i);
    if hi == 0.0 {
        return Some(1.0);
    }
    Some(d.min(i) / hi)
}

/// Point-in-time copy of every counter plus the derived metrics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsSnapshot {
    /// Aircraft created.
    pub created: usize,
    /// Aircraft that completed takeoff.
    pub completed: usize,
    /// Aircraft crashed by the timeout policy.
    pub crashed: usize,
    /// Aircraft terminated by the shutdown sequence.
    pub forced: usize,
    /// Worker start failures.
    pub spawn_failures: usize,
    /// Alerts raised.
    pub alerts: usize,
    /// Domestic alerts raised while international traffic was live.
    pub starvation_alerts: usize,
    /// Domestic crashes while international traffic was live.
    pub severe_starvation_crashes: usize,
    /// Per-class counters, indexed by [`FlightClass::index`].
    pub per_class: [ClassTotals; 2],
    /// Completed phases, indexed by [`Phase::index`].
    pub phase_ops: [usize; 3],
    /// Grants per resource, indexed by [`ResourceKind::index`].
    pub acquisitions: [usize; 3],
    /// Releases per resource, indexed by [`ResourceKind::index`].
    pub releases: [usize; 3],
    /// Highest `in_use` seen per resource.
    pub peak_in_use: [u32; 3],
    /// Capacity per resource, as carried on resource events. Zero until
    /// the resource is first acquired.
    pub capacity: [u32; 3],
    /// Liveness reports, indexed by [`Diagnosis::index`].
    pub liveness: [usize; 4],
    /// Mean creation-to-completion time over completed aircraft.
    pub mean_cycle_time: Option<Duration>,
    /// See [`fairness_index`].
    pub fairness: Option<f64>,
}

impl StatsSnapshot {
    /// Counters for one class.
    pub fn class(&self, class: FlightClass) -> &ClassTotals {
        &self.per_class[class.index()]
    }

    /// Completed `phase` operations.
    pub fn phase(&self, phase: Phase) -> usize {
        self.phase_ops[phase.index()]
    }

    /// Reports with a given diagnosis.
    pub fn liveness_count(&self, diagnosis: Diagnosis) -> usize {
        self.liveness[diagnosis.index()]
    }

    /// Reports of the "possible deadlock/starvation" kind.
    pub fn deadlock_reports(&self) -> usize {
        Diagnosis::ALL
            .into_iter()
            .filter(|d| d.is_deadlock_report())
            .map(|d| self.liveness_count(d))
            .sum()
    }

    /// `peak_in_use / capacity` for `kind`, once it has been used.
    pub fn peak_utilization(&self, kind: ResourceKind) -> Option<f64> {
        let cap = self.capacity[kind.index()];
        (cap > 0).then(|| self.peak_in_use[kind.index()] as f64 / cap as f64)
    }

    /// Aircraft that reached a terminal state.
    pub fn terminated(&self) -> usize {
        self.completed + self.crashed + self.forced
    }
}

#[derive(Debug, Default)]
struct StatsState {
    counters: StatsSnapshot,
    cycle_total: Duration,
}

/// Thread-safe event aggregator.
#[derive(Debug, Default)]
pub struct Statistics {
    state: Mutex<StatsState>,
}

impl Statistics {
    /// Empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the counters.
    pub fn record(&self, event: &SimEvent) {
        let mut st = lock(&self.state);
        let StatsState {
            counters: c,
            cycle_total,
        } = &mut *st;
        match &event.kind {
            EventKind::Created { class, .. } => {
                c.created += 1;
                c.per_class[class.index()].created += 1;
            }
            EventKind::SpawnFailed { .. } => c.spawn_failures += 1,
            EventKind::StateChanged { .. } => {}
            EventKind::ResourceAcquired {
                resource,
                in_use,
                capacity,
                ..
            } => {
                let i = resource.index();
                c.acquisitions[i] += 1;
                c.peak_in_use[i] = c.peak_in_use[i].max(*in_use);
                c.capacity[i] = *capacity;
            }
            EventKind::ResourceReleased { resource, .. } => c.releases[resource.index()] += 1,
            EventKind::PhaseCompleted { phase, .. } => c.phase_ops[phase.index()] += 1,
            EventKind::Completed {
                class, cycle_time, ..
            } => {
                c.completed += 1;
                c.per_class[class.index()].completed += 1;
                *cycle_total += *cycle_time;
            }
            EventKind::Alert {
                class,
                starvation_cause,
                ..
            } => {
                c.alerts += 1;
                c.per_class[class.index()].alerts += 1;
                if starvation_cause.is_some() {
                    c.starvation_alerts += 1;
                }
            }
            EventKind::Crashed {
                class,
                severe_starvation,
                ..
            } => {
                c.crashed += 1;
                c.per_class[class.index()].crashed += 1;
                if *severe_starvation {
                    c.severe_starvation_crashes += 1;
                }
            }
            EventKind::ForcedTermination { class, .. } => {
                c.forced += 1;
                c.per_class[class.index()].forced += 1;
            }
            EventKind::Liveness(report) => c.liveness[report.diagnosis.index()] += 1,
        }
    }

    /// Counters plus derived metrics. Repeated calls without new events
    /// return equal snapshots.
    pub fn snapshot(&self) -> StatsSnapshot {
        let st = lock(&self.state);
        let mut snap = st.counters.clone();
        snap.mean_cycle_time =
            (snap.completed > 0).then(|| st.cycle_total / snap.completed as u32);
        snap.fairness = fairness_index(
            &snap.per_class[FlightClass::Domestic.index()],
            &snap.per_class[FlightClass::International.index()],
        );
        snap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tarmac_core::{
        AircraftId, AircraftState, LivenessReport, ResourceSet, StateHistogram, Usage,
    };

    fn ev(kind: EventKind) -> SimEvent {
        SimEvent {
            at: Duration::ZERO,
            kind,
        }
    }

    fn created(id: u64, class: FlightClass) -> SimEvent {
        ev(EventKind::Created {
            aircraft: AircraftId(id),
            class,
        })
    }

    fn completed(id: u64, class: FlightClass, secs: u64) -> SimEvent {
        ev(EventKind::Completed {
            aircraft: AircraftId(id),
            class,
            cycle_time: Duration::from_secs(secs),
        })
    }

    #[test]
    fn counts_lifecycle_outcomes_per_class() {
        let s = Statistics::new();
        s.record(&created(0, FlightClass::Domestic));
        s.record(&created(1, FlightClass::International));
        s.record(&created(2, FlightClass::International));
        s.record(&completed(1, FlightClass::International, 10));
        s.record(&completed(2, FlightClass::International, 20));
        s.record(&ev(EventKind::Crashed {
            aircraft: AircraftId(0),
            class: FlightClass::Domestic,
            state: AircraftState::WaitingLanding,
            waited: Duration::from_secs(91),
            live_domestic: 0,
            live_international: 2,
            released: ResourceSet::EMPTY,
            severe_starvation: true,
        }));

        let snap = s.snapshot();
        assert_eq!(snap.created, 3);
        assert_eq!(snap.completed, 2);
        assert_eq!(snap.crashed, 1);
        assert_eq!(snap.severe_starvation_crashes, 1);
        assert_eq!(snap.class(FlightClass::International).completed, 2);
        assert_eq!(snap.class(FlightClass::Domestic).crashed, 1);
        assert_eq!(snap.mean_cycle_time, Some(Duration::from_secs(15)));
        assert_eq!(snap.fairness, Some(0.0));
        assert_eq!(snap.terminated(), 3);
    }

    #[test]
    fn peaks_come_from_resource_events() {
        let s = Statistics::new();
        for in_use in [1, 2, 1] {
            s.record(&ev(EventKind::ResourceAcquired {
                aircraft: AircraftId(0),
                class: FlightClass::Domestic,
                resource: ResourceKind::Gate,
                in_use,
                capacity: 5,
            }));
        }
        let snap = s.snapshot();
        assert_eq!(snap.acquisitions[ResourceKind::Gate.index()], 3);
        assert_eq!(snap.peak_in_use[ResourceKind::Gate.index()], 2);
        assert_eq!(snap.peak_utilization(ResourceKind::Gate), Some(0.4));
        assert_eq!(snap.peak_utilization(ResourceKind::Runway), None);
    }

    #[test]
    fn liveness_reports_are_counted_by_diagnosis() {
        let s = Statistics::new();
        let report = LivenessReport {
            diagnosis: Diagnosis::ClassicDeadlock,
            live: 4,
            blocked: 4,
            critical: 0,
            domestic_blocked: 2,
            international_blocked: 2,
            saturated: ResourceSet::EMPTY,
            usage: ResourceKind::ALL.map(|kind| Usage {
                kind,
                in_use: 1,
                capacity: 1,
                peak: 1,
            }),
            states: StateHistogram::default(),
        };
        s.record(&ev(EventKind::Liveness(report.clone())));
        s.record(&ev(EventKind::Liveness(LivenessReport {
            diagnosis: Diagnosis::DomesticOnlyStarvation,
            ..report
        })));
        let snap = s.snapshot();
        assert_eq!(snap.liveness_count(Diagnosis::ClassicDeadlock), 1);
        assert_eq!(snap.deadlock_reports(), 1);
    }

    #[test]
    fn snapshot_is_stable_without_new_events() {
        let s = Statistics::new();
        s.record(&created(0, FlightClass::Domestic));
        assert_eq!(s.snapshot(), s.snapshot());
    }

    #[test]
    fn fairness_needs_both_classes() {
        let dom = ClassTotals {
            created: 2,
            completed: 1,
            ..ClassTotals::default()
        };
        assert_eq!(fairness_index(&dom, &ClassTotals::default()), None);
        let int = ClassTotals {
            created: 4,
            completed: 4,
            ..ClassTotals::default()
        };
        assert_eq!(fairness_index(&dom, &int), Some(0.5));
        let idle = ClassTotals {
            created: 3,
            ..ClassTotals::default()
        };
        assert_eq!(fairness_index(&idle, &idle), Some(1.0));
    }

    proptest! {
        #[test]
        fn fairness_lies_in_unit_interval(
            dc in 1usize..500, di in 1usize..500,
            dp in 0usize..=100, ip in 0usize..=100,
        ) {
            let dom = ClassTotals { created: dc, completed: dc * dp / 100, ..ClassTotals::default() };
            let int = ClassTotals { created: di, completed: di * ip / 100, ..ClassTotals::default() };
            let f = fairness_index(&dom, &int).unwrap();
            prop_assert!((0.0..=1.0).contains(&f));
            // Symmetric in its arguments.
            prop_assert_eq!(fairness_index(&int, &dom), Some(f));
        }
    }
}
