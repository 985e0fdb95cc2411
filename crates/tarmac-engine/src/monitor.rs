//! Liveness monitor.
//!
//! Every `period` units the monitor scans all live aircraft and runs
//! [`diagnose`], a pure function of the scan. Rules, first match wins:
//!
//! 1. `blocked ≥ blocked_quorum` or `critical ≥ critical_quorum`:
//!    - domestic blocked > 2 × international blocked → starvation
//!    - else ≥ 2 resources saturated → classic deadlock
//!    - else → extreme contention
//! 2. some domestic blocked and no international blocked → domestic-only
//!    starvation
//! 3. otherwise nothing.
//!
//! The monitor never touches aircraft state; it only reads views and
//! pool usage and emits [`EventKind::Liveness`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tarmac_core::{Diagnosis, EventKind, FlightClass, LivenessReport, ResourceSet, StateHistogram, Usage};
use tracing::{debug, warn};

use crate::aircraft::{AircraftRegistry, AircraftView};
use crate::clock::{SimClock, StopToken};
use crate::config::MonitorConfig;
use crate::pool::ResourcePool;
use crate::report::EventSink;

/// Classify one scan. `unit` converts the configured buckets to wall
/// time. Terminal aircraft in `views` are ignored.
pub fn diagnose(
    views: &[AircraftView],
    usage: &[Usage; 3],
    config: &MonitorConfig,
    unit: Duration,
) -> Option<LivenessReport> {
    let blocked_after = unit.saturating_mul(config.blocked_after);
    let critical_after = unit.saturating_mul(config.critical_after);

    let mut live = 0;
    let mut blocked = 0;
    let mut critical = 0;
    let mut per_class = [0usize; 2];
    let mut states = StateHistogram::default();
    for v in views.iter().filter(|v| v.is_live()) {
        live += 1;
        states.add(v.state);
        if v.waited > blocked_after {
            blocked += 1;
            per_class[v.class.index()] += 1;
        }
        if v.waited > critical_after {
            critical += 1;
        }
    }
    let domestic_blocked = per_class[FlightClass::Domestic.index()];
    let international_blocked = per_class[FlightClass::International.index()];
    let saturated: ResourceSet = usage
        .iter()
        .filter(|u| u.is_saturated())
        .map(|u| u.kind)
        .collect();

    let diagnosis = if blocked >= config.blocked_quorum || critical >= config.critical_quorum {
        if domestic_blocked > 2 * international_blocked {
            Diagnosis::Starvation
        } else if saturated.len() >= 2 {
            Diagnosis::ClassicDeadlock
        } else {
            Diagnosis::ExtremeContention
        }
    } else if domestic_blocked > 0 && international_blocked == 0 {
        Diagnosis::DomesticOnlyStarvation
    } else {
        return None;
    };

    Some(LivenessReport {
        diagnosis,
        live,
        blocked,
        critical,
        domestic_blocked,
        international_blocked,
        saturated,
        usage: *usage,
        states,
    })
}

/// Monitor thread state.
pub(crate) struct Monitor {
    pub(crate) registry: Arc<AircraftRegistry>,
    pub(crate) pool: Arc<ResourcePool>,
    pub(crate) sink: EventSink,
    pub(crate) clock: SimClock,
    pub(crate) config: MonitorConfig,
    pub(crate) abort: StopToken,
    pub(crate) generation_stopped: Arc<AtomicBool>,
}

impl Monitor {
    /// Scan until generation has stopped and nothing is live, or abort.
    /// Returns the number of reports raised.
    pub(crate) fn run(self) -> usize {
        let mut reports = 0;
        let mut since_scan = 0;
        loop {
            if !self.abort.sleep(self.clock.unit()) {
                break;
            }
            if self.generation_stopped.load(Ordering::Acquire) && self.registry.live_count() == 0 {
                break;
            }
            since_scan += 1;
            if since_scan < self.config.period {
                continue;
            }
            since_scan = 0;
            if self.scan() {
                reports += 1;
            }
        }
        debug!(reports, "monitor stopped");
        reports
    }

    fn scan(&self) -> bool {
        let views = self.registry.live();
        let usage = self.pool.utilization();
        let Some(report) = diagnose(&views, &usage, &self.config, self.clock.unit()) else {
            return false;
        };
        warn!(
            diagnosis = %report.diagnosis,
            live = report.live,
            blocked = report.blocked,
            critical = report.critical,
            domestic_blocked = report.domestic_blocked,
            international_blocked = report.international_blocked,
            saturated = %report.saturated,
            "liveness problem detected",
        );
        self.sink.emit(EventKind::Liveness(report));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tarmac_core::{AircraftId, AircraftState, ResourceKind};

    const UNIT: Duration = Duration::from_secs(1);

    fn view(id: u64, class: FlightClass, waited_secs: u64) -> AircraftView {
        AircraftView {
            id: AircraftId(id),
            class,
            state: AircraftState::WaitingLanding,
            waited: Duration::from_secs(waited_secs),
            alert_raised: false,
            crashed: false,
            force_terminated: false,
            held: ResourceSet::EMPTY,
        }
    }

    fn usage(in_use: [u32; 3]) -> [Usage; 3] {
        let caps = [3, 5, 2];
        ResourceKind::ALL.map(|kind| Usage {
            kind,
            in_use: in_use[kind.index()],
            capacity: caps[kind.index()],
            peak: in_use[kind.index()],
        })
    }

    fn idle() -> [Usage; 3] {
        usage([0, 0, 0])
    }

    #[test]
    fn four_blocked_trigger_a_report_three_do_not() {
        let config = MonitorConfig::default();
        let mixed = [
            view(0, FlightClass::Domestic, 35),
            view(1, FlightClass::International, 35),
            view(2, FlightClass::Domestic, 40),
            view(3, FlightClass::International, 31),
        ];
        let report = diagnose(&mixed, &idle(), &config, UNIT).expect("four blocked");
        assert!(report.diagnosis.is_deadlock_report());
        assert_eq!(report.blocked, 4);
        assert_eq!(report.critical, 0);

        assert_eq!(diagnose(&mixed[..3], &idle(), &config, UNIT), None);
    }

    #[test]
    fn two_critical_are_enough() {
        let views = [
            view(0, FlightClass::International, 50),
            view(1, FlightClass::International, 46),
        ];
        let report = diagnose(&views, &idle(), &MonitorConfig::default(), UNIT).unwrap();
        assert_eq!(report.critical, 2);
        assert_eq!(report.diagnosis, Diagnosis::ExtremeContention);
    }

    #[test]
    fn sub_classification_order() {
        let config = MonitorConfig::default();
        // 3 domestic vs 1 international: starvation wins over saturation.
        let skewed = [
            view(0, FlightClass::Domestic, 31),
            view(1, FlightClass::Domestic, 31),
            view(2, FlightClass::Domestic, 31),
            view(3, FlightClass::International, 31),
        ];
        let r = diagnose(&skewed, &usage([3, 0, 2]), &config, UNIT).unwrap();
        assert_eq!(r.diagnosis, Diagnosis::Starvation);

        let balanced = [
            view(0, FlightClass::Domestic, 31),
            view(1, FlightClass::Domestic, 31),
            view(2, FlightClass::International, 31),
            view(3, FlightClass::International, 31),
        ];
        let r = diagnose(&balanced, &usage([3, 0, 2]), &config, UNIT).unwrap();
        assert_eq!(r.diagnosis, Diagnosis::ClassicDeadlock);
        assert_eq!(r.saturated.len(), 2);

        let r = diagnose(&balanced, &usage([3, 0, 1]), &config, UNIT).unwrap();
        assert_eq!(r.diagnosis, Diagnosis::ExtremeContention);
    }

    #[test]
    fn domestic_only_blocking_is_the_light_report() {
        let views = [
            view(0, FlightClass::Domestic, 31),
            view(1, FlightClass::International, 5),
        ];
        let r = diagnose(&views, &idle(), &MonitorConfig::default(), UNIT).unwrap();
        assert_eq!(r.diagnosis, Diagnosis::DomesticOnlyStarvation);
        assert!(!r.diagnosis.is_deadlock_report());
        assert_eq!(r.live, 2);
        assert_eq!(r.states.get(AircraftState::WaitingLanding), 2);
    }

    #[test]
    fn terminal_aircraft_are_ignored() {
        let mut views: Vec<_> = (0..6).map(|i| view(i, FlightClass::Domestic, 100)).collect();
        for v in &mut views {
            v.state = AircraftState::Crashed;
        }
        assert_eq!(diagnose(&views, &idle(), &MonitorConfig::default(), UNIT), None);
    }

    #[test]
    fn buckets_scale_with_the_unit() {
        let views: Vec<_> = (0..4)
            .map(|i| AircraftView {
                waited: Duration::from_millis(35),
                ..view(i, FlightClass::International, 0)
            })
            .collect();
        let unit = Duration::from_millis(1);
        assert!(diagnose(&views, &idle(), &MonitorConfig::default(), unit).is_some());
    }

    proptest! {
        #[test]
        fn no_report_without_any_blocked_aircraft(
            waits in proptest::collection::vec(0u64..=30, 0..20),
            intl in proptest::collection::vec(any::<bool>(), 20),
        ) {
            let views: Vec<_> = waits
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let class = if intl[i] { FlightClass::International } else { FlightClass::Domestic };
                    view(i as u64, class, *w)
                })
                .collect();
            prop_assert_eq!(diagnose(&views, &idle(), &MonitorConfig::default(), UNIT), None);
        }

        #[test]
        fn counts_are_consistent(
            waits in proptest::collection::vec(0u64..100, 0..20),
        ) {
            let views: Vec<_> = waits
                .iter()
                .enumerate()
                .map(|(i, w)| view(i as u64, FlightClass::ALL[i % 2], *w))
                .collect();
            if let Some(r) = diagnose(&views, &idle(), &MonitorConfig::default(), UNIT) {
                prop_assert!(r.critical <= r.blocked);
                prop_assert_eq!(r.domestic_blocked + r.international_blocked, r.blocked);
                prop_assert!(r.blocked <= r.live);
                prop_assert_eq!(r.states.total(), r.live);
            }
        }
    }
}
