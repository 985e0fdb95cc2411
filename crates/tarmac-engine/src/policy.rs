//! Timeout/crash policy.
//!
//! A pure function of how long an aircraft has spent in its current
//! waiting phase. The worker evaluates it at every poll point and acts
//! on the [`Verdict`].

use std::time::Duration;

use crate::clock::SimClock;
use crate::config::SimConfig;

/// What the worker must do at this poll point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Raise the one-shot alert for this waiting phase.
    pub alert: bool,
    /// Crash now. Takes precedence over continuing.
    pub crash: bool,
}

impl Verdict {
    /// Nothing to do.
    pub const CONTINUE: Verdict = Verdict {
        alert: false,
        crash: false,
    };
}

/// Alert and crash thresholds in wall time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Wait strictly beyond which an alert fires.
    pub alert_after: Duration,
    /// Wait strictly beyond which the aircraft crashes. `None` never crashes.
    pub crash_after: Option<Duration>,
}

impl TimeoutPolicy {
    /// Convert the configured unit thresholds through `clock`.
    pub fn from_config(config: &SimConfig, clock: &SimClock) -> Self {
        Self {
            alert_after: clock.units(config.alert_threshold),
            crash_after: config.crash_threshold.map(|n| clock.units(n)),
        }
    }

    /// Decide what happens to an aircraft that has waited `waited`.
    ///
    /// Both flags may be set on one evaluation when a single poll crosses
    /// both thresholds; the alert is emitted before the crash.
    pub fn evaluate(&self, waited: Duration, alert_raised: bool, crashed: bool) -> Verdict {
        if crashed {
            return Verdict::CONTINUE;
        }
        Verdict {
            alert: !alert_raised && waited > self.alert_after,
            crash: self.crash_after.is_some_and(|limit| waited > limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy() -> TimeoutPolicy {
        TimeoutPolicy {
            alert_after: Duration::from_secs(60),
            crash_after: Some(Duration::from_secs(90)),
        }
    }

    #[test]
    fn escalates_normal_alert_crash() {
        let p = policy();
        assert_eq!(p.evaluate(Duration::from_secs(10), false, false), Verdict::CONTINUE);
        assert_eq!(p.evaluate(Duration::from_secs(60), false, false), Verdict::CONTINUE);
        assert_eq!(
            p.evaluate(Duration::from_secs(61), false, false),
            Verdict { alert: true, crash: false }
        );
        assert_eq!(
            p.evaluate(Duration::from_secs(91), true, false),
            Verdict { alert: false, crash: true }
        );
    }

    #[test]
    fn one_poll_can_cross_both_thresholds() {
        assert_eq!(
            policy().evaluate(Duration::from_secs(120), false, false),
            Verdict { alert: true, crash: true }
        );
    }

    #[test]
    fn crashed_aircraft_get_no_further_verdicts() {
        assert_eq!(
            policy().evaluate(Duration::from_secs(500), false, true),
            Verdict::CONTINUE
        );
    }

    #[test]
    fn disabled_crash_only_alerts() {
        let p = TimeoutPolicy {
            crash_after: None,
            ..policy()
        };
        let v = p.evaluate(Duration::from_secs(10_000), false, false);
        assert!(v.alert);
        assert!(!v.crash);
    }

    #[test]
    fn thresholds_scale_with_the_time_unit() {
        let clock = SimClock::start(Duration::from_millis(10));
        let config = SimConfig::default();
        let p = TimeoutPolicy::from_config(&config, &clock);
        assert_eq!(p.alert_after, Duration::from_millis(600));
        assert_eq!(p.crash_after, Some(Duration::from_millis(900)));
    }

    proptest! {
        #[test]
        fn alert_is_one_shot_and_crash_is_monotone(
            waited_ms in 0u64..200_000,
            extra_ms in 0u64..200_000,
            alert_raised: bool,
        ) {
            let p = policy();
            let w = Duration::from_millis(waited_ms);
            let v = p.evaluate(w, alert_raised, false);
            if alert_raised {
                prop_assert!(!v.alert);
            }
            if v.crash {
                let later = p.evaluate(w + Duration::from_millis(extra_ms), alert_raised, false);
                prop_assert!(later.crash);
            }
            // A crash implies the alert threshold was also crossed.
            if v.crash {
                prop_assert!(w > p.alert_after);
            }
        }
    }
}
