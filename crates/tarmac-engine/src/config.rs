//! Simulation configuration, validation, and error types.
//!
//! [`SimConfig`] is fixed at start and never reloaded. Every duration is
//! an integer number of *time units*; [`SimConfig::time_unit`] maps one
//! unit to wall time (one second by default, milliseconds in tests).
//! [`validate()`](SimConfig::validate) checks every structural invariant
//! before any thread starts.

use std::time::Duration;

use rand::Rng;
use tarmac_core::{FlightClass, Phase, PoolError};
use thiserror::Error;

use crate::pool::ResourceCapacities;

// ── UnitRange ─────────────────────────────────────────────────────

/// Inclusive range of time units, sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitRange {
    /// Lower bound, inclusive.
    pub min: u32,
    /// Upper bound, inclusive.
    pub max: u32,
}

impl UnitRange {
    /// `min..=max`.
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// A degenerate range that always yields `n`.
    pub const fn fixed(n: u32) -> Self {
        Self { min: n, max: n }
    }

    /// Draw a value. Assumes a validated range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    fn check(&self, name: &'static str, floor: u32) -> Result<(), ConfigError> {
        if self.min > self.max || self.min < floor {
            return Err(ConfigError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

// ── ArrivalPlan ───────────────────────────────────────────────────

/// One scripted arrival.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arrival {
    /// Units to wait after the previous arrival (or the start) before
    /// creating this aircraft.
    pub after: u32,
    /// Class of the new aircraft.
    pub class: FlightClass,
}

impl Arrival {
    /// Shorthand constructor.
    pub const fn new(after: u32, class: FlightClass) -> Self {
        Self { after, class }
    }
}

/// How the generator decides when to create aircraft and of which class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ArrivalPlan {
    /// Fair coin for the class, `arrival_interval` between arrivals.
    #[default]
    Random,
    /// A fixed sequence. The generator stops when it is exhausted.
    Scripted(Vec<Arrival>),
}

// ── MonitorConfig ─────────────────────────────────────────────────

/// Liveness monitor schedule and diagnosis thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Units between scans. Default: 30.
    pub period: u32,
    /// An aircraft waiting longer than this many units counts as
    /// blocked. Default: 30.
    pub blocked_after: u32,
    /// An aircraft waiting longer than this many units counts as
    /// critical. Default: 45.
    pub critical_after: u32,
    /// Blocked aircraft needed to raise a deadlock report. Default: 4.
    pub blocked_quorum: usize,
    /// Critical aircraft needed to raise a deadlock report. Default: 2.
    pub critical_quorum: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            period: 30,
            blocked_after: 30,
            critical_after: 45,
            blocked_quorum: 4,
            critical_quorum: 2,
        }
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected during [`SimConfig::validate()`] or while starting
/// the simulation's own threads. All are fatal.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The resource pool cannot be built with the requested capacities.
    #[error("resource pool: {0}")]
    Pool(#[from] PoolError),
    /// Simulation duration is zero.
    #[error("simulation duration must be at least 1 unit")]
    ZeroDuration,
    /// `max_aircraft` is zero.
    #[error("max_aircraft must be at least 1")]
    NoAircraft,
    /// A unit range is inverted or below its floor.
    #[error("{name} range {min}..={max} is invalid")]
    InvalidRange {
        /// Which range.
        name: &'static str,
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },
    /// Crash threshold is not strictly after the alert threshold.
    #[error("crash threshold ({crash}) must exceed alert threshold ({alert})")]
    CrashNotAfterAlert {
        /// Alert threshold in units.
        alert: u32,
        /// Crash threshold in units.
        crash: u32,
    },
    /// Bounded acquire wait is zero units.
    #[error("acquire_poll must be at least 1 unit")]
    ZeroAcquirePoll,
    /// Time unit is zero.
    #[error("time_unit must be non-zero")]
    ZeroTimeUnit,
    /// A monitor invariant is violated.
    #[error("invalid monitor config: {reason}")]
    InvalidMonitor {
        /// Which invariant.
        reason: String,
    },
    /// Drain deadline or abort grace is zero units.
    #[error("drain_deadline and abort_grace must be at least 1 unit")]
    ZeroShutdownBudget,
    /// A scripted arrival plan has no arrivals.
    #[error("scripted arrival plan is empty")]
    EmptyArrivalScript,
    /// One of the simulation's own threads could not be spawned.
    #[error("thread spawn failed: {reason}")]
    ThreadSpawnFailed {
        /// Which thread, and the OS error.
        reason: String,
    },
}

// ── SimConfig ─────────────────────────────────────────────────────

/// Complete configuration for one simulation run.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Units of each resource. Default: 3 runways, 5 gates, 2 tower channels.
    pub capacities: ResourceCapacities,
    /// Units during which new aircraft are generated. Default: 100.
    pub duration: u32,
    /// Wait after which an alert is raised. Default: 60.
    pub alert_threshold: u32,
    /// Wait after which the aircraft crashes. `None` disables crashing.
    /// Default: `Some(90)`.
    pub crash_threshold: Option<u32>,
    /// Upper bound on aircraft created. Default: 50.
    pub max_aircraft: usize,
    /// Units between random arrivals. Default: 1..=3.
    pub arrival_interval: UnitRange,
    /// Landing hold. Default: 1..=2.
    pub landing_hold: UnitRange,
    /// Disembark hold. Default: 1..=3.
    pub disembark_hold: UnitRange,
    /// Takeoff hold. Default: 1..=2.
    pub takeoff_hold: UnitRange,
    /// Pause between finishing one phase and requesting the next. Default: 1.
    pub turnaround_pause: u32,
    /// Bounded wait per acquire attempt before the policy is re-checked.
    /// Default: 2.
    pub acquire_poll: u32,
    /// Liveness monitor settings.
    pub monitor: MonitorConfig,
    /// Units the shutdown sequence waits for workers to drain naturally.
    /// Default: 5.
    pub drain_deadline: u32,
    /// Units granted to aborted workers to exit. Default: 2.
    pub abort_grace: u32,
    /// Wall duration of one unit. Default: 1 s.
    pub time_unit: Duration,
    /// Seed for every RNG in the run. Default: 0.
    pub seed: u64,
    /// Arrival schedule. Default: random.
    pub arrivals: ArrivalPlan,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capacities: ResourceCapacities::default(),
            duration: 100,
            alert_threshold: 60,
            crash_threshold: Some(90),
            max_aircraft: 50,
            arrival_interval: UnitRange::new(1, 3),
            landing_hold: UnitRange::new(1, 2),
            disembark_hold: UnitRange::new(1, 3),
            takeoff_hold: UnitRange::new(1, 2),
            turnaround_pause: 1,
            acquire_poll: 2,
            monitor: MonitorConfig::default(),
            drain_deadline: 5,
            abort_grace: 2,
            time_unit: Duration::from_secs(1),
            seed: 0,
            arrivals: ArrivalPlan::Random,
        }
    }
}

impl SimConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Pool capacities (fatal initialization class).
        self.capacities.validate()?;
        // 2. Run shape.
        if self.duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.max_aircraft == 0 {
            return Err(ConfigError::NoAircraft);
        }
        if self.time_unit.is_zero() {
            return Err(ConfigError::ZeroTimeUnit);
        }
        // 3. Ranges. Holds need at least one unit so every hold has a
        //    policy check point.
        self.arrival_interval.check("arrival_interval", 0)?;
        self.landing_hold.check("landing_hold", 1)?;
        self.disembark_hold.check("disembark_hold", 1)?;
        self.takeoff_hold.check("takeoff_hold", 1)?;
        // 4. Policy thresholds.
        if let Some(crash) = self.crash_threshold {
            if crash <= self.alert_threshold {
                return Err(ConfigError::CrashNotAfterAlert {
                    alert: self.alert_threshold,
                    crash,
                });
            }
        }
        if self.acquire_poll == 0 {
            return Err(ConfigError::ZeroAcquirePoll);
        }
        // 5. Monitor.
        let m = &self.monitor;
        if m.period == 0 {
            return Err(ConfigError::InvalidMonitor {
                reason: "period must be at least 1".to_string(),
            });
        }
        if m.critical_after <= m.blocked_after {
            return Err(ConfigError::InvalidMonitor {
                reason: format!(
                    "critical_after ({}) must exceed blocked_after ({})",
                    m.critical_after, m.blocked_after,
                ),
            });
        }
        if m.blocked_quorum == 0 || m.critical_quorum == 0 {
            return Err(ConfigError::InvalidMonitor {
                reason: "quorums must be at least 1".to_string(),
            });
        }
        // 6. Shutdown budget.
        if self.drain_deadline == 0 || self.abort_grace == 0 {
            return Err(ConfigError::ZeroShutdownBudget);
        }
        // 7. Scripted arrivals.
        if let ArrivalPlan::Scripted(script) = &self.arrivals {
            if script.is_empty() {
                return Err(ConfigError::EmptyArrivalScript);
            }
        }
        Ok(())
    }

    /// Hold range for `phase`.
    pub fn hold_for(&self, phase: Phase) -> UnitRange {
        match phase {
            Phase::Landing => self.landing_hold,
            Phase::Disembark => self.disembark_hold,
            Phase::Takeoff => self.takeoff_hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tarmac_core::ResourceKind;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn defaults_match_the_reference_airport() {
        let c = SimConfig::default();
        assert_eq!(c.capacities.runway, 3);
        assert_eq!(c.capacities.gate, 5);
        assert_eq!(c.capacities.tower, 2);
        assert_eq!(c.alert_threshold, 60);
        assert_eq!(c.crash_threshold, Some(90));
        assert_eq!(c.max_aircraft, 50);
        assert_eq!(c.duration, 100);
    }

    #[test]
    fn zero_capacity_is_a_pool_error() {
        let mut c = SimConfig::default();
        c.capacities.tower = 0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::Pool(PoolError::ZeroCapacity {
                kind: ResourceKind::Tower
            }))
        );
    }

    #[test]
    fn crash_must_follow_alert() {
        let c = SimConfig {
            alert_threshold: 60,
            crash_threshold: Some(60),
            ..SimConfig::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::CrashNotAfterAlert { .. })
        ));

        let c = SimConfig {
            crash_threshold: None,
            ..SimConfig::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn inverted_and_zero_hold_ranges_rejected() {
        let c = SimConfig {
            landing_hold: UnitRange::new(3, 1),
            ..SimConfig::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidRange { name: "landing_hold", .. })
        ));

        let c = SimConfig {
            takeoff_hold: UnitRange::fixed(0),
            ..SimConfig::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidRange { name: "takeoff_hold", .. })
        ));
    }

    #[test]
    fn monitor_buckets_must_be_ordered() {
        let c = SimConfig {
            monitor: MonitorConfig {
                critical_after: 30,
                ..MonitorConfig::default()
            },
            ..SimConfig::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidMonitor { .. })
        ));
    }

    #[test]
    fn misc_zero_values_rejected() {
        let cases: Vec<(SimConfig, ConfigError)> = vec![
            (
                SimConfig {
                    duration: 0,
                    ..SimConfig::default()
                },
                ConfigError::ZeroDuration,
            ),
            (
                SimConfig {
                    max_aircraft: 0,
                    ..SimConfig::default()
                },
                ConfigError::NoAircraft,
            ),
            (
                SimConfig {
                    acquire_poll: 0,
                    ..SimConfig::default()
                },
                ConfigError::ZeroAcquirePoll,
            ),
            (
                SimConfig {
                    time_unit: Duration::ZERO,
                    ..SimConfig::default()
                },
                ConfigError::ZeroTimeUnit,
            ),
            (
                SimConfig {
                    drain_deadline: 0,
                    ..SimConfig::default()
                },
                ConfigError::ZeroShutdownBudget,
            ),
            (
                SimConfig {
                    arrivals: ArrivalPlan::Scripted(vec![]),
                    ..SimConfig::default()
                },
                ConfigError::EmptyArrivalScript,
            ),
        ];
        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }

    #[test]
    fn unit_range_samples_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let r = UnitRange::new(1, 3);
        for _ in 0..200 {
            let v = r.sample(&mut rng);
            assert!((1..=3).contains(&v));
        }
        assert_eq!(UnitRange::fixed(4).sample(&mut rng), 4);
    }

    #[test]
    fn hold_for_maps_each_phase() {
        let c = SimConfig::default();
        assert_eq!(c.hold_for(Phase::Landing), c.landing_hold);
        assert_eq!(c.hold_for(Phase::Disembark), c.disembark_hold);
        assert_eq!(c.hold_for(Phase::Takeoff), c.takeoff_hold);
    }
}
