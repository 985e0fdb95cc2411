use std::time::Duration;

use clap::Parser;
use tarmac::engine::{MonitorConfig, ResourceCapacities, SimConfig, UnitRange};

/// Tarmac airport contention simulator
///
/// Aircraft threads compete for runways, gates and tower channels.
/// Domestic and international flights request the tower in opposite
/// orders; under load that produces starvation, deadlock and timeout
/// crashes. All durations are in time units.
#[derive(Parser, Debug)]
#[command(name = "tarmac-sim")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Runways
    #[arg(long, default_value = "3")]
    pub runways: u32,

    /// Gates
    #[arg(long, default_value = "5")]
    pub gates: u32,

    /// Concurrent tower operations
    #[arg(long, default_value = "2")]
    pub tower: u32,

    /// Units during which aircraft are generated
    #[arg(short = 'd', long, default_value = "100")]
    pub duration: u32,

    /// Wait in units after which an alert is raised
    #[arg(long, default_value = "60")]
    pub alert_after: u32,

    /// Wait in units after which the aircraft crashes
    #[arg(long, default_value = "90", conflicts_with = "no_crash")]
    pub crash_after: u32,

    /// Never crash; aircraft wait until shutdown
    #[arg(long)]
    pub no_crash: bool,

    /// Upper bound on aircraft created
    #[arg(short = 'n', long, default_value = "50")]
    pub max_aircraft: usize,

    /// Units between arrivals, `N` or `MIN-MAX`
    #[arg(long, value_parser = parse_range, default_value = "1-3")]
    pub arrival_interval: UnitRange,

    /// Landing hold, `N` or `MIN-MAX`
    #[arg(long, value_parser = parse_range, default_value = "1-2")]
    pub landing_hold: UnitRange,

    /// Disembark hold, `N` or `MIN-MAX`
    #[arg(long, value_parser = parse_range, default_value = "1-3")]
    pub disembark_hold: UnitRange,

    /// Takeoff hold, `N` or `MIN-MAX`
    #[arg(long, value_parser = parse_range, default_value = "1-2")]
    pub takeoff_hold: UnitRange,

    /// Pause between phases
    #[arg(long, default_value = "1")]
    pub turnaround_pause: u32,

    /// Bounded wait per acquire attempt
    #[arg(long, default_value = "2")]
    pub acquire_poll: u32,

    /// Units between liveness scans
    #[arg(long, default_value = "30")]
    pub monitor_period: u32,

    /// Wait after which the monitor counts an aircraft as blocked
    #[arg(long, default_value = "30")]
    pub blocked_after: u32,

    /// Wait after which the monitor counts an aircraft as critical
    #[arg(long, default_value = "45")]
    pub critical_after: u32,

    /// Blocked aircraft needed for a deadlock report
    #[arg(long, default_value = "4")]
    pub blocked_quorum: usize,

    /// Critical aircraft needed for a deadlock report
    #[arg(long, default_value = "2")]
    pub critical_quorum: usize,

    /// Units shutdown waits for aircraft to finish on their own
    #[arg(long, default_value = "5")]
    pub drain_deadline: u32,

    /// Units aborted aircraft get to exit
    #[arg(long, default_value = "2")]
    pub abort_grace: u32,

    /// Milliseconds per time unit
    #[arg(long, default_value = "1000")]
    pub unit_ms: u64,

    /// Random seed for reproducible traffic. When omitted, a random seed is used.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print only the final summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Build the run configuration. Validation happens at start.
    pub fn to_config(&self, seed: u64) -> SimConfig {
        SimConfig {
            capacities: ResourceCapacities {
                runway: self.runways,
                gate: self.gates,
                tower: self.tower,
            },
            duration: self.duration,
            alert_threshold: self.alert_after,
            crash_threshold: (!self.no_crash).then_some(self.crash_after),
            max_aircraft: self.max_aircraft,
            arrival_interval: self.arrival_interval,
            landing_hold: self.landing_hold,
            disembark_hold: self.disembark_hold,
            takeoff_hold: self.takeoff_hold,
            turnaround_pause: self.turnaround_pause,
            acquire_poll: self.acquire_poll,
            monitor: MonitorConfig {
                period: self.monitor_period,
                blocked_after: self.blocked_after,
                critical_after: self.critical_after,
                blocked_quorum: self.blocked_quorum,
                critical_quorum: self.critical_quorum,
            },
            drain_deadline: self.drain_deadline,
            abort_grace: self.abort_grace,
            time_unit: Duration::from_millis(self.unit_ms),
            seed,
            ..SimConfig::default()
        }
    }
}

/// `N` or `MIN-MAX`.
fn parse_range(s: &str) -> Result<UnitRange, String> {
    let num = |t: &str| {
        t.trim()
            .parse::<u32>()
            .map_err(|e| format!("`{t}` is not a unit count: {e}"))
    };
    match s.split_once('-') {
        Some((min, max)) => {
            let range = UnitRange::new(num(min)?, num(max)?);
            if range.min > range.max {
                return Err(format!("empty range `{s}`"));
            }
            Ok(range)
        }
        None => Ok(UnitRange::fixed(num(s)?)),
    }
}
