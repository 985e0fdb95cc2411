//! Final report and liveness formatting.

use std::fmt::Write as _;
use std::time::Duration;

use tarmac::engine::SimulationReport;
use tarmac::types::{Diagnosis, FlightClass, LivenessReport, Phase, ResourceKind};

/// Multi-line description of a liveness report.
pub fn liveness(r: &LivenessReport) -> String {
    let mut s = String::new();
    let _ = write!(
        s,
        "{} ({} of {} live blocked, {} critical; DOM {} / INT {})",
        r.diagnosis.to_string().to_uppercase(),
        r.blocked,
        r.live,
        r.critical,
        r.domestic_blocked,
        r.international_blocked,
    );
    for u in &r.usage {
        let _ = write!(s, "\n          {:>7}: {}/{} in use", u.kind.to_string(), u.in_use, u.capacity);
    }
    for (state, n) in r.states.non_zero() {
        let _ = write!(s, "\n          {:>17}: {n}", state.to_string());
    }
    s
}

fn pct(x: Option<f64>) -> String {
    x.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v * 100.0))
}

/// Print the end-of-run summary to stdout.
pub fn print(report: &SimulationReport, unit: Duration) {
    let s = &report.stats;
    let units = |d: Duration| d.as_secs_f64() / unit.as_secs_f64();

    println!();
    println!("=== Simulation Summary (seed {}) ===", report.seed);
    println!("Elapsed: {:.1} units", units(report.elapsed));
    println!(
        "Aircraft: {} created, {} completed, {} crashed, {} terminated at shutdown, {} failed to start",
        s.created, s.completed, s.crashed, s.forced, s.spawn_failures,
    );
    for class in FlightClass::ALL {
        let t = s.class(class);
        println!(
            "  {}: {} created, {} completed ({}), {} crashed, {} alerts",
            class.tag(),
            t.created,
            t.completed,
            pct(t.completion_rate()),
            t.crashed,
            t.alerts,
        );
    }
    println!(
        "Alerts: {} ({} with international traffic live)",
        s.alerts, s.starvation_alerts,
    );
    println!("Severe starvation crashes: {}", s.severe_starvation_crashes);
    match s.fairness {
        Some(f) => println!("Fairness index: {f:.2}"),
        None => println!("Fairness index: n/a"),
    }
    if let Some(mean) = s.mean_cycle_time {
        println!("Mean cycle time: {:.1} units", units(mean));
    }

    println!();
    println!("Operations:");
    for phase in Phase::ALL {
        println!("  {:>9}: {}", phase.to_string(), s.phase(phase));
    }
    println!("Resources:");
    for kind in ResourceKind::ALL {
        let i = kind.index();
        println!(
            "  {:>7}: {} acquisitions, peak {}/{} ({})",
            kind.to_string(),
            s.acquisitions[i],
            s.peak_in_use[i],
            s.capacity[i],
            pct(s.peak_utilization(kind)),
        );
    }
    println!("Liveness reports:");
    for d in Diagnosis::ALL {
        println!("  {d}: {}", s.liveness_count(d));
    }

    let sh = &report.shutdown;
    println!();
    println!(
        "Shutdown: {} ms ({} ms drain, {} ms abort); {} drained, {} forced, {} detached",
        sh.total_ms, sh.drain_ms, sh.abort_ms, sh.drained, sh.forced, sh.detached,
    );

    println!();
    println!("Aircraft outcomes:");
    for v in &report.aircraft {
        let note = if v.force_terminated {
            " (terminated at shutdown)"
        } else if v.crashed {
            " (timeout)"
        } else {
            ""
        };
        println!("  {}{:<4} {}{note}", v.class.tag(), v.id.0, v.state);
    }
}
