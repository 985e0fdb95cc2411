//! Simulation orchestrator and shutdown state machine.
//!
//! # Threads
//!
//! ```text
//! Generator ──spawns──► Aircraft workers (one per aircraft)
//!     │                     │ acquire/release ──► ResourcePool
//!     │                     │ emit ─────────────► EventSink ──► Statistics
//!     │                     └ done ──► orchestrator           └► Reporter thread
//! Monitor ── reads registry + pool, emits Liveness
//! ```
//!
//! # Shutdown
//!
//! `Running → Draining → Aborting → Finished`
//!
//! 1. **Running**: wait for the generator thread, which exits when the
//!    simulation duration elapses or generation is stopped.
//! 2. **Draining**: wait up to `drain_deadline` for every started worker
//!    to report done.
//! 3. **Aborting** (only with stragglers): fire the abort signal, close
//!    the pool so blocked acquires return, wait up to `abort_grace`.
//! 4. **Finished**: join the workers that reported done; any other is
//!    detached and counted. Join the monitor, snapshot statistics, close
//!    the event stream, join the reporter and call `on_finish`.
//!
//! Dropping a [`RunningSimulation`] without calling
//! [`finish`](RunningSimulation::finish) stops generation and runs the
//! same sequence.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use tarmac_core::AircraftId;
use tracing::{error, info, warn};

use crate::aircraft::{AircraftRegistry, AircraftView};
use crate::clock::{SimClock, StopHandle};
use crate::config::{ConfigError, SimConfig};
use crate::generator::{Generator, ThreadSpawner, WorkerSpawner};
use crate::lifecycle::WorkerContext;
use crate::monitor::Monitor;
use crate::policy::TimeoutPolicy;
use crate::pool::ResourcePool;
use crate::report::{spawn_reporter, EventSink, Reporter};
use crate::stats::{Statistics, StatsSnapshot};

// ── Reports ───────────────────────────────────────────────────────

/// Timing and outcome of the shutdown sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Time from the start of [`RunningSimulation::finish`] to the end.
    pub total_ms: u64,
    /// Time spent waiting for the generator and draining workers.
    pub drain_ms: u64,
    /// Time spent in the abort grace period.
    pub abort_ms: u64,
    /// Workers that finished before any abort.
    pub drained: usize,
    /// Aircraft force-terminated by the abort.
    pub forced: usize,
    /// Workers still running after the grace period, left detached.
    pub detached: usize,
    /// Whether the abort step ran.
    pub aborted: bool,
}

/// Everything known at the end of a run.
#[derive(Clone, Debug)]
pub struct SimulationReport {
    /// Seed the run used.
    pub seed: u64,
    /// Wall time from start to the end of shutdown.
    pub elapsed: Duration,
    /// Final statistics.
    pub stats: StatsSnapshot,
    /// How shutdown went.
    pub shutdown: ShutdownReport,
    /// Final view of every aircraft, in creation order.
    pub aircraft: Vec<AircraftView>,
}

impl SimulationReport {
    /// Aircraft that did not reach a terminal state.
    pub fn live_aircraft(&self) -> impl Iterator<Item = &AircraftView> {
        self.aircraft.iter().filter(|v| v.is_live())
    }
}

// ── Simulation ────────────────────────────────────────────────────

/// Builder for a run.
#[derive(Debug)]
pub struct Simulation<S = ThreadSpawner> {
    config: SimConfig,
    spawner: S,
    pool: Option<Arc<ResourcePool>>,
}

impl Simulation {
    /// A run with `config`, one OS thread per aircraft, and a pool built
    /// from `config.capacities`.
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            spawner: ThreadSpawner,
            pool: None,
        }
    }

    /// Validate, start every thread, and return the running handle.
    pub fn start<R: Reporter + 'static>(
        config: SimConfig,
        reporter: R,
    ) -> Result<RunningSimulation<R>, ConfigError> {
        Self::new(config).launch(reporter)
    }

    /// [`start`](Self::start) followed by
    /// [`finish`](RunningSimulation::finish).
    pub fn run<R: Reporter + 'static>(
        config: SimConfig,
        reporter: R,
    ) -> Result<SimulationReport, ConfigError> {
        Ok(Self::start(config, reporter)?.finish())
    }
}

impl<S: WorkerSpawner + 'static> Simulation<S> {
    /// Start workers through `spawner` instead of plain threads.
    pub fn with_spawner<T: WorkerSpawner + 'static>(self, spawner: T) -> Simulation<T> {
        Simulation {
            config: self.config,
            spawner,
            pool: self.pool,
        }
    }

    /// Use an existing pool instead of building one from
    /// `config.capacities`. The caller may hold permits on it.
    pub fn with_pool(mut self, pool: Arc<ResourcePool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Validate, start every thread, and return the running handle.
    pub fn launch<R: Reporter + 'static>(self, reporter: R) -> Result<RunningSimulation<R>, ConfigError> {
        let Simulation {
            config,
            spawner,
            pool,
        } = self;
        config.validate()?;
        let pool = match pool {
            Some(pool) => pool,
            None => Arc::new(ResourcePool::new(config.capacities)?),
        };
        let config = Arc::new(config);
        let clock = SimClock::start(config.time_unit);
        let stats = Arc::new(Statistics::new());
        let registry = Arc::new(AircraftRegistry::new(clock));
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        let (mut abort, abort_token) = StopHandle::pair();
        let (mut generation, generation_token) = StopHandle::pair();
        let (mut close, close_token) = StopHandle::pair();
        let generation_stopped = Arc::new(AtomicBool::new(false));
        let sink = EventSink::new(clock, Arc::clone(&stats), event_tx);

        let spawn_failed = |what: &str, e: std::io::Error| ConfigError::ThreadSpawnFailed {
            reason: format!("{what}: {e}"),
        };

        // Reporter first: every other thread emits into it.
        let reporter = spawn_reporter(reporter, event_rx, close_token)
            .map_err(|e| spawn_failed("reporter", e))?;

        let monitor = Monitor {
            registry: Arc::clone(&registry),
            pool: Arc::clone(&pool),
            sink: sink.clone(),
            clock,
            config: config.monitor,
            abort: abort_token.clone(),
            generation_stopped: Arc::clone(&generation_stopped),
        };
        let monitor = match thread::Builder::new()
            .name("tarmac-monitor".into())
            .spawn(move || monitor.run())
        {
            Ok(h) => h,
            Err(e) => {
                close.fire();
                let _ = reporter.join();
                return Err(spawn_failed("monitor", e));
            }
        };

        let generator = Generator {
            ctx: WorkerContext {
                config: Arc::clone(&config),
                pool: Arc::clone(&pool),
                registry: Arc::clone(&registry),
                sink,
                clock,
                policy: TimeoutPolicy::from_config(&config, &clock),
                abort: abort_token,
                done: done_tx,
            },
            spawner,
            stop: generation_token,
            stopped: Arc::clone(&generation_stopped),
        };
        let generator = match thread::Builder::new()
            .name("tarmac-generator".into())
            .spawn(move || generator.run())
        {
            Ok(h) => h,
            Err(e) => {
                generation.fire();
                abort.fire();
                let _ = monitor.join();
                close.fire();
                let _ = reporter.join();
                return Err(spawn_failed("generator", e));
            }
        };

        info!(
            seed = config.seed,
            runway = config.capacities.runway,
            gate = config.capacities.gate,
            tower = config.capacities.tower,
            duration_units = config.duration,
            "simulation started",
        );

        Ok(RunningSimulation {
            config,
            clock,
            pool,
            registry,
            stats,
            state: ShutdownState::Running,
            abort,
            generation,
            close,
            done_rx,
            generator: Some(generator),
            monitor: Some(monitor),
            reporter: Some(reporter),
        })
    }
}

// ── RunningSimulation ─────────────────────────────────────────────

/// Shutdown progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownState {
    /// Generating and flying.
    Running,
    /// Generation over; waiting for workers to finish on their own.
    Draining,
    /// Abort signalled and pool closed; waiting out the grace period.
    Aborting,
    /// Every thread joined or detached; report delivered.
    Finished,
}

/// A simulation in progress.
pub struct RunningSimulation<R: Reporter + 'static> {
    config: Arc<SimConfig>,
    clock: SimClock,
    pool: Arc<ResourcePool>,
    registry: Arc<AircraftRegistry>,
    stats: Arc<Statistics>,
    state: ShutdownState,
    abort: StopHandle,
    generation: StopHandle,
    close: StopHandle,
    done_rx: Receiver<AircraftId>,
    generator: Option<JoinHandle<Vec<(AircraftId, JoinHandle<()>)>>>,
    monitor: Option<JoinHandle<usize>>,
    reporter: Option<JoinHandle<R>>,
}

impl<R: Reporter + 'static> RunningSimulation<R> {
    /// The shared resource pool.
    pub fn pool(&self) -> &Arc<ResourcePool> {
        &self.pool
    }

    /// Every aircraft created so far.
    pub fn registry(&self) -> &Arc<AircraftRegistry> {
        &self.registry
    }

    /// Live statistics.
    pub fn stats(&self) -> &Arc<Statistics> {
        &self.stats
    }

    /// The run's time base.
    pub fn clock(&self) -> SimClock {
        self.clock
    }

    /// Current shutdown state.
    pub fn state(&self) -> ShutdownState {
        self.state
    }

    /// End the generation window now. Aircraft already created keep
    /// flying; [`finish`](Self::finish) still drains them.
    pub fn stop_generation(&mut self) {
        if !self.generation.is_fired() {
            info!("generation stopped early");
            self.generation.fire();
        }
    }

    /// Wait for the generation window to close, then run the shutdown
    /// sequence and deliver the final report.
    pub fn finish(mut self) -> SimulationReport {
        self.shutdown()
    }

    fn shutdown(&mut self) -> SimulationReport {
        let start = Instant::now();

        // Phase 1: Running → Draining
        let workers = match self.generator.take().map(JoinHandle::join) {
            Some(Ok(workers)) => workers,
            Some(Err(_)) => {
                error!("generator thread panicked");
                Vec::new()
            }
            None => Vec::new(),
        };
        self.state = ShutdownState::Draining;
        let started = workers.len();
        let mut done: HashSet<AircraftId> = HashSet::with_capacity(started);
        self.collect_done(&mut done, started, self.clock.units(self.config.drain_deadline));
        let drained = done.len();
        let drain_ms = start.elapsed().as_millis() as u64;

        // Phase 2: Draining → Aborting, only with stragglers.
        let aborted = drained < started;
        if aborted {
            self.state = ShutdownState::Aborting;
            warn!(
                stragglers = started - drained,
                "drain deadline passed; aborting remaining aircraft",
            );
        }
        self.abort.fire();
        self.pool.close();
        if aborted {
            self.collect_done(&mut done, started, self.clock.units(self.config.abort_grace));
        }
        let abort_ms = start.elapsed().as_millis() as u64 - drain_ms;

        // Phase 3: → Finished
        let mut detached = 0;
        for (id, handle) in workers {
            if !done.contains(&id) {
                warn!(aircraft = %id, "worker did not exit within the abort grace; detaching");
                detached += 1;
                continue;
            }
            if handle.join().is_err() {
                error!(aircraft = %id, "aircraft worker panicked");
            }
        }

        let liveness_reports = match self.monitor.take().map(JoinHandle::join) {
            Some(Ok(n)) => n,
            Some(Err(_)) => {
                error!("monitor thread panicked");
                0
            }
            None => 0,
        };

        let stats = self.stats.snapshot();
        let aircraft = self.registry.views();
        self.close.fire();
        let reporter = self.reporter.take().and_then(|h| match h.join() {
            Ok(r) => Some(r),
            Err(_) => {
                error!("reporter thread panicked");
                None
            }
        });

        let shutdown = ShutdownReport {
            total_ms: start.elapsed().as_millis() as u64,
            drain_ms,
            abort_ms,
            drained,
            forced: stats.forced,
            detached,
            aborted,
        };
        self.state = ShutdownState::Finished;
        info!(
            created = stats.created,
            completed = stats.completed,
            crashed = stats.crashed,
            forced = stats.forced,
            liveness_reports,
            total_ms = shutdown.total_ms,
            "simulation finished",
        );

        let report = SimulationReport {
            seed: self.config.seed,
            elapsed: self.clock.elapsed(),
            stats,
            shutdown,
            aircraft,
        };
        if let Some(mut reporter) = reporter {
            reporter.on_finish(&report);
        }
        report
    }

    /// Receive done notices until `started` are in or `budget` runs out.
    fn collect_done(&self, done: &mut HashSet<AircraftId>, started: usize, budget: Duration) {
        let deadline = Instant::now() + budget;
        while done.len() < started {
            match self.done_rx.recv_deadline(deadline) {
                Ok(id) => {
                    done.insert(id);
                }
                Err(_) => break,
            }
        }
    }
}

impl<R: Reporter + 'static> Drop for RunningSimulation<R> {
    fn drop(&mut self) {
        if self.state != ShutdownState::Finished {
            self.stop_generation();
            let _ = self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Arrival, ArrivalPlan, UnitRange};
    use crate::pool::ResourceCapacities;
    use crate::report::NullReporter;
    use tarmac_core::{FlightClass, PoolError, ResourceKind};

    fn quick(duration: u32) -> SimConfig {
        SimConfig {
            time_unit: Duration::from_millis(2),
            duration,
            landing_hold: UnitRange::fixed(1),
            disembark_hold: UnitRange::fixed(1),
            takeoff_hold: UnitRange::fixed(1),
            acquire_poll: 1,
            drain_deadline: 250,
            abort_grace: 500,
            ..SimConfig::default()
        }
    }

    #[test]
    fn invalid_config_fails_before_any_thread() {
        let config = SimConfig {
            capacities: ResourceCapacities {
                runway: 0,
                ..ResourceCapacities::default()
            },
            ..SimConfig::default()
        };
        let err = Simulation::start(config, NullReporter).err().unwrap();
        assert_eq!(
            err,
            ConfigError::Pool(PoolError::ZeroCapacity {
                kind: ResourceKind::Runway
            })
        );
    }

    #[test]
    fn uncontended_run_drains_without_abort() {
        let config = SimConfig {
            arrivals: ArrivalPlan::Scripted(vec![
                Arrival::new(0, FlightClass::International),
                Arrival::new(1, FlightClass::Domestic),
            ]),
            ..quick(40)
        };
        let report = Simulation::run(config, NullReporter).unwrap();
        assert_eq!(report.stats.created, 2);
        assert_eq!(report.stats.completed, 2);
        assert!(!report.shutdown.aborted);
        assert_eq!(report.shutdown.drained, 2);
        assert_eq!(report.shutdown.detached, 0);
        assert_eq!(report.live_aircraft().count(), 0);
    }

    #[test]
    fn stop_generation_cuts_a_long_window() {
        let config = SimConfig {
            arrival_interval: UnitRange::fixed(3),
            ..quick(100_000)
        };
        let mut sim = Simulation::start(config, NullReporter).unwrap();
        assert_eq!(sim.state(), ShutdownState::Running);
        thread::sleep(Duration::from_millis(30));
        sim.stop_generation();
        let start = Instant::now();
        let report = sim.finish();
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(report.live_aircraft().count(), 0);
        assert!(report.stats.created >= 1);
        assert_eq!(report.stats.terminated(), report.stats.created);
    }

    #[test]
    fn dropping_a_running_simulation_shuts_it_down() {
        let pool;
        {
            let sim = Simulation::start(quick(100_000), NullReporter).unwrap();
            pool = Arc::clone(sim.pool());
            thread::sleep(Duration::from_millis(10));
        }
        assert!(pool.is_closed());
        for kind in ResourceKind::ALL {
            assert_eq!(pool.usage(kind).in_use, 0);
        }
    }
}
