//! Aircraft generator.
//!
//! Creates aircraft on the configured [`ArrivalPlan`] and starts one
//! worker per aircraft through a [`WorkerSpawner`]. Creation ends when
//! the aircraft cap is reached, a scripted plan runs out, or generation
//! is stopped; the generator thread itself stays up until the simulation
//! duration has elapsed so the orchestrator can treat its exit as the end
//! of the generation window.
//!
//! Ids start at 1. A worker that fails to start is a transient failure:
//! the id is consumed, [`EventKind::SpawnFailed`] is emitted and the
//! generator waits at least one unit before its next attempt.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tarmac_core::{AircraftId, EventKind, FlightClass};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aircraft::Aircraft;
use crate::clock::StopToken;
use crate::config::{Arrival, ArrivalPlan};
use crate::lifecycle::{AircraftWorker, WorkerContext};

/// Failure to start an aircraft worker.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The OS refused a new thread.
    #[error("could not start a thread for aircraft {aircraft}: {source}")]
    Thread {
        /// The aircraft whose worker failed to start.
        aircraft: AircraftId,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// A custom spawner declined the job.
    #[error("worker for aircraft {aircraft} rejected: {reason}")]
    Rejected {
        /// The aircraft whose worker was rejected.
        aircraft: AircraftId,
        /// Why.
        reason: String,
    },
}

/// A worker body, ready to run on whatever thread the spawner provides.
pub type WorkerJob = Box<dyn FnOnce() + Send + 'static>;

/// Starts aircraft workers.
pub trait WorkerSpawner: Send {
    /// Start `job` for `aircraft`. The job must run to completion on the
    /// returned thread.
    fn spawn(&mut self, aircraft: AircraftId, job: WorkerJob) -> Result<JoinHandle<()>, SpawnError>;
}

/// One named OS thread per aircraft.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSpawner;

impl WorkerSpawner for ThreadSpawner {
    fn spawn(&mut self, aircraft: AircraftId, job: WorkerJob) -> Result<JoinHandle<()>, SpawnError> {
        thread::Builder::new()
            .name(format!("aircraft-{aircraft}"))
            .spawn(job)
            .map_err(|source| SpawnError::Thread { aircraft, source })
    }
}

/// Generator thread state.
pub(crate) struct Generator<S> {
    pub(crate) ctx: WorkerContext,
    pub(crate) spawner: S,
    /// Fires on `stop_generation` or drop of the running simulation.
    pub(crate) stop: StopToken,
    /// Set once no further aircraft will be created.
    pub(crate) stopped: Arc<AtomicBool>,
}

impl<S: WorkerSpawner> Generator<S> {
    /// Generate until the window closes. Returns every started worker.
    pub(crate) fn run(mut self) -> Vec<(AircraftId, JoinHandle<()>)> {
        let config = Arc::clone(&self.ctx.config);
        let clock = self.ctx.clock;
        let window = clock.units(config.duration);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut script = match &config.arrivals {
            ArrivalPlan::Random => None,
            ArrivalPlan::Scripted(arrivals) => Some(arrivals.iter().copied()),
        };

        let mut handles = Vec::new();
        let mut next_id = 1u64;
        let mut interrupted = false;
        info!(max_aircraft = config.max_aircraft, "generator started");

        while handles.len() < config.max_aircraft {
            let arrival = match script.as_mut() {
                Some(it) => match it.next() {
                    Some(a) => a,
                    None => break,
                },
                None => Arrival {
                    // First arrival at the start of the window.
                    after: if next_id == 1 {
                        0
                    } else {
                        config.arrival_interval.sample(&mut rng)
                    },
                    class: if rng.gen_bool(0.5) {
                        FlightClass::International
                    } else {
                        FlightClass::Domestic
                    },
                },
            };

            let remaining = window.saturating_sub(clock.elapsed());
            let wait = clock.units(arrival.after);
            if wait >= remaining {
                break;
            }
            if !self.stop.sleep(wait) {
                interrupted = true;
                break;
            }

            let id = AircraftId(next_id);
            next_id += 1;
            match self.launch(id, arrival.class) {
                Some(handle) => handles.push((id, handle)),
                None => {
                    if !self.stop.sleep(clock.unit()) {
                        interrupted = true;
                        break;
                    }
                }
            }
        }

        self.stopped.store(true, Ordering::Release);
        info!(
            created = handles.len(),
            attempted = next_id - 1,
            "aircraft creation finished",
        );
        if !interrupted {
            let _ = self.stop.sleep(window.saturating_sub(clock.elapsed()));
        }
        handles
    }

    /// Build, start and register one aircraft.
    fn launch(&mut self, id: AircraftId, class: FlightClass) -> Option<JoinHandle<()>> {
        let aircraft = Arc::new(Aircraft::new(id, class, &self.ctx.clock));
        let worker = AircraftWorker::new(Arc::clone(&aircraft), self.ctx.clone());
        // Hold the worker until it is registered and announced, so that
        // `Created` precedes every event the worker emits.
        let (go_tx, go_rx) = crossbeam_channel::bounded::<()>(1);
        let job: WorkerJob = Box::new(move || {
            if go_rx.recv().is_ok() {
                worker.run();
            }
        });

        match self.spawner.spawn(id, job) {
            Ok(handle) => {
                self.ctx.registry.register(aircraft);
                debug!(aircraft = %id, %class, "aircraft entered airspace");
                self.ctx.sink.emit(EventKind::Created {
                    aircraft: id,
                    class,
                });
                let _ = go_tx.send(());
                Some(handle)
            }
            Err(e) => {
                warn!(aircraft = %id, %class, error = %e, "aircraft worker failed to start");
                self.ctx.sink.emit(EventKind::SpawnFailed {
                    aircraft: id,
                    class,
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}
