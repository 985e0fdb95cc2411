//! Per-aircraft lifecycle worker.
//!
//! One worker drives one aircraft through
//!
//! ```text
//! WaitingLanding ─acquire×2─► Landing ─hold─► release runway, tower
//!   ─► WaitingDisembark ─pause─acquire×2─► Disembarking ─hold─► release tower
//!   ─► WaitingTakeoff ─pause─acquire×2─► TakingOff ─hold─► release gate, runway, tower
//!   ─► Completed
//! ```
//!
//! Suspension points are the bounded acquire polls and the one-unit
//! slices of every hold or pause. The timeout policy is evaluated at each
//! of them, so an aircraft blocked forever on a resource still crashes.
//! The abort signal is observed at the same points; the pool is closed
//! alongside it, which wakes workers blocked inside an acquire.
//!
//! Any halt releases every held permit in reverse acquisition order and
//! leaves the aircraft in `Crashed`, reported as a `StateChanged` ahead of
//! the `Crashed` or `ForcedTermination` event.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use smallvec::SmallVec;
use tarmac_core::{
    AircraftId, AircraftState, EventKind, FlightClass, Phase, ResourceKind, ResourceSet,
};
use tracing::{debug, warn};

use crate::aircraft::{Aircraft, AircraftRegistry};
use crate::clock::{SimClock, StopToken};
use crate::config::SimConfig;
use crate::policy::TimeoutPolicy;
use crate::pool::{Acquire, Permit, ResourcePool};
use crate::report::EventSink;

/// Everything a worker shares with the rest of the run.
#[derive(Clone, Debug)]
pub(crate) struct WorkerContext {
    pub(crate) config: Arc<SimConfig>,
    pub(crate) pool: Arc<ResourcePool>,
    pub(crate) registry: Arc<AircraftRegistry>,
    pub(crate) sink: EventSink,
    pub(crate) clock: SimClock,
    pub(crate) policy: TimeoutPolicy,
    pub(crate) abort: StopToken,
    pub(crate) done: Sender<AircraftId>,
}

/// Why a worker left the normal path.
#[derive(Debug, PartialEq, Eq)]
enum Halt {
    /// The crash threshold was crossed after waiting this long.
    Crashed(Duration),
    /// The shutdown sequence aborted the run.
    Aborted,
}

/// Reports the worker's exit on every path, unwinding included.
struct DoneGuard {
    id: AircraftId,
    tx: Sender<AircraftId>,
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(self.id);
    }
}

/// Drives one aircraft. Consumed by [`run`](Self::run).
pub(crate) struct AircraftWorker {
    aircraft: Arc<Aircraft>,
    ctx: WorkerContext,
    rng: ChaCha8Rng,
    held: SmallVec<[Permit; 3]>,
}

impl AircraftWorker {
    pub(crate) fn new(aircraft: Arc<Aircraft>, ctx: WorkerContext) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(ctx.config.seed ^ aircraft.id().0);
        Self {
            aircraft,
            ctx,
            rng,
            held: SmallVec::new(),
        }
    }

    /// Run to a terminal state.
    pub(crate) fn run(mut self) {
        let _done = DoneGuard {
            id: self.aircraft.id(),
            tx: self.ctx.done.clone(),
        };
        match self.fly() {
            Ok(()) => self.complete(),
            Err(Halt::Crashed(waited)) => self.crash(waited),
            Err(Halt::Aborted) => self.terminate(),
        }
    }

    fn id(&self) -> AircraftId {
        self.aircraft.id()
    }

    fn class(&self) -> FlightClass {
        self.aircraft.class()
    }

    fn fly(&mut self) -> Result<(), Halt> {
        for phase in Phase::ALL {
            if phase != Phase::Landing {
                self.advance(phase.waiting_state());
                self.wait_slices(self.ctx.config.turnaround_pause)?;
            }
            for kind in phase.acquisition_order(self.class()) {
                self.acquire(kind)?;
            }
            self.advance(phase.active_state());
            let hold = self.ctx.config.hold_for(phase).sample(&mut self.rng);
            self.wait_slices(hold)?;
            for &kind in phase.release_order() {
                self.release_kind(kind);
            }
            self.ctx.sink.emit(EventKind::PhaseCompleted {
                aircraft: self.id(),
                class: self.class(),
                phase,
            });
        }
        Ok(())
    }

    /// Move along the non-crash path and report it.
    fn advance(&self, to: AircraftState) {
        let from = self.aircraft.state();
        if to.is_waiting() {
            self.aircraft.enter_waiting(to, &self.ctx.clock);
        } else {
            self.aircraft.set_state(to);
        }
        debug!(aircraft = %self.id(), class = %self.class(), %from, %to, "state changed");
        self.ctx.sink.emit(EventKind::StateChanged {
            aircraft: self.id(),
            class: self.class(),
            from,
            to,
        });
    }

    /// Poll the pool until granted, crashed or aborted.
    fn acquire(&mut self, kind: ResourceKind) -> Result<(), Halt> {
        let poll = self.ctx.clock.units(self.ctx.config.acquire_poll);
        loop {
            self.check_policy()?;
            if self.ctx.abort.is_stopped() {
                return Err(Halt::Aborted);
            }
            match self.ctx.pool.acquire(kind, poll) {
                Acquire::Granted(permit) => {
                    self.ctx.sink.emit(EventKind::ResourceAcquired {
                        aircraft: self.id(),
                        class: self.class(),
                        resource: kind,
                        in_use: permit.in_use_at_grant(),
                        capacity: permit.capacity(),
                    });
                    self.held.push(permit);
                    self.publish_held();
                    return Ok(());
                }
                Acquire::TimedOut => continue,
                Acquire::Closed => return Err(Halt::Aborted),
            }
        }
    }

    /// Sleep `n` units in one-unit slices, checking policy after each.
    fn wait_slices(&self, n: u32) -> Result<(), Halt> {
        for _ in 0..n {
            if !self.ctx.abort.sleep(self.ctx.clock.unit()) {
                return Err(Halt::Aborted);
            }
            self.check_policy()?;
        }
        Ok(())
    }

    fn check_policy(&self) -> Result<(), Halt> {
        let a = &self.aircraft;
        let waited = a.waited(&self.ctx.clock);
        let verdict = self
            .ctx
            .policy
            .evaluate(waited, a.alert_raised(), a.is_crashed());
        if verdict.alert {
            a.mark_alert();
            let starvation_cause = match self.class() {
                FlightClass::Domestic => {
                    let n = self.ctx.registry.live_count_of(FlightClass::International);
                    (n > 0).then_some(n)
                }
                FlightClass::International => None,
            };
            warn!(
                aircraft = %self.id(),
                class = %self.class(),
                state = %a.state(),
                waited_units = self.ctx.clock.to_units(waited),
                ?starvation_cause,
                "wait exceeded alert threshold",
            );
            self.ctx.sink.emit(EventKind::Alert {
                aircraft: self.id(),
                class: self.class(),
                state: a.state(),
                waited,
                starvation_cause,
            });
        }
        if verdict.crash {
            a.mark_crashed();
            return Err(Halt::Crashed(waited));
        }
        Ok(())
    }

    fn publish_held(&self) {
        let set: ResourceSet = self.held.iter().map(Permit::kind).collect();
        self.aircraft.set_held(set);
    }

    fn release(&mut self, permit: Permit) {
        let kind = permit.kind();
        let usage = self.ctx.pool.release(permit);
        self.publish_held();
        self.ctx.sink.emit(EventKind::ResourceReleased {
            aircraft: self.id(),
            class: self.class(),
            resource: kind,
            in_use: usage.in_use,
            capacity: usage.capacity,
        });
    }

    fn release_kind(&mut self, kind: ResourceKind) {
        let found = self.held.iter().position(|p| p.kind() == kind);
        debug_assert!(found.is_some(), "{}: releasing unheld {kind}", self.id());
        if let Some(i) = found {
            let permit = self.held.remove(i);
            self.release(permit);
        }
    }

    /// Release everything, most recent grant first.
    fn release_all(&mut self) -> ResourceSet {
        let mut released = ResourceSet::EMPTY;
        while let Some(permit) = self.held.pop() {
            released.insert(permit.kind());
            self.release(permit);
        }
        released
    }

    fn complete(&mut self) {
        debug_assert!(self.held.is_empty());
        self.advance(AircraftState::Completed);
        let cycle_time = self
            .ctx
            .clock
            .elapsed()
            .saturating_sub(self.aircraft.created_at());
        debug!(aircraft = %self.id(), class = %self.class(), ?cycle_time, "completed");
        self.ctx.sink.emit(EventKind::Completed {
            aircraft: self.id(),
            class: self.class(),
            cycle_time,
        });
    }

    /// Release everything and take the escape edge into `Crashed`.
    fn fall(&mut self) -> ResourceSet {
        let released = self.release_all();
        self.advance(AircraftState::Crashed);
        released
    }

    fn crash(&mut self, waited: Duration) {
        let state = self.aircraft.state();
        let released = self.fall();
        // Counted after the transition, so this aircraft is excluded.
        let live_domestic = self.ctx.registry.live_count_of(FlightClass::Domestic);
        let live_international = self.ctx.registry.live_count_of(FlightClass::International);
        let severe_starvation = self.class() == FlightClass::Domestic && live_international > 0;
        warn!(
            aircraft = %self.id(),
            class = %self.class(),
            %state,
            waited_units = self.ctx.clock.to_units(waited),
            live_domestic,
            live_international,
            %released,
            severe_starvation,
            "aircraft crashed",
        );
        self.ctx.sink.emit(EventKind::Crashed {
            aircraft: self.id(),
            class: self.class(),
            state,
            waited,
            live_domestic,
            live_international,
            released,
            severe_starvation,
        });
    }

    fn terminate(&mut self) {
        let state = self.aircraft.state();
        self.aircraft.mark_force_terminated();
        let released = self.fall();
        warn!(
            aircraft = %self.id(),
            class = %self.class(),
            %state,
            %released,
            "aircraft force-terminated at shutdown",
        );
        self.ctx.sink.emit(EventKind::ForcedTermination {
            aircraft: self.id(),
            class: self.class(),
            state,
            released,
        });
    }
}
