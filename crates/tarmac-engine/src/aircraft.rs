//! Aircraft entities and the registry that owns them.
//!
//! An [`Aircraft`] is shared between its worker (the single writer of
//! every mutable field) and any number of readers: the monitor, the
//! crash path counting live traffic, and the final report. Mutable
//! fields are atomics so readers never block the worker.
//!
//! The [`AircraftRegistry`] is an insertion-ordered arena keyed by id.
//! Entries are never removed during a run.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indexmap::IndexMap;
use tarmac_core::{AircraftId, AircraftState, FlightClass, ResourceSet};

use crate::clock::SimClock;
use crate::sync::lock;

// ── Aircraft ──────────────────────────────────────────────────────

/// One aircraft: immutable identity plus worker-owned lifecycle state.
#[derive(Debug)]
pub struct Aircraft {
    id: AircraftId,
    class: FlightClass,
    created_at_nanos: u64,
    state: AtomicU8,
    wait_start_nanos: AtomicU64,
    alert_raised: AtomicBool,
    crashed: AtomicBool,
    force_terminated: AtomicBool,
    held: AtomicU8,
}

impl Aircraft {
    /// A new aircraft in `WaitingLanding`, its wait clock starting now.
    pub fn new(id: AircraftId, class: FlightClass, clock: &SimClock) -> Self {
        let now = clock.now_nanos();
        Self {
            id,
            class,
            created_at_nanos: now,
            state: AtomicU8::new(AircraftState::WaitingLanding.as_u8()),
            wait_start_nanos: AtomicU64::new(now),
            alert_raised: AtomicBool::new(false),
            crashed: AtomicBool::new(false),
            force_terminated: AtomicBool::new(false),
            held: AtomicU8::new(ResourceSet::EMPTY.bits()),
        }
    }

    /// Unique, never reused.
    pub fn id(&self) -> AircraftId {
        self.id
    }

    /// Fixed at creation.
    pub fn class(&self) -> FlightClass {
        self.class
    }

    /// Time from clock start to creation.
    pub fn created_at(&self) -> Duration {
        Duration::from_nanos(self.created_at_nanos)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AircraftState {
        AircraftState::from_u8(self.state.load(Ordering::Acquire)).unwrap_or(AircraftState::Crashed)
    }

    /// Not yet `Completed` or `Crashed`.
    pub fn is_live(&self) -> bool {
        !self.state().is_terminal()
    }

    /// Time spent since the current waiting phase began.
    pub fn waited(&self, clock: &SimClock) -> Duration {
        clock.since_nanos(self.wait_start_nanos.load(Ordering::Acquire))
    }

    /// Whether an alert was raised in the current waiting phase.
    pub fn alert_raised(&self) -> bool {
        self.alert_raised.load(Ordering::Acquire)
    }

    /// Whether the crash policy fired.
    pub fn is_crashed(&self) -> bool {
        self.crashed.load(Ordering::Acquire)
    }

    /// Whether the shutdown sequence terminated this aircraft.
    pub fn is_force_terminated(&self) -> bool {
        self.force_terminated.load(Ordering::Acquire)
    }

    /// Resources currently held.
    pub fn held(&self) -> ResourceSet {
        ResourceSet::from_bits(self.held.load(Ordering::Acquire))
    }

    /// Point-in-time copy of every field.
    pub fn view(&self, clock: &SimClock) -> AircraftView {
        AircraftView {
            id: self.id,
            class: self.class,
            state: self.state(),
            waited: self.waited(clock),
            alert_raised: self.alert_raised(),
            crashed: self.is_crashed(),
            force_terminated: self.is_force_terminated(),
            held: self.held(),
        }
    }

    // Writers below are reserved for the owning worker.

    pub(crate) fn set_state(&self, next: AircraftState) {
        debug_assert!(
            self.state().can_transition_to(next),
            "{}: illegal transition {} -> {}",
            self.id,
            self.state(),
            next,
        );
        self.state.store(next.as_u8(), Ordering::Release);
    }

    /// Enter a waiting state: reset the wait clock and the alert flag.
    pub(crate) fn enter_waiting(&self, next: AircraftState, clock: &SimClock) {
        debug_assert!(next.is_waiting());
        self.wait_start_nanos
            .store(clock.now_nanos(), Ordering::Release);
        self.alert_raised.store(false, Ordering::Release);
        self.set_state(next);
    }

    pub(crate) fn mark_alert(&self) {
        self.alert_raised.store(true, Ordering::Release);
    }

    pub(crate) fn mark_crashed(&self) {
        self.crashed.store(true, Ordering::Release);
    }

    pub(crate) fn mark_force_terminated(&self) {
        self.force_terminated.store(true, Ordering::Release);
    }

    pub(crate) fn set_held(&self, held: ResourceSet) {
        self.held.store(held.bits(), Ordering::Release);
    }
}

/// Plain snapshot of an [`Aircraft`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AircraftView {
    /// Identifier.
    pub id: AircraftId,
    /// Class.
    pub class: FlightClass,
    /// State at snapshot time.
    pub state: AircraftState,
    /// Time in the current waiting phase.
    pub waited: Duration,
    /// Alert raised in the current waiting phase.
    pub alert_raised: bool,
    /// Crash policy fired.
    pub crashed: bool,
    /// Terminated by the shutdown sequence.
    pub force_terminated: bool,
    /// Resources held.
    pub held: ResourceSet,
}

impl AircraftView {
    /// Not yet `Completed` or `Crashed`.
    pub fn is_live(&self) -> bool {
        !self.state.is_terminal()
    }
}

// ── AircraftRegistry ──────────────────────────────────────────────

/// Insertion-ordered arena of every aircraft created in a run.
#[derive(Debug)]
pub struct AircraftRegistry {
    clock: SimClock,
    aircraft: Mutex<IndexMap<AircraftId, Arc<Aircraft>>>,
}

impl AircraftRegistry {
    /// An empty registry whose views are timed against `clock`.
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            aircraft: Mutex::new(IndexMap::new()),
        }
    }

    /// Add a new aircraft and return the shared handle.
    pub fn register(&self, aircraft: Arc<Aircraft>) -> Arc<Aircraft> {
        let prev = lock(&self.aircraft).insert(aircraft.id(), Arc::clone(&aircraft));
        debug_assert!(prev.is_none(), "aircraft id {} reused", aircraft.id());
        aircraft
    }

    /// Look up by id.
    pub fn get(&self, id: AircraftId) -> Option<Arc<Aircraft>> {
        lock(&self.aircraft).get(&id).cloned()
    }

    /// Views of every non-terminal aircraft, in creation order.
    pub fn live(&self) -> Vec<AircraftView> {
        lock(&self.aircraft)
            .values()
            .map(|a| a.view(&self.clock))
            .filter(AircraftView::is_live)
            .collect()
    }

    /// Views of every aircraft ever registered, in creation order.
    pub fn views(&self) -> Vec<AircraftView> {
        lock(&self.aircraft)
            .values()
            .map(|a| a.view(&self.clock))
            .collect()
    }

    /// Live aircraft of `class`.
    pub fn live_count_of(&self, class: FlightClass) -> usize {
        lock(&self.aircraft)
            .values()
            .filter(|a| a.class() == class && a.is_live())
            .count()
    }

    /// Live aircraft of either class.
    pub fn live_count(&self) -> usize {
        lock(&self.aircraft).values().filter(|a| a.is_live()).count()
    }

    /// Aircraft ever registered.
    pub fn len(&self) -> usize {
        lock(&self.aircraft).len()
    }

    /// Nothing registered yet.
    pub fn is_empty(&self) -> bool {
        lock(&self.aircraft).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarmac_core::ResourceKind;

    fn clock() -> SimClock {
        SimClock::start(Duration::from_millis(1))
    }

    #[test]
    fn new_aircraft_waits_to_land_holding_nothing() {
        let clock = clock();
        let a = Aircraft::new(AircraftId(1), FlightClass::International, &clock);
        assert_eq!(a.state(), AircraftState::WaitingLanding);
        assert!(a.is_live());
        assert!(a.held().is_empty());
        assert!(!a.alert_raised());
        assert!(!a.is_crashed());
    }

    #[test]
    fn entering_a_waiting_state_resets_clock_and_alert() {
        let clock = clock();
        let a = Aircraft::new(AircraftId(1), FlightClass::Domestic, &clock);
        std::thread::sleep(Duration::from_millis(20));
        a.mark_alert();
        let before = a.waited(&clock);
        assert!(before >= Duration::from_millis(20));

        a.set_state(AircraftState::Landing);
        a.enter_waiting(AircraftState::WaitingDisembark, &clock);
        assert!(!a.alert_raised());
        assert!(a.waited(&clock) < before);
        assert_eq!(a.state(), AircraftState::WaitingDisembark);
    }

    #[test]
    fn registry_keeps_creation_order_and_counts_live() {
        let clock = clock();
        let reg = AircraftRegistry::new(clock);
        for (i, class) in [
            FlightClass::Domestic,
            FlightClass::International,
            FlightClass::International,
        ]
        .into_iter()
        .enumerate()
        {
            reg.register(Arc::new(Aircraft::new(AircraftId(i as u64), class, &clock)));
        }
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.live_count_of(FlightClass::International), 2);

        let a = reg.get(AircraftId(1)).unwrap();
        a.set_state(AircraftState::Crashed);
        assert_eq!(reg.live_count_of(FlightClass::International), 1);
        assert_eq!(reg.live_count(), 2);

        let ids: Vec<_> = reg.views().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![AircraftId(0), AircraftId(1), AircraftId(2)]);
        let live: Vec<_> = reg.live().iter().map(|v| v.id).collect();
        assert_eq!(live, vec![AircraftId(0), AircraftId(2)]);
        assert!(reg.get(AircraftId(9)).is_none());
    }

    #[test]
    fn view_reflects_holdings() {
        let clock = clock();
        let a = Aircraft::new(AircraftId(4), FlightClass::Domestic, &clock);
        a.set_held([ResourceKind::Tower].into_iter().collect());
        let v = a.view(&clock);
        assert!(v.held.contains(ResourceKind::Tower));
        assert_eq!(v.class, FlightClass::Domestic);
    }
}
