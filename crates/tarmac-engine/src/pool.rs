//! Capacity-bounded counting resources with bounded-wait acquisition.
//!
//! Each [`ResourceKind`] is an independent counter behind its own mutex
//! and condition variable. No method ever holds more than one of those
//! locks, so the pool cannot add a lock-order deadlock of its own on top
//! of the resource-order one the simulation studies.
//!
//! A grant is a [`Permit`]. [`ResourcePool::release`] consumes it, which
//! makes a release without a prior grant unrepresentable.
//!
//! Waiters are woken in whatever order the OS scheduler picks. There is
//! no queue and no fairness between waiters.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use tarmac_core::{PoolError, ResourceKind, ResourceSet, Usage, MAX_CAPACITY};

use crate::sync::lock;

// ── ResourceCapacities ────────────────────────────────────────────

/// Units of each resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceCapacities {
    /// Runways. Default: 3.
    pub runway: u32,
    /// Gates. Default: 5.
    pub gate: u32,
    /// Tower channels. Default: 2.
    pub tower: u32,
}

impl Default for ResourceCapacities {
    fn default() -> Self {
        Self {
            runway: 3,
            gate: 5,
            tower: 2,
        }
    }
}

impl ResourceCapacities {
    /// The same capacity for all three resources.
    pub const fn uniform(n: u32) -> Self {
        Self {
            runway: n,
            gate: n,
            tower: n,
        }
    }

    /// Capacity of `kind`.
    pub fn get(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Runway => self.runway,
            ResourceKind::Gate => self.gate,
            ResourceKind::Tower => self.tower,
        }
    }

    /// Check every capacity is in `1..=MAX_CAPACITY`.
    pub fn validate(&self) -> Result<(), PoolError> {
        for kind in ResourceKind::ALL {
            let requested = self.get(kind);
            if requested == 0 {
                return Err(PoolError::ZeroCapacity { kind });
            }
            if requested > MAX_CAPACITY {
                return Err(PoolError::CapacityTooLarge { kind, requested });
            }
        }
        Ok(())
    }
}

// ── Permit / Acquire ──────────────────────────────────────────────

/// Proof of one granted unit. Hand it back with [`ResourcePool::release`].
#[must_use = "a dropped permit leaks its resource unit"]
#[derive(Debug, PartialEq, Eq)]
pub struct Permit {
    kind: ResourceKind,
    in_use: u32,
    capacity: u32,
}

impl Permit {
    /// The resource this permit is a unit of.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Units in use right after this grant, this one included.
    pub fn in_use_at_grant(&self) -> u32 {
        self.in_use
    }

    /// Capacity of the granting resource.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Outcome of a bounded acquire.
#[derive(Debug, PartialEq, Eq)]
pub enum Acquire {
    /// A unit was granted.
    Granted(Permit),
    /// No unit became free before the timeout.
    TimedOut,
    /// The pool was closed; nothing will be granted again.
    Closed,
}

// ── ResourcePool ──────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Counter {
    in_use: u32,
    peak: u32,
    closed: bool,
}

#[derive(Debug)]
struct Slot {
    kind: ResourceKind,
    capacity: u32,
    counter: Mutex<Counter>,
    freed: Condvar,
}

impl Slot {
    fn new(kind: ResourceKind, capacity: u32) -> Self {
        Self {
            kind,
            capacity,
            counter: Mutex::new(Counter::default()),
            freed: Condvar::new(),
        }
    }

    fn usage(&self, c: &Counter) -> Usage {
        Usage {
            kind: self.kind,
            in_use: c.in_use,
            capacity: self.capacity,
            peak: c.peak,
        }
    }
}

/// The three shared airport resources.
#[derive(Debug)]
pub struct ResourcePool {
    slots: [Slot; 3],
}

impl ResourcePool {
    /// Build a pool. Fails if any capacity is zero or too large.
    pub fn new(capacities: ResourceCapacities) -> Result<Self, PoolError> {
        capacities.validate()?;
        Ok(Self {
            slots: ResourceKind::ALL.map(|kind| Slot::new(kind, capacities.get(kind))),
        })
    }

    fn slot(&self, kind: ResourceKind) -> &Slot {
        &self.slots[kind.index()]
    }

    /// Wait up to `timeout` for a unit of `kind`.
    ///
    /// No other lock is held while blocked, so the caller can re-check
    /// its own deadlines between attempts.
    pub fn acquire(&self, kind: ResourceKind, timeout: Duration) -> Acquire {
        let slot = self.slot(kind);
        let guard = lock(&slot.counter);
        let (mut c, _) = slot
            .freed
            .wait_timeout_while(guard, timeout, |c| !c.closed && c.in_use >= slot.capacity)
            .unwrap_or_else(PoisonError::into_inner);
        if c.closed {
            return Acquire::Closed;
        }
        if c.in_use >= slot.capacity {
            return Acquire::TimedOut;
        }
        c.in_use += 1;
        c.peak = c.peak.max(c.in_use);
        Acquire::Granted(Permit {
            kind,
            in_use: c.in_use,
            capacity: slot.capacity,
        })
    }

    /// Return a unit and wake one waiter. Returns the usage after release.
    ///
    /// Still accepted after [`close`](Self::close) so that aborted
    /// workers can hand back what they hold.
    pub fn release(&self, permit: Permit) -> Usage {
        let slot = self.slot(permit.kind);
        let mut c = lock(&slot.counter);
        debug_assert!(c.in_use > 0, "{} released below zero", slot.kind);
        c.in_use = c.in_use.saturating_sub(1);
        let usage = slot.usage(&c);
        drop(c);
        slot.freed.notify_one();
        usage
    }

    /// Current occupancy of `kind`.
    pub fn usage(&self, kind: ResourceKind) -> Usage {
        let slot = self.slot(kind);
        let c = lock(&slot.counter);
        slot.usage(&c)
    }

    /// Occupancy of every resource, in [`ResourceKind::ALL`] order.
    ///
    /// Each entry is read under its own lock; the array is not a single
    /// atomic snapshot across resources.
    pub fn utilization(&self) -> [Usage; 3] {
        ResourceKind::ALL.map(|kind| self.usage(kind))
    }

    /// Resources with every unit granted.
    pub fn saturated(&self) -> ResourceSet {
        self.utilization()
            .into_iter()
            .filter(Usage::is_saturated)
            .map(|u| u.kind)
            .collect()
    }

    /// Capacity of `kind`.
    pub fn capacity(&self, kind: ResourceKind) -> u32 {
        self.slot(kind).capacity
    }

    /// Fail every current and future acquire with [`Acquire::Closed`].
    pub fn close(&self) {
        for slot in &self.slots {
            lock(&slot.counter).closed = true;
            slot.freed.notify_all();
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        lock(&self.slots[0].counter).closed
    }
}
