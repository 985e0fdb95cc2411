//! Simulation time and cooperative stop signals.
//!
//! [`SimClock`] converts the integer *time units* used throughout the
//! configuration into wall time, and timestamps everything relative to
//! one process-local origin so that atomics can store instants as plain
//! nanosecond counts.
//!
//! [`StopToken`] is the suspension-point view of a stop signal. Nothing
//! is ever sent on the underlying channel; the signal fires when the
//! owning [`StopHandle`] drops its sender, which disconnects every
//! receiver at once and wakes any thread blocked in
//! [`StopToken::sleep`].

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Shared time base for one run.
#[derive(Clone, Copy, Debug)]
pub struct SimClock {
    origin: Instant,
    unit: Duration,
}

impl SimClock {
    /// Start a clock now. `unit` is the wall duration of one time unit.
    pub fn start(unit: Duration) -> Self {
        Self {
            origin: Instant::now(),
            unit,
        }
    }

    /// Wall duration of one time unit.
    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Wall duration of `n` time units.
    pub fn units(&self, n: u32) -> Duration {
        self.unit.saturating_mul(n)
    }

    /// Express a wall duration in (fractional) time units.
    pub fn to_units(&self, d: Duration) -> f64 {
        if self.unit.is_zero() {
            return 0.0;
        }
        d.as_secs_f64() / self.unit.as_secs_f64()
    }

    /// Time since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// [`elapsed`](Self::elapsed) as nanoseconds, for atomic storage.
    pub fn now_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    /// Time elapsed since an instant previously read with
    /// [`now_nanos`](Self::now_nanos). Saturates at zero.
    pub fn since_nanos(&self, nanos: u64) -> Duration {
        Duration::from_nanos(self.now_nanos().saturating_sub(nanos))
    }
}

/// Owning side of a stop signal. Dropping it also fires the signal.
#[derive(Debug)]
pub struct StopHandle {
    tx: Option<Sender<()>>,
}

impl StopHandle {
    /// Create a fresh signal and its first token.
    pub fn pair() -> (StopHandle, StopToken) {
        let (tx, rx) = crossbeam_channel::bounded(0);
        (StopHandle { tx: Some(tx) }, StopToken { rx })
    }

    /// Fire the signal. Idempotent.
    pub fn fire(&mut self) {
        self.tx.take();
    }

    /// Whether [`fire`](Self::fire) has been called.
    pub fn is_fired(&self) -> bool {
        self.tx.is_none()
    }
}

/// Observing side of a stop signal, cloned into every thread that must
/// react to it.
#[derive(Clone, Debug)]
pub struct StopToken {
    rx: Receiver<()>,
}

impl StopToken {
    /// A token that never fires.
    pub fn never() -> Self {
        Self {
            rx: crossbeam_channel::never(),
        }
    }

    /// Non-blocking check.
    pub fn is_stopped(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// The underlying channel, for use in `select!`. It never carries a
    /// message; it only disconnects.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }

    /// Sleep for `d` unless the signal fires first.
    ///
    /// Returns `true` if the full duration elapsed, `false` if the signal
    /// fired (immediately, if it already had).
    pub fn sleep(&self, d: Duration) -> bool {
        matches!(self.rx.recv_timeout(d), Err(RecvTimeoutError::Timeout))
    }
}
