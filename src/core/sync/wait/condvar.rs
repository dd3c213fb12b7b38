/*!
 * Idle Signal
 *
 * Condvar on which idle workers park until new work or shutdown arrives.
 *
 * # Lost wakeups
 *
 * The wait predicate runs under the signal's mutex, and notifications take the
 * same mutex. A producer that publishes work and then notifies therefore either
 * runs before the waiter checks the predicate (the waiter sees the work and
 * never sleeps) or after the waiter is parked (the notification reaches it).
 */

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome of a notify call on an [`IdleSignal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// This many parked workers were released
    Woken(usize),
    /// Nobody was parked; the notification was a no-op
    NoWaiters,
}

impl WakeResult {
    fn from_count(count: usize) -> Self {
        match count {
            0 => WakeResult::NoWaiters,
            n => WakeResult::Woken(n),
        }
    }

    /// Workers released by the notification
    #[inline]
    pub fn count(self) -> usize {
        match self {
            WakeResult::Woken(n) => n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// Shared parking spot for idle workers
pub struct IdleSignal {
    mutex: Mutex<()>,
    condvar: Condvar,
    waiters: AtomicUsize,
}

impl IdleSignal {
    pub const fn new() -> Self {
        Self {
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    /// Park while `predicate` holds
    ///
    /// The predicate is checked before the first wait and after every wake,
    /// spurious or not. Returns as soon as it is false.
    pub fn wait_while<F>(&self, mut predicate: F)
    where
        F: FnMut() -> bool,
    {
        let mut guard = self.mutex.lock();
        while predicate() {
            self.waiters.fetch_add(1, Ordering::Relaxed);
            self.condvar.wait(&mut guard);
            self.waiters.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Wake one parked waiter
    pub fn notify_one(&self) -> WakeResult {
        let _guard = self.mutex.lock();
        WakeResult::from_count(usize::from(self.condvar.notify_one()))
    }

    /// Wake every parked waiter
    pub fn notify_all(&self) -> WakeResult {
        let _guard = self.mutex.lock();
        WakeResult::from_count(self.condvar.notify_all())
    }

    /// Approximate number of parked waiters (for diagnostics)
    #[inline]
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }
}

impl Default for IdleSignal {
    fn default() -> Self {
        Self::new()
    }
}
