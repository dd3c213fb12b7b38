/*!
 * Fair Reader-Writer Lock
 *
 * Condvar-based reader-writer lock with writer priority and a cap on
 * concurrently admitted readers.
 *
 * # Fairness
 *
 * - A writer registers in `waiting_writers` before it blocks. While any writer
 *   is waiting, new readers are not admitted, so a steady stream of readers
 *   cannot starve a writer.
 * - At most `reader_cap` readers hold the lock at once, which bounds how many
 *   readers a pending writer has to wait out.
 *
 * # Wake discipline
 *
 * - Writer release and last-reader release broadcast: any waiter may now be
 *   eligible.
 * - A reader leaving while others remain frees exactly one reader slot, so it
 *   signals a single waiter.
 */

use crate::core::limits::MAX_CONCURRENT_READERS;
use parking_lot::{Condvar, Mutex};
use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Snapshot of the lock's bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockState {
    pub active_readers: usize,
    pub writer_active: bool,
    pub waiting_writers: usize,
}

/// The bare fair lock protocol, guarding no data
///
/// Callers pair every `acquire_*` with the matching `release_*`.
/// [`FairRwLock`] wraps this with RAII guards.
pub struct RawFairRwLock {
    state: Mutex<LockState>,
    cond: Condvar,
    reader_cap: usize,
}

impl RawFairRwLock {
    /// Create a lock admitting at most [`MAX_CONCURRENT_READERS`] readers
    pub const fn new() -> Self {
        Self::with_reader_cap(MAX_CONCURRENT_READERS)
    }

    /// Create a lock with a custom reader cap (clamped to at least 1)
    pub const fn with_reader_cap(reader_cap: usize) -> Self {
        Self {
            state: Mutex::new(LockState {
                active_readers: 0,
                writer_active: false,
                waiting_writers: 0,
            }),
            cond: Condvar::new(),
            reader_cap: if reader_cap == 0 { 1 } else { reader_cap },
        }
    }

    #[inline]
    pub fn reader_cap(&self) -> usize {
        self.reader_cap
    }

    /// Block until exclusive access is granted
    pub fn acquire_write(&self) {
        let mut state = self.state.lock();
        state.waiting_writers += 1;
        while state.writer_active || state.active_readers > 0 {
            self.cond.wait(&mut state);
        }
        state.waiting_writers -= 1;
        state.writer_active = true;
    }

    pub fn release_write(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.writer_active, "release_write without an active writer");
        state.writer_active = false;
        self.cond.notify_all();
    }

    /// Block until shared access is granted
    pub fn acquire_read(&self) {
        let mut state = self.state.lock();
        while state.writer_active
            || state.waiting_writers > 0
            || state.active_readers >= self.reader_cap
        {
            self.cond.wait(&mut state);
        }
        state.active_readers += 1;
    }

    pub fn release_read(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.active_readers > 0, "release_read without an active reader");
        state.active_readers = state.active_readers.saturating_sub(1);
        if state.active_readers == 0 {
            self.cond.notify_all();
        } else {
            self.cond.notify_one();
        }
    }

    /// Current bookkeeping (stale as soon as it is returned)
    pub fn state(&self) -> LockState {
        *self.state.lock()
    }
}

impl Default for RawFairRwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RawFairRwLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFairRwLock")
            .field("state", &self.state())
            .field("reader_cap", &self.reader_cap)
            .finish()
    }
}

/// Data guarded by a [`RawFairRwLock`]
pub struct FairRwLock<T> {
    raw: RawFairRwLock,
    data: UnsafeCell<T>,
}

// Safety: access to `data` is serialized by `raw`: many `&T` under read
// guards, or one `&mut T` under a write guard.
unsafe impl<T: Send> Send for FairRwLock<T> {}
unsafe impl<T: Send + Sync> Sync for FairRwLock<T> {}

impl<T> FairRwLock<T> {
    pub fn new(value: T) -> Self {
        Self::with_reader_cap(value, MAX_CONCURRENT_READERS)
    }

    pub fn with_reader_cap(value: T, reader_cap: usize) -> Self {
        Self {
            raw: RawFairRwLock::with_reader_cap(reader_cap),
            data: UnsafeCell::new(value),
        }
    }

    /// Shared access; blocks while a writer holds or waits for the lock
    pub fn read(&self) -> FairReadGuard<'_, T> {
        self.raw.acquire_read();
        FairReadGuard { lock: self }
    }

    /// Exclusive access
    pub fn write(&self) -> FairWriteGuard<'_, T> {
        self.raw.acquire_write();
        FairWriteGuard { lock: self }
    }

    #[inline]
    pub fn state(&self) -> LockState {
        self.raw.state()
    }
}

impl<T: Default> Default for FairRwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for FairRwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FairRwLock")
            .field("state", &self.raw.state())
            .field("reader_cap", &self.raw.reader_cap())
            .finish_non_exhaustive()
    }
}

/// Shared access to a [`FairRwLock`]; releases the read slot on drop
#[must_use = "the read lock is released as soon as the guard is dropped"]
pub struct FairReadGuard<'a, T> {
    lock: &'a FairRwLock<T>,
}

impl<T> Deref for FairReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: a read slot is held, no writer can be active
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for FairReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.release_read();
    }
}

/// Exclusive access to a [`FairRwLock`]; releases the lock on drop
#[must_use = "the write lock is released as soon as the guard is dropped"]
pub struct FairWriteGuard<'a, T> {
    lock: &'a FairRwLock<T>,
}

impl<T> Deref for FairWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: the writer holds the lock exclusively
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for FairWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the writer holds the lock exclusively
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for FairWriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.release_write();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_read_then_write() {
        let lock = FairRwLock::new(vec![1, 2, 3]);
        {
            let a = lock.read();
            let b = lock.read();
            assert_eq!(a.len(), 3);
            assert_eq!(b[0], 1);
            assert_eq!(lock.state().active_readers, 2);
        }
        lock.write().push(4);
        assert_eq!(*lock.read(), vec![1, 2, 3, 4]);
        assert_eq!(lock.state(), LockState::default());
    }

    #[test]
    fn test_writer_state_flags() {
        let lock = FairRwLock::new(0u32);
        let mut guard = lock.write();
        *guard += 1;
        let state = lock.state();
        assert!(state.writer_active);
        assert_eq!(state.active_readers, 0);
        drop(guard);
        assert!(!lock.state().writer_active);
    }

    #[test]
    fn test_zero_cap_is_clamped() {
        let raw = RawFairRwLock::with_reader_cap(0);
        assert_eq!(raw.reader_cap(), 1);
        raw.acquire_read();
        raw.release_read();
    }

    #[test]
    fn test_reader_cap_blocks_extra_reader() {
        let lock = Arc::new(FairRwLock::with_reader_cap((), 2));
        let first = lock.read();
        let second = lock.read();

        let admitted = Arc::new(AtomicUsize::new(0));
        let handle = {
            let lock = lock.clone();
            let admitted = admitted.clone();
            thread::spawn(move || {
                let _third = lock.read();
                admitted.fetch_add(1, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(admitted.load(Ordering::SeqCst), 0);
        assert_eq!(lock.state().active_readers, 2);

        drop(first);
        handle.join().unwrap();
        assert_eq!(admitted.load(Ordering::SeqCst), 1);
        drop(second);
        assert_eq!(lock.state(), LockState::default());
    }
}
