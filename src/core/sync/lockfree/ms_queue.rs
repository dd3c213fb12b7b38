/*!
 * Lock-Free MPMC Queue
 *
 * Unbounded FIFO queue after Michael & Scott, with node reclamation through
 * crossbeam-epoch.
 *
 * ## Layout
 *
 * ```text
 * head -> [sentinel] -> [a] -> [b] -> [c] -> null
 *                                      ^
 *                                     tail (may lag one or more nodes)
 * ```
 *
 * `head` always points at a consumed node (the sentinel). Dequeue swings
 * `head` to the successor and takes that node's value, turning the successor
 * into the new sentinel. `tail` is advanced lazily; any thread that finds it
 * lagging moves it forward before retrying.
 *
 * ## Reclamation
 *
 * Every operation runs under an epoch guard. A retired sentinel is handed to
 * `defer_destroy`, so threads that loaded it before the swing can still
 * dereference it safely.
 */

use crossbeam_epoch::{self as epoch, Atomic, Owned, Shared};
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::Ordering;

struct Node<T> {
    /// Uninitialized in the sentinel and in every node whose value was taken
    value: MaybeUninit<T>,
    next: Atomic<Node<T>>,
}

impl<T> Node<T> {
    fn sentinel() -> Self {
        Self {
            value: MaybeUninit::uninit(),
            next: Atomic::null(),
        }
    }
}

/// Unbounded multi-producer multi-consumer FIFO queue
///
/// # Guarantees
///
/// - **Lock-free**: enqueue and dequeue retry a compare-and-swap, never block
/// - **Linearizable FIFO**: items leave in the order their links were published
/// - **Exactly once**: each item is returned by one dequeue, or dropped with the queue
pub struct LockFreeQueue<T> {
    head: Atomic<Node<T>>,
    tail: Atomic<Node<T>>,
}

// Safety: values only move between threads through enqueue/dequeue, and
// each value is read by the single thread that wins the head swing.
unsafe impl<T: Send> Send for LockFreeQueue<T> {}
unsafe impl<T: Send> Sync for LockFreeQueue<T> {}

impl<T> LockFreeQueue<T> {
    pub fn new() -> Self {
        let queue = Self {
            head: Atomic::null(),
            tail: Atomic::null(),
        };
        // Safety: the queue is not shared yet
        let guard = unsafe { epoch::unprotected() };
        let sentinel = Owned::new(Node::sentinel()).into_shared(guard);
        queue.head.store(sentinel, Ordering::Relaxed);
        queue.tail.store(sentinel, Ordering::Relaxed);
        queue
    }

    /// Append a value at the tail
    pub fn enqueue(&self, value: T) {
        let guard = &epoch::pin();
        let node = Owned::new(Node {
            value: MaybeUninit::new(value),
            next: Atomic::null(),
        })
        .into_shared(guard);

        loop {
            let tail = self.tail.load(Ordering::Acquire, guard);
            // Safety: tail is never null and the guard keeps it alive
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Ordering::Acquire, guard);

            if !next.is_null() {
                // Tail is lagging: help it forward, then retry
                let _ = self
                    .tail
                    .compare_exchange(tail, next, Ordering::Release, Ordering::Relaxed, guard);
                continue;
            }

            if tail_ref
                .next
                .compare_exchange(Shared::null(), node, Ordering::Release, Ordering::Relaxed, guard)
                .is_ok()
            {
                // Best effort; a racing thread may already have moved it
                let _ = self
                    .tail
                    .compare_exchange(tail, node, Ordering::Release, Ordering::Relaxed, guard);
                return;
            }
        }
    }

    /// Take the value at the head, or `None` when the queue is empty
    pub fn dequeue(&self) -> Option<T> {
        let guard = &epoch::pin();

        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            let tail = self.tail.load(Ordering::Acquire, guard);
            // Safety: head is never null and the guard keeps it alive
            let next = unsafe { head.deref() }.next.load(Ordering::Acquire, guard);
            // Safety: a non-null successor stays alive for the guard's lifetime
            let next_ref = unsafe { next.as_ref() }?;

            if head == tail {
                let _ = self
                    .tail
                    .compare_exchange(tail, next, Ordering::Release, Ordering::Relaxed, guard);
                continue;
            }

            if self
                .head
                .compare_exchange(head, next, Ordering::AcqRel, Ordering::Relaxed, guard)
                .is_ok()
            {
                // Safety: winning the swing gives this thread sole ownership
                // of `next`'s value; `next` is the new sentinel and never reads
                // it again. The old sentinel is unreachable from head and tail.
                unsafe {
                    let value = next_ref.value.as_ptr().read();
                    guard.defer_destroy(head);
                    return Some(value);
                }
            }
        }
    }

    /// Snapshot emptiness check; may be stale immediately
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        let head = self.head.load(Ordering::Acquire, guard);
        // Safety: head is never null and the guard keeps it alive
        unsafe { head.deref() }.next.load(Ordering::Acquire, guard).is_null()
    }
}

impl<T> Default for LockFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockFreeQueue<T> {
    fn drop(&mut self) {
        while self.dequeue().is_some() {}

        // Safety: `&mut self` means no other thread can observe the queue
        unsafe {
            let guard = epoch::unprotected();
            let sentinel = self.head.load(Ordering::Relaxed, guard);
            drop(sentinel.into_owned());
        }
    }
}

impl<T> fmt::Debug for LockFreeQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeQueue")
            .field("is_empty", &self.is_empty())
            .finish()
    }
}
