/*!
 * Ordered Feed
 * Timestamp-ordered post list behind a fair reader-writer lock
 */

use super::list::PostList;
use super::types::{DuplicatePolicy, PostContent};
use crate::core::limits::MAX_CONCURRENT_READERS;
use crate::core::sync::{FairRwLock, LockState};
use std::fmt;

/// A user's feed, most recent post first
///
/// `add` and `remove` take the write lock; `contains`, `all_posts` and `len`
/// take a read lock. Every operation is O(n) in the number of posts.
///
/// # Example
///
/// ```
/// use feed_server::feed::OrderedFeed;
///
/// let feed = OrderedFeed::new();
/// feed.add("hi", 5.0);
/// feed.add("yo", 7.0);
/// assert!(feed.remove(5.0));
/// assert!(!feed.contains(5.0));
/// assert_eq!(feed.all_posts()[0].body, "yo");
/// ```
pub struct OrderedFeed {
    posts: FairRwLock<PostList>,
    policy: DuplicatePolicy,
}

impl OrderedFeed {
    pub fn new() -> Self {
        Self::with_options(MAX_CONCURRENT_READERS, DuplicatePolicy::default())
    }

    pub fn with_options(reader_cap: usize, policy: DuplicatePolicy) -> Self {
        Self {
            posts: FairRwLock::with_reader_cap(PostList::new(), reader_cap),
            policy,
        }
    }

    /// Insert a post before the first post whose timestamp is not greater
    ///
    /// Returns false only under [`DuplicatePolicy::Reject`] when the
    /// timestamp is already present.
    pub fn add(&self, body: impl Into<String>, timestamp: f64) -> bool {
        let body = body.into();
        self.posts.write().insert(body, timestamp, self.policy)
    }

    /// Unlink the post with `timestamp`; false if there is none
    pub fn remove(&self, timestamp: f64) -> bool {
        self.posts.write().remove(timestamp)
    }

    pub fn contains(&self, timestamp: f64) -> bool {
        self.posts.read().contains(timestamp)
    }

    /// Copy of every post in feed order
    pub fn all_posts(&self) -> Vec<PostContent> {
        self.posts.read().snapshot()
    }

    pub fn len(&self) -> usize {
        self.posts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Bookkeeping of the feed's lock (for diagnostics)
    #[inline]
    pub fn lock_state(&self) -> LockState {
        self.posts.state()
    }
}

impl Default for OrderedFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OrderedFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedFeed")
            .field("policy", &self.policy)
            .field("lock", &self.posts)
            .finish()
    }
}
