/*!
 * Post List
 *
 * Singly linked chain of posts sorted by descending timestamp. Each post is
 * owned by its predecessor (the first by `head`), so unlinking a post drops
 * it. Not synchronized; `OrderedFeed` wraps it in a fair lock.
 */

use super::types::{DuplicatePolicy, PostContent};

struct Post {
    body: String,
    timestamp: f64,
    next: Option<Box<Post>>,
}

#[derive(Default)]
pub(super) struct PostList {
    head: Option<Box<Post>>,
    len: usize,
}

impl PostList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Insert keeping descending order; false only when `Reject` hits a duplicate
    pub fn insert(&mut self, body: String, timestamp: f64, policy: DuplicatePolicy) -> bool {
        let passes = |post: &Post| {
            post.timestamp > timestamp
                || (policy == DuplicatePolicy::InsertAfter && post.timestamp == timestamp)
        };

        let mut cursor = &mut self.head;
        while cursor.as_deref().is_some_and(passes) {
            if let Some(post) = cursor {
                cursor = &mut post.next;
            }
        }

        if policy == DuplicatePolicy::Reject
            && cursor.as_ref().is_some_and(|post| post.timestamp == timestamp)
        {
            return false;
        }

        let next = cursor.take();
        *cursor = Some(Box::new(Post {
            body,
            timestamp,
            next,
        }));
        self.len += 1;
        true
    }

    /// Unlink the first post with exactly `timestamp`
    pub fn remove(&mut self, timestamp: f64) -> bool {
        // Sorted descending: nothing after the head can be larger
        if self.head.as_ref().map_or(true, |first| timestamp > first.timestamp) {
            return false;
        }

        let mut cursor = &mut self.head;
        while cursor.as_ref().is_some_and(|post| post.timestamp > timestamp) {
            if let Some(post) = cursor {
                cursor = &mut post.next;
            }
        }

        match cursor.take() {
            Some(post) if post.timestamp == timestamp => {
                *cursor = post.next;
                self.len -= 1;
                true
            }
            other => {
                *cursor = other;
                false
            }
        }
    }

    pub fn contains(&self, timestamp: f64) -> bool {
        for post in self.iter() {
            if post.timestamp == timestamp {
                return true;
            }
            if post.timestamp < timestamp {
                return false;
            }
        }
        false
    }

    pub fn snapshot(&self) -> Vec<PostContent> {
        self.iter()
            .map(|post| PostContent::new(post.body.clone(), post.timestamp))
            .collect()
    }

    fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }
}

impl Drop for PostList {
    fn drop(&mut self) {
        // Unlink one post at a time so long feeds do not recurse through Box drops
        let mut next = self.head.take();
        while let Some(mut post) = next {
            next = post.next.take();
        }
    }
}

struct Iter<'a> {
    next: Option<&'a Post>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Post;

    fn next(&mut self) -> Option<Self::Item> {
        let post = self.next?;
        self.next = post.next.as_deref();
        Some(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamps(list: &PostList) -> Vec<f64> {
        list.iter().map(|post| post.timestamp).collect()
    }

    fn bodies(list: &PostList) -> Vec<&str> {
        list.iter().map(|post| post.body.as_str()).collect()
    }

    #[test]
    fn test_insert_keeps_descending_order() {
        let mut list = PostList::new();
        for ts in [3.0, 9.0, 1.0, 5.0, 7.0] {
            assert!(list.insert(format!("p{ts}"), ts, DuplicatePolicy::InsertBefore));
        }
        assert_eq!(timestamps(&list), vec![9.0, 7.0, 5.0, 3.0, 1.0]);
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn test_duplicate_policies() {
        let mut before = PostList::new();
        before.insert("old".into(), 2.0, DuplicatePolicy::InsertBefore);
        before.insert("new".into(), 2.0, DuplicatePolicy::InsertBefore);
        assert_eq!(bodies(&before), vec!["new", "old"]);

        let mut after = PostList::new();
        after.insert("old".into(), 2.0, DuplicatePolicy::InsertAfter);
        after.insert("low".into(), 1.0, DuplicatePolicy::InsertAfter);
        after.insert("new".into(), 2.0, DuplicatePolicy::InsertAfter);
        assert_eq!(bodies(&after), vec!["old", "new", "low"]);

        let mut reject = PostList::new();
        assert!(reject.insert("old".into(), 2.0, DuplicatePolicy::Reject));
        assert!(!reject.insert("new".into(), 2.0, DuplicatePolicy::Reject));
        assert_eq!(bodies(&reject), vec!["old"]);
        assert_eq!(reject.len(), 1);
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let mut list = PostList::new();
        for ts in [1.0, 2.0, 3.0, 4.0] {
            list.insert(String::new(), ts, DuplicatePolicy::InsertBefore);
        }
        assert!(list.remove(4.0));
        assert!(list.remove(2.0));
        assert!(list.remove(1.0));
        assert_eq!(timestamps(&list), vec![3.0]);
        assert!(!list.remove(2.5));
        assert!(!list.remove(10.0));
        assert!(list.remove(3.0));
        assert!(!list.remove(3.0));
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn test_contains_stops_early() {
        let mut list = PostList::new();
        for ts in [10.0, 8.0, 6.0] {
            list.insert(String::new(), ts, DuplicatePolicy::InsertBefore);
        }
        assert!(list.contains(8.0));
        assert!(!list.contains(7.0));
        assert!(!list.contains(11.0));
        assert!(!list.contains(1.0));
    }

    #[test]
    fn test_nan_is_never_found() {
        let mut list = PostList::new();
        list.insert("a".into(), 1.0, DuplicatePolicy::InsertBefore);
        list.insert("nan".into(), f64::NAN, DuplicatePolicy::InsertBefore);
        assert_eq!(bodies(&list), vec!["nan", "a"]);
        assert!(!list.contains(f64::NAN));
        assert!(!list.remove(f64::NAN));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_long_list_drops_without_recursion() {
        let mut list = PostList::new();
        // Ascending inserts always land at the head
        for i in 0..200_000 {
            list.insert(String::new(), i as f64, DuplicatePolicy::InsertBefore);
        }
        assert_eq!(list.len(), 200_000);
        drop(list);
    }
}
