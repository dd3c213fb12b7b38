/*!
 * Ordered Feed Tests
 * Ordering, removal and membership under each duplicate policy
 */

use feed_server::feed::{DuplicatePolicy, OrderedFeed, PostContent};
use feed_server::core::limits::MAX_CONCURRENT_READERS;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn is_descending(posts: &[PostContent]) -> bool {
    posts.windows(2).all(|w| w[0].timestamp >= w[1].timestamp)
}

#[test]
fn test_add_remove_scenario() {
    let feed = OrderedFeed::new();
    assert!(feed.add("hi", 5.0));
    assert!(feed.add("yo", 7.0));
    assert!(feed.remove(5.0));
    assert!(!feed.contains(5.0));
    assert_eq!(feed.all_posts(), vec![PostContent::new("yo", 7.0)]);
}

#[test]
fn test_duplicate_insert_before_is_newest_first() {
    let feed = OrderedFeed::new();
    feed.add("first", 3.0);
    feed.add("second", 3.0);
    feed.add("older", 1.0);

    let bodies: Vec<_> = feed.all_posts().into_iter().map(|p| p.body).collect();
    assert_eq!(bodies, vec!["second", "first", "older"]);

    // Remove takes the first match in feed order
    assert!(feed.remove(3.0));
    assert_eq!(feed.all_posts()[0].body, "first");
    assert!(feed.contains(3.0));
}

#[test]
fn test_duplicate_insert_after_keeps_arrival_order() {
    let feed = OrderedFeed::with_options(MAX_CONCURRENT_READERS, DuplicatePolicy::InsertAfter);
    feed.add("first", 3.0);
    feed.add("second", 3.0);
    feed.add("newest", 9.0);

    let bodies: Vec<_> = feed.all_posts().into_iter().map(|p| p.body).collect();
    assert_eq!(bodies, vec!["newest", "first", "second"]);
}

#[test]
fn test_random_workload_matches_model() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let feed = OrderedFeed::with_options(MAX_CONCURRENT_READERS, DuplicatePolicy::Reject);
    let mut model = HashSet::new();

    for _ in 0..2_000 {
        let ts = rng.gen_range(0..200) as f64;
        match rng.gen_range(0..3) {
            0 => assert_eq!(feed.add("p", ts), model.insert(ts as i64)),
            1 => assert_eq!(feed.remove(ts), model.remove(&(ts as i64))),
            _ => assert_eq!(feed.contains(ts), model.contains(&(ts as i64))),
        }
    }

    let posts = feed.all_posts();
    assert_eq!(posts.len(), model.len());
    assert!(is_descending(&posts));
}

proptest! {
    #[test]
    fn prop_feed_always_descending(timestamps in prop::collection::vec(-1.0e6f64..1.0e6, 0..200)) {
        let feed = OrderedFeed::new();
        for (i, ts) in timestamps.iter().enumerate() {
            feed.add(format!("post-{i}"), *ts);
        }
        let posts = feed.all_posts();
        prop_assert_eq!(posts.len(), timestamps.len());
        prop_assert!(is_descending(&posts));
    }

    #[test]
    fn prop_remove_reports_presence(
        timestamps in prop::collection::hash_set(0u32..500, 1..100),
        probe in 0u32..500,
    ) {
        let feed = OrderedFeed::with_options(MAX_CONCURRENT_READERS, DuplicatePolicy::Reject);
        for ts in &timestamps {
            prop_assert!(feed.add("p", *ts as f64));
        }

        let existed = timestamps.contains(&probe);
        prop_assert_eq!(feed.contains(probe as f64), existed);
        prop_assert_eq!(feed.remove(probe as f64), existed);
        prop_assert!(!feed.contains(probe as f64));
        // Removal is idempotent
        prop_assert!(!feed.remove(probe as f64));
        prop_assert_eq!(feed.len(), timestamps.len() - usize::from(existed));
    }
}
