/*!
 * Feed
 *
 * In-memory feed of posts ordered by descending timestamp, safe to share
 * between consumer threads.
 */

mod list;
mod ordered;
mod types;

pub use ordered::OrderedFeed;
pub use types::{DuplicatePolicy, PostContent};
