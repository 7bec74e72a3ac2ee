// Publishing queue module
//
// Maintains the 1-based, gapless position sequence of each content
// category. Position 1 publishes next; contiguity means queue depth is
// directly observable without a count query.

pub mod engine;
pub mod errors;
pub mod locks;

pub use engine::{QueueEngine, QueueHealth};
pub use errors::{QueueError, QueueResult};
pub use locks::CategoryLocks;
