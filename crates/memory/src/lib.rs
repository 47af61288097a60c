pub mod store;
pub mod usage;

pub use store::{MemoryRecord, MemoryStore};
pub use usage::{UsageRecord, UsageTracker};
