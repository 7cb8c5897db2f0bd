pub mod batches;
pub mod pairs;

pub use batches::{schedule_batches, Batch};
pub use pairs::{group_live_photos, Grouping, GroupingUnit, LivePhotoPair};
