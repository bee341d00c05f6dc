mod stats;

pub use stats::SnapshotStats;
