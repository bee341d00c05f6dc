mod input;
mod winner;

use racer::Snapshot;

pub use input::{Control, InputTracker, KeyOutcome};
pub use winner::WinnerOverlay;

/// Holds the latest snapshot; every update replaces it wholesale.
#[derive(Debug, Default)]
pub struct StateStore {
    current: Option<Snapshot>,
}

impl StateStore {
    pub fn replace(&mut self, snapshot: Snapshot) -> &Snapshot {
        self.current.insert(snapshot)
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
