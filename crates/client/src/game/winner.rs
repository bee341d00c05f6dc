use std::time::{Duration, Instant};

use racer::PlayerId;

use crate::session::Task;
use crate::timer::{Scheduler, TaskHandle};

/// End-of-race announcement. Showing it arms the session reload.
#[derive(Debug)]
pub struct WinnerOverlay {
    reset_delay: Duration,
    winner: Option<PlayerId>,
    reload: Option<TaskHandle>,
}

impl WinnerOverlay {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            reset_delay,
            winner: None,
            reload: None,
        }
    }

    /// Returns true only for the first winner of the session.
    pub fn show(&mut self, winner: &PlayerId, timers: &mut Scheduler<Task>, now: Instant) -> bool {
        if self.winner.is_some() {
            return false;
        }

        log::info!("Player {} won the race", winner);
        self.winner = Some(winner.clone());
        self.reload = Some(timers.schedule(now, self.reset_delay, Task::Reload));
        true
    }

    pub fn is_reload(&self, handle: TaskHandle) -> bool {
        self.reload == Some(handle)
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    pub fn headline(&self) -> Option<String> {
        self.winner.as_ref().map(|id| format!("Player {} Wins!", id))
    }

    pub fn cancel(&mut self, timers: &mut Scheduler<Task>) {
        if let Some(handle) = self.reload.take() {
            timers.cancel(handle);
        }
    }
}
