use std::time::Duration;

/// Ticks allowed to run back to back after the host stalled. Anything beyond
/// this is dropped and the schedule restarts from the current time.
pub const MAX_CATCH_UP_TICKS: u32 = 5;

/// Fixed-rate repeating timer driven by host timestamps.
///
/// The host hands in a monotonic `now` (time since any fixed epoch) and the
/// metronome answers how many ticks fell due since the last call. The first
/// call after `start` only anchors the schedule.
#[derive(Debug, Clone)]
pub struct Metronome {
    interval: Duration,
    armed: bool,
    next_due: Option<Duration>,
}

impl Metronome {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            armed: false,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn start(&mut self) {
        if !self.armed {
            self.armed = true;
            self.next_due = None;
        }
    }

    /// Cancels the pending tick immediately. A later `start` waits a full interval.
    pub fn stop(&mut self) {
        self.armed = false;
        self.next_due = None;
    }

    pub fn due_ticks(&mut self, now: Duration) -> u32 {
        if !self.armed {
            return 0;
        }

        let due = match self.next_due {
            None => {
                self.next_due = Some(now + self.interval);
                return 0;
            }
            Some(due) if now < due => return 0,
            Some(due) => due,
        };

        let behind = (now - due).as_nanos() / self.interval.as_nanos();
        let ticks = behind.saturating_add(1);

        if ticks > MAX_CATCH_UP_TICKS as u128 {
            log::warn!(
                "timer fell {} ticks behind, dropping {}",
                ticks,
                ticks - MAX_CATCH_UP_TICKS as u128
            );
            self.next_due = Some(now + self.interval);
            return MAX_CATCH_UP_TICKS;
        }

        let ticks = ticks as u32;
        self.next_due = Some(due + self.interval * ticks);
        ticks
    }
}
