use std::time::{Duration, Instant};

/// High-level behaviour requested by the caller.
///
/// The render policy decides whether the animation clock advances with every
/// tick or stays pinned at a fixed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RenderPolicy {
    /// Advance the clock on every tick at the driver's cadence.
    #[default]
    Animate,
    /// Pin the clock at `time` seconds; presses still animate amplitude.
    Still {
        /// Timestamp to evaluate the effect at (seconds).
        time: f32,
    },
}

impl RenderPolicy {
    pub fn is_still(&self) -> bool {
        matches!(self, RenderPolicy::Still { .. })
    }
}

/// Tracks when the next tick is due.
///
/// The interval changes with the driver's speed, so every tick re-arms the
/// deadline using the interval the driver reports at that moment.
#[derive(Debug, Clone, Default)]
pub(crate) struct TickScheduler {
    next_due: Option<Instant>,
    idle: bool,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready_for_tick(&self, now: Instant) -> bool {
        !self.idle && self.next_due.is_none_or(|due| now >= due)
    }

    /// Arms the next deadline; parks when `now + interval` is not representable.
    pub fn mark_ticked(&mut self, now: Instant, interval: Duration) {
        match now.checked_add(interval) {
            Some(due) => self.next_due = Some(due),
            None => self.park(),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.idle {
            None
        } else {
            self.next_due
        }
    }

    /// Stops issuing ticks until [`wake`](Self::wake) is called.
    pub fn park(&mut self) {
        self.idle = true;
    }

    /// Resumes ticking immediately.
    pub fn wake(&mut self) {
        self.idle = false;
        self.next_due = None;
    }

    pub fn is_parked(&self) -> bool {
        self.idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_due_immediately() {
        let scheduler = TickScheduler::new();
        assert!(scheduler.ready_for_tick(Instant::now()));
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn waits_for_interval_after_tick() {
        let mut scheduler = TickScheduler::new();
        let now = Instant::now();
        scheduler.mark_ticked(now, Duration::from_millis(16));
        assert!(!scheduler.ready_for_tick(now + Duration::from_millis(10)));
        assert!(scheduler.ready_for_tick(now + Duration::from_millis(16)));
        assert_eq!(
            scheduler.next_deadline(),
            Some(now + Duration::from_millis(16))
        );
    }

    #[test]
    fn parked_scheduler_never_ticks_until_woken() {
        let mut scheduler = TickScheduler::new();
        let now = Instant::now();
        scheduler.mark_ticked(now, Duration::from_millis(8));
        scheduler.park();
        assert!(scheduler.is_parked());
        assert!(!scheduler.ready_for_tick(now + Duration::from_secs(1)));
        assert_eq!(scheduler.next_deadline(), None);
        scheduler.wake();
        assert!(scheduler.ready_for_tick(now));
    }

    #[test]
    fn unrepresentable_interval_parks_instead_of_overflowing() {
        let mut scheduler = TickScheduler::new();
        let now = Instant::now();
        scheduler.mark_ticked(now, Duration::MAX);
        assert!(scheduler.is_parked());
        assert_eq!(scheduler.next_deadline(), None);
        scheduler.wake();
        assert!(scheduler.ready_for_tick(now));
    }

    #[test]
    fn still_policy_is_detected() {
        assert!(RenderPolicy::Still { time: 2.0 }.is_still());
        assert!(!RenderPolicy::default().is_still());
    }
}
