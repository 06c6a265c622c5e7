use std::time::{Duration, Instant};

/// Demo cadence; a "real" pet would age once a minute.
pub const DEFAULT_DECAY_PERIOD: Duration = Duration::from_secs(15);
/// Longer periods are cut down to this so deadlines stay representable.
pub const MAX_DECAY_PERIOD: Duration = Duration::from_secs(365 * 24 * 3600);

/// Periodic trigger for idle decay.
///
/// Time is passed in by the caller. A late poll fires once and re-arms from
/// that instant, so ticks missed while the process was stalled are dropped.
#[derive(Clone, Debug)]
pub struct DecayScheduler {
    period: Duration,
    next_due: Option<Instant>,
}

impl DecayScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.clamp(Duration::from_millis(1), MAX_DECAY_PERIOD),
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = self.deadline_after(now);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Returns true when a decay tick is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = self.deadline_after(now);
                true
            }
            _ => false,
        }
    }

    // a deadline past the end of Instant's range can never arrive, so it disarms
    fn deadline_after(&self, now: Instant) -> Option<Instant> {
        now.checked_add(self.period)
    }
}

impl Default for DecayScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: Duration = Duration::from_secs(15);

    #[test]
    fn idle_until_started() {
        let t0 = Instant::now();
        let mut s = DecayScheduler::new(P);
        assert!(!s.is_armed());
        assert!(!s.poll(t0 + P * 10));
    }

    #[test]
    fn fires_once_per_period() {
        let t0 = Instant::now();
        let mut s = DecayScheduler::new(P);
        s.start(t0);
        assert!(!s.poll(t0));
        assert!(!s.poll(t0 + P - Duration::from_millis(1)));
        assert!(s.poll(t0 + P));
        assert!(!s.poll(t0 + P));
        assert!(s.poll(t0 + P * 2));
    }

    #[test]
    fn stall_drops_missed_ticks() {
        let t0 = Instant::now();
        let mut s = DecayScheduler::new(P);
        s.start(t0);
        let late = t0 + P * 20;
        let fired = (0..20).filter(|_| s.poll(late)).count();
        assert_eq!(fired, 1);
        assert_eq!(s.next_due(), Some(late + P));
    }

    #[test]
    fn stop_disarms() {
        let t0 = Instant::now();
        let mut s = DecayScheduler::default();
        assert_eq!(s.period(), DEFAULT_DECAY_PERIOD);
        s.start(t0);
        s.stop();
        assert!(!s.is_armed());
        assert!(!s.poll(t0 + P * 3));
        s.start(t0 + P * 3);
        assert!(s.poll(t0 + P * 4));
    }

    #[test]
    fn huge_period_is_capped_and_never_fires_early() {
        let t0 = Instant::now();
        let mut s = DecayScheduler::new(Duration::from_secs(u64::MAX));
        assert_eq!(s.period(), MAX_DECAY_PERIOD);
        s.start(t0);
        assert!(s.is_armed());
        assert!(!s.poll(t0 + Duration::from_secs(3600)));
        assert_eq!(s.next_due(), Some(t0 + MAX_DECAY_PERIOD));
    }

    #[test]
    fn zero_period_is_bumped() {
        let s = DecayScheduler::new(Duration::ZERO);
        assert!(s.period() > Duration::ZERO);
    }
}
