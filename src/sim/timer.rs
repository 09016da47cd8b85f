/// Countdown timer driving the lose condition.
///
///   running ∧ ¬expired : time_left -= dt each frame, expire at ≤ 0
///   expired            : time_left pinned at 0 until `reset`
///
/// `add_time`/`subtract_time` never expire the clock themselves; a negative
/// balance is caught by the next tick.

use tracing::debug;

/// Float noise tolerance for the expiry check. Subtracting 0.1 three hundred
/// times from 30.0 does not land on exactly zero.
const EXPIRY_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug)]
pub struct CountdownTimer {
    initial: f64,
    time_left: f64,
    running: bool,
    expired: bool,
}

impl CountdownTimer {
    /// A running timer at `initial` seconds.
    pub fn new(initial: f64) -> Self {
        CountdownTimer { initial, time_left: initial, running: true, expired: false }
    }

    /// Advance one frame. Returns true on the tick the clock runs out.
    pub fn tick(&mut self, dt: f64) -> bool {
        if !self.running || self.expired { return false; }
        self.time_left -= dt;
        if self.time_left <= EXPIRY_EPSILON {
            self.time_left = 0.0;
            self.expired = true;
            self.running = false;
            debug!("countdown expired");
            return true;
        }
        false
    }

    /// Returns false (and changes nothing) once expired.
    pub fn add_time(&mut self, seconds: f64) -> bool {
        if self.expired { return false; }
        self.time_left += seconds;
        true
    }

    /// Returns false (and changes nothing) once expired.
    pub fn subtract_time(&mut self, seconds: f64) -> bool {
        if self.expired { return false; }
        self.time_left -= seconds;
        true
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        if !self.expired { self.running = true; }
    }

    /// Back to the initial duration, running, latch cleared.
    pub fn reset(&mut self) {
        self.time_left = self.initial;
        self.expired = false;
        self.running = true;
    }

    pub fn time_left(&self) -> f64 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn display(&self) -> String {
        format_clock(self.time_left)
    }
}

/// `MM:SS` of `floor(t + 1)`, so the last second reads `00:01`.
pub fn format_clock(time_left: f64) -> String {
    if time_left <= 0.0 { return String::from("00:00"); }
    let total = (time_left + 1.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_seconds_at_tenth_expires_on_tick_300() {
        let mut t = CountdownTimer::new(30.0);
        let mut fired_at = vec![];
        for tick in 1..=400 {
            if t.tick(0.1) { fired_at.push(tick); }
        }
        assert_eq!(fired_at, vec![300]);
        assert_eq!(t.time_left(), 0.0);
        assert!(!t.is_running());
    }

    #[test]
    fn add_and_subtract_are_additive() {
        let mut t = CountdownTimer::new(10.0);
        t.add_time(5.0);
        t.subtract_time(3.0);
        t.add_time(5.0);
        assert_eq!(t.time_left(), 17.0);
    }

    #[test]
    fn nothing_rearms_after_expiry() {
        let mut t = CountdownTimer::new(0.05);
        assert!(t.tick(0.1));
        assert!(!t.add_time(10.0));
        assert!(!t.subtract_time(1.0));
        assert_eq!(t.time_left(), 0.0);
        t.resume();
        for _ in 0..10 {
            assert!(!t.tick(0.1));
        }
    }

    #[test]
    fn subtract_below_zero_expires_next_tick() {
        let mut t = CountdownTimer::new(2.0);
        t.subtract_time(3.0);
        assert!(!t.is_expired());
        assert!(t.tick(0.016));
        assert_eq!(t.time_left(), 0.0);
    }

    #[test]
    fn paused_timer_holds() {
        let mut t = CountdownTimer::new(5.0);
        t.pause();
        assert!(!t.tick(1.0));
        assert_eq!(t.time_left(), 5.0);
        assert!(!t.is_expired());
        t.resume();
        t.tick(1.0);
        assert_eq!(t.time_left(), 4.0);
    }

    #[test]
    fn reset_clears_latch() {
        let mut t = CountdownTimer::new(1.0);
        t.tick(2.0);
        t.reset();
        assert!(!t.is_expired());
        assert!(t.is_running());
        assert_eq!(t.time_left(), 1.0);
        assert!(t.tick(1.0));
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(30.0), "00:31");
        assert_eq!(format_clock(29.5), "00:30");
        assert_eq!(format_clock(0.4), "00:01");
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(-2.0), "00:00");
        assert_eq!(format_clock(75.2), "01:16");
    }
}
