use std::time::Duration;

use tokio::time::Instant;

pub const COUNTDOWN_WINDOW: Duration = Duration::from_secs(10);

/// Pre-battle countdown anchored at a captured start instant. The display
/// value depends only on elapsed time, so a late tick never shows a stale
/// or negative number.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    started: Instant,
    window: Duration,
}

impl Countdown {
    pub fn new(started: Instant, window: Duration) -> Self {
        Countdown { started, window }
    }

    pub fn start_now() -> Self {
        Self::new(Instant::now(), COUNTDOWN_WINDOW)
    }

    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// Whole seconds left at `now`: the window length at the start, then one
    /// less per elapsed second, never below zero.
    pub fn remaining_at(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.started).as_secs();
        self.window_secs().saturating_sub(elapsed)
    }

    pub fn is_done_at(&self, now: Instant) -> bool {
        self.remaining_at(now) == 0
    }

    /// The instant the displayed value next changes.
    pub fn next_tick_after(&self, now: Instant) -> Instant {
        let elapsed = now.saturating_duration_since(self.started).as_secs();
        self.started + Duration::from_secs(elapsed + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 10)]
    #[case(999, 10)]
    #[case(1_000, 9)]
    #[case(9_999, 1)]
    #[case(10_000, 0)]
    #[case(60_000, 0)]
    fn test_remaining_at(#[case] elapsed_ms: u64, #[case] expected: u64) {
        let start = Instant::now();
        let countdown = Countdown::new(start, COUNTDOWN_WINDOW);

        assert_eq!(
            countdown.remaining_at(start + Duration::from_millis(elapsed_ms)),
            expected
        );
    }

    #[test]
    fn test_clock_before_start_shows_full_window() {
        let start = Instant::now() + Duration::from_secs(5);
        let countdown = Countdown::new(start, COUNTDOWN_WINDOW);

        assert_eq!(countdown.remaining_at(Instant::now()), 10);
    }

    #[test]
    fn test_remaining_never_increases() {
        let start = Instant::now();
        let countdown = Countdown::new(start, COUNTDOWN_WINDOW);

        let values: Vec<u64> = (0..=120)
            .map(|tenth| countdown.remaining_at(start + Duration::from_millis(tenth * 100)))
            .collect();

        assert!(values.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(values.first(), Some(&10));
        assert_eq!(values.last(), Some(&0));
    }

    #[test]
    fn test_next_tick_is_on_second_boundary() {
        let start = Instant::now();
        let countdown = Countdown::new(start, COUNTDOWN_WINDOW);

        assert_eq!(
            countdown.next_tick_after(start + Duration::from_millis(2_300)),
            start + Duration::from_secs(3)
        );
        assert!(countdown.is_done_at(start + Duration::from_secs(10)));
    }
}
