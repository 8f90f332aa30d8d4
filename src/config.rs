//! policy constants and runtime configuration.

use {
    crate::meter::Style,
    std::{
        fmt::{self, Display},
        time::Duration,
    },
};

/// the number of processes shown when none is requested.
pub const DEFAULT_TOP: usize = 5;

/// the largest number of processes that may be shown.
pub const MAX_TOP: usize = 20;

/// the number of cells in each sparkline.
pub const HISTORY_WIDTH: usize = 30;

/// the factor applied to a trend's scale each cycle it is not exceeded.
pub const DECAY: f64 = 0.95;

/// the smallest value a trend's scale may take.
pub const SCALE_FLOOR: f64 = 1.0;

/// how long a trend may go unranked before it is discarded.
pub const STALE_AFTER: Duration = Duration::from_secs(30);

/// the queue depth at which the disk pressure meter is full.
pub const QUEUE_SATURATION: f64 = 2.0;

/// the width of the disk pressure meter.
pub const METER_WIDTH: usize = 30;

/// how long a single key poll may wait for input.
pub const POLL_GRANULARITY: Duration = Duration::from_millis(10);

/// the smallest elapsed time used when computing rates.
///
/// two snapshots taken within the clock's resolution would otherwise divide by zero.
pub const MIN_ELAPSED: Duration = Duration::from_millis(1);

/// the widest a process name may be before it is truncated.
pub const NAME_WIDTH: usize = 16;

/// the sampling intervals that may be stepped through, shortest first.
pub const INTERVALS: [Duration; 13] = [
    Duration::from_millis(100),
    Duration::from_millis(200),
    Duration::from_millis(300),
    Duration::from_millis(400),
    Duration::from_millis(500),
    Duration::from_millis(600),
    Duration::from_millis(700),
    Duration::from_millis(800),
    Duration::from_millis(900),
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(5),
    Duration::from_secs(10),
];

/// runtime configuration for a monitoring session.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// how many of the busiest processes to show.
    pub top: usize,
    /// how sparklines are drawn.
    pub style: Style,
    /// how often to sample.
    pub interval: Interval,
    /// the number of cells in each sparkline.
    pub history_width: usize,
    /// the factor applied to a trend's scale each cycle it is not exceeded.
    pub decay: f64,
    /// how long a trend may go unranked before it is discarded.
    pub stale_after: Duration,
    /// the queue depth at which the disk pressure meter is full.
    pub queue_saturation: f64,
}

/// a position in the [`INTERVALS`] table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Interval(usize);

// === impl Config ===

impl Default for Config {
    fn default() -> Self {
        Self {
            top: DEFAULT_TOP,
            style: Style::default(),
            interval: Interval::default(),
            history_width: HISTORY_WIDTH,
            decay: DECAY,
            stale_after: STALE_AFTER,
            queue_saturation: QUEUE_SATURATION,
        }
    }
}

impl Config {
    /// sets the number of processes to show, clamped to `1..=MAX_TOP`.
    pub fn with_top(self, top: usize) -> Self {
        Self {
            top: top.clamp(1, MAX_TOP),
            ..self
        }
    }

    pub fn with_style(self, style: Style) -> Self {
        Self { style, ..self }
    }
}

// === impl Interval ===

impl Default for Interval {
    /// one second.
    fn default() -> Self {
        Self(9)
    }
}

impl Interval {
    /// returns the length of this interval.
    pub fn duration(&self) -> Duration {
        let Self(index) = self;
        INTERVALS[*index]
    }

    /// returns the next longer interval, or this one if it is the longest.
    pub fn slower(self) -> Self {
        let Self(index) = self;
        Self((index + 1).min(INTERVALS.len() - 1))
    }

    /// returns the next shorter interval, or this one if it is the shortest.
    pub fn faster(self) -> Self {
        let Self(index) = self;
        Self(index.saturating_sub(1))
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duration = self.duration();
        if duration < Duration::from_secs(1) {
            write!(f, "{}ms", duration.as_millis())
        } else {
            write!(f, "{}s", duration.as_secs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_one_second() {
        assert_eq!(Interval::default().duration(), Duration::from_secs(1));
    }

    #[test]
    fn intervals_ascend() {
        assert!(INTERVALS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn step_once() {
        let interval = Interval::default();
        assert_eq!(interval.slower().duration(), Duration::from_secs(2));
        assert_eq!(interval.faster().duration(), Duration::from_millis(900));
    }

    #[test]
    fn slower_stops_at_longest() {
        let longest = (0..100).fold(Interval::default(), |i, _| i.slower());
        assert_eq!(longest.duration(), Duration::from_secs(10));
        assert_eq!(longest.slower(), longest);
    }

    #[test]
    fn faster_stops_at_shortest() {
        let shortest = (0..100).fold(Interval::default(), |i, _| i.faster());
        assert_eq!(shortest.duration(), Duration::from_millis(100));
        assert_eq!(shortest.faster(), shortest);
    }

    /// any sequence of steps stays within the table.
    #[test]
    fn stepping_stays_in_range() {
        let mut interval = Interval::default();
        for i in 0..500_u32 {
            // a crude, deterministic walk biased in both directions.
            interval = if (i * 7919) % 13 < 6 {
                interval.faster()
            } else {
                interval.slower()
            };
            let duration = interval.duration();
            assert!(duration >= INTERVALS[0]);
            assert!(duration <= INTERVALS[INTERVALS.len() - 1]);
        }
    }

    #[test]
    fn display() {
        let shortest = (0..20).fold(Interval::default(), |i, _| i.faster());
        assert_eq!(shortest.to_string(), "100ms");
        assert_eq!(Interval::default().to_string(), "1s");
        assert_eq!(Interval::default().slower().slower().to_string(), "5s");
    }

    #[test]
    fn top_is_clamped() {
        assert_eq!(Config::default().with_top(0).top, 1);
        assert_eq!(Config::default().with_top(7).top, 7);
        assert_eq!(Config::default().with_top(99).top, MAX_TOP);
    }
}
