//! per-process trend history.

use {
    crate::{
        config::{Config, SCALE_FLOOR},
        meter::Cell,
        proc::Pid,
        rate::Rate,
    },
    std::{
        collections::BTreeMap,
        time::{Duration, Instant},
    },
};

/// a fixed-capacity circular buffer of cells.
#[derive(Clone, Debug)]
pub struct Ring {
    cells: Box<[Cell]>,
    /// the index of the oldest cell, which the next push overwrites.
    head: usize,
}

/// the recent history of a process that has been among the busiest.
#[derive(Clone, Debug)]
pub struct Trend {
    pub read: Ring,
    pub write: Ring,
    /// the value a full-height cell represents.
    ///
    /// this rises at once to meet a new peak, and otherwise decays geometrically toward recent
    /// activity. it never falls below [`SCALE_FLOOR`].
    scale: f64,
    /// when this process was last among the busiest.
    last_seen: Instant,
}

/// the trends of every process ranked recently enough.
#[derive(Debug)]
pub struct History {
    trends: BTreeMap<Pid, Trend>,
    width: usize,
    decay: f64,
    stale_after: Duration,
}

// === impl Ring ===

impl Ring {
    /// returns a ring of `capacity` empty cells.
    ///
    /// # panics
    ///
    /// panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "a ring must hold at least one cell");

        Self {
            cells: vec![Cell::default(); capacity].into_boxed_slice(),
            head: 0,
        }
    }

    /// overwrites the oldest cell.
    pub fn push(&mut self, cell: Cell) {
        let Self { cells, head } = self;

        cells[*head] = cell;
        *head = (*head + 1) % cells.len();
    }

    /// returns the cells, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        let Self { cells, head } = self;
        let (newer, older) = cells.split_at(*head);
        older.iter().chain(newer)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

// === impl Trend ===

impl Trend {
    fn new(width: usize, now: Instant) -> Self {
        Self {
            read: Ring::new(width),
            write: Ring::new(width),
            scale: SCALE_FLOOR,
            last_seen: now,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    /// records a new rate, quantized into `levels` levels.
    fn record(&mut self, rate: &Rate, levels: usize, decay: f64, now: Instant) {
        let Self {
            read,
            write,
            scale,
            last_seen,
        } = self;

        *last_seen = now;
        *scale = if rate.total > *scale {
            rate.total
        } else {
            (*scale * decay).max(SCALE_FLOOR)
        };

        read.push(Cell::new(rate.read, *scale, levels));
        write.push(Cell::new(rate.write, *scale, levels));
    }
}

// === impl History ===

impl History {
    pub fn new(config: &Config) -> Self {
        let Config {
            history_width,
            decay,
            stale_after,
            ..
        } = *config;

        Self {
            trends: BTreeMap::new(),
            width: history_width,
            decay,
            stale_after,
        }
    }

    /// records the ranked rates of one cycle.
    pub fn update(&mut self, ranked: &[Rate], levels: usize, now: Instant) {
        let Self {
            trends,
            width,
            decay,
            ..
        } = self;

        for rate in ranked {
            trends
                .entry(rate.pid)
                .or_insert_with(|| Trend::new(*width, now))
                .record(rate, levels, *decay, now);
        }
    }

    /// discards the trends of processes that have not been ranked within the staleness window.
    ///
    /// returns the number of trends discarded.
    pub fn evict(&mut self, now: Instant) -> usize {
        let Self {
            trends,
            stale_after,
            ..
        } = self;

        let before = trends.len();
        trends.retain(|pid, trend| {
            let stale = now.saturating_duration_since(trend.last_seen) > *stale_after;
            if stale {
                log::trace!("evicting stale trend for pid {pid}");
            }
            !stale
        });

        before - trends.len()
    }

    pub fn get(&self, pid: &Pid) -> Option<&Trend> {
        self.trends.get(pid)
    }

    pub fn len(&self) -> usize {
        self.trends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trends.is_empty()
    }
}
