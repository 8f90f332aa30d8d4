//! converting cumulative counters into throughput.

use {
    crate::{
        config::MIN_ELAPSED,
        proc::{Counters, Pid, Snapshot},
    },
    std::cmp::Ordering,
};

/// the throughput of a single process between two snapshots, in bytes per second.
#[derive(Clone, Debug, PartialEq)]
pub struct Rate {
    pub pid: Pid,
    pub name: String,
    pub read: f64,
    pub write: f64,
    /// the sum of `read` and `write`.
    pub total: f64,
}

/// computes the throughput of each process present in both snapshots.
///
/// processes without a baseline in `old`, and processes that did no i/o, are omitted. a counter
/// that went backwards (the pid was reused, or the counter wrapped) counts as zero bytes for
/// this interval; `new` still becomes the baseline for the next one.
pub fn differentiate(old: &Snapshot, new: &Snapshot) -> Vec<Rate> {
    let elapsed = new
        .time
        .saturating_duration_since(old.time)
        .max(MIN_ELAPSED)
        .as_secs_f64();

    new.procs
        .iter()
        .filter_map(|(pid, now)| old.procs.get(pid).map(|then| (then, now)))
        .filter_map(|(then, now)| Rate::between(then, now, elapsed))
        .collect()
}

/// returns the `top` busiest processes, busiest first.
///
/// ties are broken by pid, lowest first.
pub fn rank(mut rates: Vec<Rate>, top: usize) -> Vec<Rate> {
    rates.sort_by(Rate::busiest_first);
    rates.truncate(top);
    rates
}

// === impl Rate ===

impl Rate {
    fn between(then: &Counters, now: &Counters, elapsed: f64) -> Option<Self> {
        // a decrease means the counter restarted; treat this interval as idle.
        let read = now.read.saturating_sub(then.read);
        let write = now.write.saturating_sub(then.write);

        if read == 0 && write == 0 {
            return None;
        }

        let (read, write) = (read as f64 / elapsed, write as f64 / elapsed);
        Some(Self {
            pid: now.pid,
            name: now.name.clone(),
            read,
            write,
            total: read + write,
        })
    }

    fn busiest_first(a: &Self, b: &Self) -> Ordering {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.pid.cmp(&b.pid))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::time::{Duration, Instant},
    };

    fn snapshot(time: Instant, procs: &[(u32, u64, u64)]) -> Snapshot {
        let procs = procs
            .iter()
            .map(|&(pid, read, write)| Counters::new(pid, format!("proc{pid}"), read, write));
        Snapshot::new(time, procs)
    }

    fn rate(pid: u32, total: f64) -> Rate {
        Rate {
            pid: Pid::new(pid),
            name: format!("proc{pid}"),
            read: total,
            write: 0.0,
            total,
        }
    }

    mod differentiate_tests {
        use super::*;

        #[test]
        fn read_only() {
            let t0 = Instant::now();
            let old = snapshot(t0, &[(100, 1000, 500)]);
            let new = snapshot(t0 + Duration::from_secs(1), &[(100, 3000, 500)]);

            let rates = differentiate(&old, &new);
            assert_eq!(
                rates,
                vec![Rate {
                    pid: Pid::new(100),
                    name: "proc100".to_owned(),
                    read: 2000.0,
                    write: 0.0,
                    total: 2000.0,
                }]
            );
        }

        #[test]
        fn scaled_by_elapsed() {
            let t0 = Instant::now();
            let old = snapshot(t0, &[(1, 0, 0)]);
            let new = snapshot(t0 + Duration::from_millis(500), &[(1, 1000, 3000)]);

            let [rate]: [Rate; 1] = differentiate(&old, &new).try_into().unwrap();
            assert_eq!(rate.read, 2000.0);
            assert_eq!(rate.write, 6000.0);
            assert_eq!(rate.total, 8000.0);
        }

        /// a counter that goes backwards yields no rate, and becomes the next baseline.
        #[test]
        fn counter_reset() {
            let t0 = Instant::now();
            let t1 = t0 + Duration::from_secs(1);
            let t2 = t1 + Duration::from_secs(1);
            let a = snapshot(t0, &[(100, 5000, 0)]);
            let b = snapshot(t1, &[(100, 200, 0)]);
            let c = snapshot(t2, &[(100, 700, 0)]);

            assert!(differentiate(&a, &b).is_empty());

            let [rate]: [Rate; 1] = differentiate(&b, &c).try_into().unwrap();
            assert_eq!(rate.read, 500.0);
        }

        /// only the counter that went backwards is zeroed.
        #[test]
        fn partial_reset() {
            let t0 = Instant::now();
            let old = snapshot(t0, &[(7, 5000, 100)]);
            let new = snapshot(t0 + Duration::from_secs(1), &[(7, 10, 400)]);

            let [rate]: [Rate; 1] = differentiate(&old, &new).try_into().unwrap();
            assert_eq!(rate.read, 0.0);
            assert_eq!(rate.write, 300.0);
            assert_eq!(rate.total, 300.0);
        }

        #[test]
        fn new_process_waits_a_cycle() {
            let t0 = Instant::now();
            let t1 = t0 + Duration::from_secs(1);
            let t2 = t1 + Duration::from_secs(1);
            let a = Snapshot::empty(t0);
            let b = snapshot(t1, &[(42, 1000, 1000)]);
            let c = snapshot(t2, &[(42, 2000, 1000)]);

            assert!(differentiate(&a, &b).is_empty());

            let [rate]: [Rate; 1] = differentiate(&b, &c).try_into().unwrap();
            assert_eq!(rate.pid, Pid::new(42));
            assert_eq!(rate.total, 1000.0);
        }

        #[test]
        fn exited_process_is_dropped() {
            let t0 = Instant::now();
            let old = snapshot(t0, &[(1, 0, 0), (2, 0, 0)]);
            let new = snapshot(t0 + Duration::from_secs(1), &[(2, 10, 0)]);

            let [rate]: [Rate; 1] = differentiate(&old, &new).try_into().unwrap();
            assert_eq!(rate.pid, Pid::new(2));
        }

        #[test]
        fn idle_is_dropped() {
            let t0 = Instant::now();
            let old = snapshot(t0, &[(1, 10, 10)]);
            let new = snapshot(t0 + Duration::from_secs(1), &[(1, 10, 10)]);

            assert!(differentiate(&old, &new).is_empty());
        }

        /// snapshots taken at the same instant do not divide by zero.
        #[test]
        fn zero_elapsed() {
            let t0 = Instant::now();
            let old = snapshot(t0, &[(1, 0, 0)]);
            let new = snapshot(t0, &[(1, 1, 0)]);

            let [rate]: [Rate; 1] = differentiate(&old, &new).try_into().unwrap();
            assert!((rate.read - 1000.0).abs() < 1e-6);
        }

        /// a clock that steps backwards is treated like a zero interval.
        #[test]
        fn backwards_clock() {
            let t1 = Instant::now() + Duration::from_secs(5);
            let old = snapshot(t1, &[(1, 0, 0)]);
            let new = snapshot(t1 - Duration::from_secs(1), &[(1, 1, 0)]);

            let [rate]: [Rate; 1] = differentiate(&old, &new).try_into().unwrap();
            assert!(rate.read.is_finite());
        }

        #[test]
        fn never_negative() {
            let t0 = Instant::now();
            let counters = [0, 1, 1000, u64::MAX / 2, u64::MAX];
            for &a in &counters {
                for &b in &counters {
                    let old = snapshot(t0, &[(1, a, b)]);
                    let new = snapshot(t0 + Duration::from_millis(250), &[(1, b, a)]);
                    for rate in differentiate(&old, &new) {
                        assert!(rate.read >= 0.0);
                        assert!(rate.write >= 0.0);
                        assert!(rate.total > 0.0);
                    }
                }
            }
        }

        #[test]
        fn uses_new_name() {
            let t0 = Instant::now();
            let old = Snapshot::new(t0, [Counters::new(9, "sh", 0, 0)]);
            let new = Snapshot::new(
                t0 + Duration::from_secs(1),
                [Counters::new(9, "postgres", 10, 0)],
            );

            let [rate]: [Rate; 1] = differentiate(&old, &new).try_into().unwrap();
            assert_eq!(rate.name, "postgres");
        }
    }

    mod rank_tests {
        use super::*;

        fn pids(rates: &[Rate]) -> Vec<u32> {
            rates.iter().map(|r| r.pid.as_u32()).collect()
        }

        #[test]
        fn ties_break_by_pid() {
            let ranked = rank(vec![rate(1, 5.0), rate(3, 9.0), rate(2, 9.0)], 10);
            assert_eq!(pids(&ranked), [2, 3, 1]);
        }

        #[test]
        fn truncates() {
            let rates = (1..=10).map(|pid| rate(pid, pid as f64)).collect();
            let ranked = rank(rates, 3);
            assert_eq!(pids(&ranked), [10, 9, 8]);
        }

        #[test]
        fn fewer_than_top() {
            let ranked = rank(vec![rate(4, 1.0)], 5);
            assert_eq!(pids(&ranked), [4]);
        }

        #[test]
        fn empty() {
            assert!(rank(Vec::new(), 5).is_empty());
        }

        #[test]
        fn order_is_independent_of_input_order() {
            let a = rank(vec![rate(1, 5.0), rate(2, 9.0), rate(3, 9.0)], 3);
            let b = rank(vec![rate(3, 9.0), rate(1, 5.0), rate(2, 9.0)], 3);
            assert_eq!(a, b);
        }
    }
}
