use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    io,
    time::{Duration, Instant},
};

pub use self::{clock::*, keys::*, probe::*};

mod clock {
    use super::*;

    pub trait Clock {
        fn now(&self) -> Instant;
    }

    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> Instant {
            Instant::now()
        }
    }

    /// a mock clock that moves forward by a fixed step each time it is read.
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockClock {
        now: Cell<Instant>,
        step: Duration,
    }

    impl MockClock {
        #[allow(dead_code, reason = "this is a testing utility.")]
        pub fn new(step: Duration) -> Self {
            Self {
                now: Cell::new(Instant::now()),
                step,
            }
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            let Self { now, step } = self;

            let time = now.get();
            now.set(time + *step);
            time
        }
    }
}

/// abstracts over providers of process i/o statistics.
mod probe {
    use {
        super::*,
        crate::proc::{Counters, DiskStat, IoCounters, Pid},
        std::{fs, path::Path},
    };

    /// a source of process i/o counters and disk pressure.
    pub trait Probe {
        /// returns the cumulative i/o counters of every process that could be inspected.
        ///
        /// processes that cannot be inspected, because they exited or belong to another user,
        /// are omitted.
        fn sample(&self) -> Result<Vec<Counters>, ProbeError>;

        /// returns the number of requests waiting on storage devices.
        fn queue_depth(&self) -> Result<f64, ProbeError>;
    }

    /// an error that prevented the probe from producing any reading.
    #[derive(Debug, thiserror::Error)]
    pub enum ProbeError {
        #[error("could not read {path}: {source}")]
        Io {
            path: &'static str,
            #[source]
            source: io::Error,
        },
        #[error("could not parse {path}: {source}")]
        Parse {
            path: &'static str,
            #[source]
            source: crate::proc::ParseError,
        },
    }

    /// statistics backed by `/proc`.
    #[derive(Debug, Default)]
    pub struct ProcFs {
        /// the weighted i/o time and wall time of the previous queue depth reading.
        last: RefCell<Option<(Instant, u64)>>,
    }

    /// a mock probe.
    #[derive(Default)]
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockProbe {
        samples: RefCell<VecDeque<Result<Vec<Counters>, ProbeError>>>,
        depths: RefCell<VecDeque<Result<f64, ProbeError>>>,
    }

    // === impl ProcFs ===

    impl Probe for ProcFs {
        fn sample(&self) -> Result<Vec<Counters>, ProbeError> {
            let entries = fs::read_dir(Self::PROC).map_err(|source| ProbeError::Io {
                path: Self::PROC,
                source,
            })?;

            let procs = entries
                .filter_map(Result::ok)
                .filter_map(|entry| entry.file_name().to_str()?.parse::<Pid>().ok())
                .filter_map(|pid| match Self::counters(pid) {
                    Ok(counters) => Some(counters),
                    Err(error) => {
                        log::trace!("skipping pid {pid}: {error}");
                        None
                    }
                })
                .collect();

            Ok(procs)
        }

        fn queue_depth(&self) -> Result<f64, ProbeError> {
            let Self { last } = self;

            let now = Instant::now();
            let weighted_ms = Self::weighted_ms()?;
            let Some((then, prev)) = last.replace(Some((now, weighted_ms))) else {
                return Ok(0.0);
            };

            let wall_ms = now.saturating_duration_since(then).as_secs_f64() * 1000.0;
            if wall_ms <= 0.0 {
                return Ok(0.0);
            }

            // NB: a device that disappeared between readings may make this go backwards.
            let busy_ms = weighted_ms.saturating_sub(prev) as f64;
            Ok(busy_ms / wall_ms)
        }
    }

    impl ProcFs {
        const PROC: &str = "/proc";
        const DISKSTATS: &str = "/proc/diskstats";
        const SYS_BLOCK: &str = "/sys/block";

        /// reads the counters of a single process.
        fn counters(pid: Pid) -> Result<Counters, Box<dyn std::error::Error>> {
            let dir = Path::new(Self::PROC).join(pid.to_string());
            let IoCounters {
                read_bytes,
                write_bytes,
            } = fs::read_to_string(dir.join("io"))?.parse()?;
            let name = fs::read_to_string(dir.join("comm"))?;

            Ok(Counters {
                pid,
                name: name.trim_end().to_owned(),
                read: read_bytes,
                write: write_bytes,
            })
        }

        /// sums the weighted i/o time of every physical disk.
        fn weighted_ms() -> Result<u64, ProbeError> {
            let path = Self::DISKSTATS;
            let stats = fs::read_to_string(path).map_err(|source| ProbeError::Io { path, source })?;

            let mut total = 0_u64;
            for line in stats.lines().filter(|l| !l.trim().is_empty()) {
                let stat = line
                    .parse::<DiskStat>()
                    .map_err(|source| ProbeError::Parse { path, source })?;
                if Self::is_disk(&stat) {
                    total = total.saturating_add(stat.weighted_ms);
                }
            }

            Ok(total)
        }

        /// returns true for whole, physical disks; partitions are not listed in `/sys/block`.
        fn is_disk(stat: &DiskStat) -> bool {
            !stat.is_virtual() && Path::new(Self::SYS_BLOCK).join(&stat.name).exists()
        }
    }

    // === impl MockProbe ===

    #[allow(dead_code, reason = "this is a testing utility.")]
    impl MockProbe {
        /// queues a successful sample.
        pub fn push_sample(&self, sample: Vec<Counters>) {
            self.samples.borrow_mut().push_back(Ok(sample));
        }

        /// queues a failed sample.
        pub fn push_sample_error(&self) {
            let error = ProbeError::Io {
                path: "/proc",
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            };
            self.samples.borrow_mut().push_back(Err(error));
        }

        pub fn push_depth(&self, depth: f64) {
            self.depths.borrow_mut().push_back(Ok(depth));
        }

        pub fn push_depth_error(&self) {
            let error = ProbeError::Io {
                path: "/proc/diskstats",
                source: io::Error::from(io::ErrorKind::NotFound),
            };
            self.depths.borrow_mut().push_back(Err(error));
        }
    }

    impl Probe for MockProbe {
        fn sample(&self) -> Result<Vec<Counters>, ProbeError> {
            let Self { samples, .. } = self;

            samples
                .borrow_mut()
                .pop_front()
                .expect("mock samples should not be empty")
        }

        /// returns queued depths, then zero.
        fn queue_depth(&self) -> Result<f64, ProbeError> {
            let Self { depths, .. } = self;

            depths.borrow_mut().pop_front().unwrap_or(Ok(0.0))
        }
    }
}

/// abstracts over sources of keyboard input.
mod keys {
    use {
        super::*,
        crossterm::event::{self, Event, KeyEvent},
    };

    /// a source of key presses.
    pub trait Keys {
        /// returns the next key event, waiting at most `timeout` for one to arrive.
        ///
        /// returns `Ok(None)` if no key was pressed in time.
        fn poll(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
    }

    /// key events read from the terminal.
    #[derive(Debug, Default)]
    pub struct TerminalKeys;

    /// a mock key source.
    #[derive(Default)]
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockKeys {
        keys: VecDeque<Option<KeyEvent>>,
    }

    impl Keys for TerminalKeys {
        fn poll(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
            if !event::poll(timeout)? {
                return Ok(None);
            }

            match event::read()? {
                Event::Key(key) => Ok(Some(key)),
                _ => Ok(None),
            }
        }
    }

    #[allow(dead_code, reason = "this is a testing utility.")]
    impl MockKeys {
        /// returns a source that yields each of `keys` in turn, with `None` meaning no input.
        pub fn new(keys: impl IntoIterator<Item = Option<KeyEvent>>) -> Self {
            Self {
                keys: keys.into_iter().collect(),
            }
        }
    }

    impl Keys for MockKeys {
        /// yields the queued keys, then no input.
        fn poll(&mut self, _: Duration) -> io::Result<Option<KeyEvent>> {
            let Self { keys } = self;

            Ok(keys.pop_front().flatten())
        }
    }
}
