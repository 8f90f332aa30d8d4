use {
    crate::source::{Probe, ProbeError},
    std::{
        collections::BTreeMap,
        fmt::{self, Display},
        num::ParseIntError,
        str::FromStr,
        time::Instant,
    },
};

pub use self::{diskstats::DiskStat, io::IoCounters};

mod diskstats;
mod io;


/// a snapshot of each process' cumulative i/o counters at a moment in time.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub procs: BTreeMap<Pid, Counters>,
    pub time: Instant,
}

/// a process identifier.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Pid(u32);

/// the cumulative i/o counters of a single process.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Counters {
    pub pid: Pid,
    /// the name of the process, as shown on screen.
    pub name: String,
    /// bytes this process has caused to be fetched from storage.
    pub read: u64,
    /// bytes this process has caused to be sent to storage.
    pub write: u64,
}

/// an error parsing one of the kernel's pseudo-files.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("missing field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {source}")]
    Value {
        field: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("truncated diskstats line")]
    Truncated,
}

// === impl Snapshot ===

impl Snapshot {
    /// a snapshot containing no processes.
    pub fn empty(time: Instant) -> Self {
        Self {
            procs: BTreeMap::new(),
            time,
        }
    }

    /// uses the given probe to take a snapshot of the processes' i/o counters.
    pub(crate) fn read(probe: &impl Probe, time: Instant) -> Result<Self, ProbeError> {
        probe.sample().map(|procs| Self::new(time, procs))
    }

    /// collects counters into a snapshot taken at `time`.
    pub fn new(time: Instant, procs: impl IntoIterator<Item = Counters>) -> Self {
        let procs = procs.into_iter().map(|c| (c.pid, c)).collect();
        Self { procs, time }
    }
}

// === impl Pid ===

impl Pid {
    pub const fn new(pid: u32) -> Self {
        Self(pid)
    }

    pub const fn as_u32(&self) -> u32 {
        let Self(pid) = self;
        *pid
    }
}

impl Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(pid) = self;
        Display::fmt(pid, f)
    }
}

impl FromStr for Pid {
    type Err = ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

// === impl Counters ===

impl Counters {
    pub fn new(pid: u32, name: impl Into<String>, read: u64, write: u64) -> Self {
        Self {
            pid: Pid(pid),
            name: name.into(),
            read,
            write,
        }
    }
}
