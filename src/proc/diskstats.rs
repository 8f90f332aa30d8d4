use super::*;

/// a line of the `/proc/diskstats` block device statistics table.
///
/// see the kernel's `Documentation/admin-guide/iostats.rst` for the field layout. only the
/// fields needed to derive the queue depth are kept.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiskStat {
    /// the device name, e.g. `sda` or `nvme0n1p2`.
    pub name: String,
    /// weighted milliseconds spent doing i/os.
    ///
    /// this is incremented at each i/o start, completion, merge, or read of these stats by the
    /// number of i/os in progress times the milliseconds spent doing i/o since the last update.
    /// the rate of change of this value over wall time is the average queue length.
    pub weighted_ms: u64,
}

// === impl DiskStat ===

impl DiskStat {
    /// the index of the device name.
    const NAME: usize = 2;
    /// the index of the weighted i/o time.
    const WEIGHTED_MS: usize = 13;

    /// returns true if this device is a virtual device that should not count toward pressure.
    ///
    /// mapped and raid devices are excluded too, since their i/o is also counted against the
    /// disks beneath them.
    pub fn is_virtual(&self) -> bool {
        const VIRTUAL: [&str; 5] = ["loop", "ram", "zram", "dm-", "md"];
        let Self { name, .. } = self;
        VIRTUAL.iter().any(|prefix| name.starts_with(*prefix))
    }
}

impl FromStr for DiskStat {
    type Err = ParseError;
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        if tokens.len() <= Self::WEIGHTED_MS {
            return Err(ParseError::Truncated);
        }

        // NB: other columns are not parsed, so a malformed one cannot spoil the reading.
        let weighted_ms = tokens[Self::WEIGHTED_MS]
            .parse::<u64>()
            .map_err(|source| ParseError::Value {
                field: "weighted_ms",
                source,
            })?;

        Ok(Self {
            name: tokens[Self::NAME].to_owned(),
            weighted_ms,
        })
    }
}
