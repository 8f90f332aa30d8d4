use super::*;

/// the storage i/o counters found in `/proc/<pid>/io`.
///
/// see `proc_pid_io(5)` for more information. the file also holds `rchar`, `wchar` and
/// friends, which count every byte passed through `read(2)` and `write(2)`, including those
/// served from the page cache. only the storage-layer counters are kept here.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IoCounters {
    /// bytes this process really did cause to be fetched from the storage layer.
    pub read_bytes: u64,
    /// bytes this process caused to be sent to the storage layer.
    pub write_bytes: u64,
}

// === impl IoCounters ===

impl IoCounters {
    const READ_BYTES: &str = "read_bytes";
    const WRITE_BYTES: &str = "write_bytes";
}

impl FromStr for IoCounters {
    type Err = ParseError;
    fn from_str(file: &str) -> Result<Self, Self::Err> {
        let (mut read_bytes, mut write_bytes) = (None, None);

        for line in file.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let (field, slot) = match key.trim() {
                Self::READ_BYTES => (Self::READ_BYTES, &mut read_bytes),
                Self::WRITE_BYTES => (Self::WRITE_BYTES, &mut write_bytes),
                _ => continue,
            };
            let value = value
                .trim()
                .parse::<u64>()
                .map_err(|source| ParseError::Value { field, source })?;
            slot.replace(value);
        }

        let missing = |field| ParseError::MissingField { field };
        Ok(Self {
            read_bytes: read_bytes.ok_or_else(|| missing(Self::READ_BYTES))?,
            write_bytes: write_bytes.ok_or_else(|| missing(Self::WRITE_BYTES))?,
        })
    }
}
