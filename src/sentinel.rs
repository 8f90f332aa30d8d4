use {
    crate::{
        proc::Snapshot,
        rate::{Rate, differentiate},
        source::{Probe, ProbeError, ProcFs},
    },
    std::time::Instant,
};

/// observes process i/o statistics.
pub struct Sentinel<P = ProcFs> {
    /// the underlying source of i/o statistics.
    probe: P,
    /// the last observed snapshot.
    last: Option<Snapshot>,
}

// === impl Sentinel ===

impl<P: Probe> Sentinel<P> {
    /// creates a new [`Sentinel`].
    pub fn new(probe: P) -> Self {
        Self { probe, last: None }
    }

    /// returns the throughput of each process since this was last called.
    ///
    /// NB: by virtue of this being a comparison to the previous reading, this will return no
    /// rates the first time it is called. if the probe fails, the previous snapshot is kept as
    /// the baseline.
    pub fn observe(&mut self, now: Instant) -> Result<Vec<Rate>, ProbeError> {
        let Self { probe, last } = self;

        let new = Snapshot::read(&*probe, now)?;
        let rates = last
            .as_ref()
            .map(|prev| differentiate(prev, &new))
            .unwrap_or_default();
        *last = Some(new);

        Ok(rates)
    }

    /// returns the number of requests waiting on storage, or zero if it cannot be read.
    pub fn queue_depth(&self) -> f64 {
        let Self { probe, .. } = self;

        match probe.queue_depth() {
            Ok(depth) if depth.is_finite() && depth >= 0.0 => depth,
            Ok(depth) => {
                log::debug!("discarding nonsensical queue depth: {depth}");
                0.0
            }
            Err(error) => {
                log::debug!("queue depth unavailable: {error}");
                0.0
            }
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }
}
