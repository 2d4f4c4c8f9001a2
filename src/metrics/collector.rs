use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::lifecycle::{ListenerId, StepListener, StepSource};
use super::sample::HEADER;
use super::sampler::RateSampler;
use super::Sample;
use crate::error::{FormatError, LifecycleError, StatisticError};

/// Calculate-count-per-second statistic for one run.
///
/// Owns the append-only sample series and the sampler feeding it. While
/// attached, the run's step callbacks are the only writers. Readers
/// (`samples`, `csv_lines`, any [`SampleReader`]) take the same lock as
/// the callback, so a snapshot is always a consistent prefix of the
/// series, but persisting a series that is still growing is the
/// caller's decision.
pub struct ThroughputCollector {
    shared: Arc<Shared>,
    attachment: Option<ListenerId>,
}

/// Cloneable read-only view of a collector's series.
#[derive(Clone)]
pub struct SampleReader {
    shared: Arc<Shared>,
}

// ─── Internal state ──────────────────────────────────────────────

struct Shared {
    inner: Mutex<Inner>,
}

struct Inner {
    sampler: RateSampler,
    samples: Vec<Sample>,
}

impl StepListener for Shared {
    fn step_ended(&self, elapsed_millis: u64, counter: u64) {
        let mut inner = self.inner.lock();
        if let Some(sample) = inner.sampler.on_step(elapsed_millis, counter) {
            inner.samples.push(sample);
        }
    }
}

// ─── ThroughputCollector impl ────────────────────────────────────

impl ThroughputCollector {
    pub fn new(interval_millis: u64) -> Result<Self, StatisticError> {
        Ok(Self::with_sampler(RateSampler::new(interval_millis)?))
    }

    fn with_sampler(sampler: RateSampler) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    sampler,
                    samples: Vec::new(),
                }),
            }),
            attachment: None,
        }
    }

    pub fn interval_millis(&self) -> u64 {
        self.shared.inner.lock().sampler.interval_millis()
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Start sampling `run`, measuring rates from its `(0, 0)` origin.
    ///
    /// A collector holds the statistic of one run: once it has samples
    /// (collected or loaded) it can't be attached again, since a new run's
    /// elapsed times would restart below the last sample.
    pub fn attach(&mut self, run: &mut dyn StepSource) -> Result<(), StatisticError> {
        if self.attachment.is_some() {
            return Err(LifecycleError::AlreadyAttached.into());
        }

        {
            let mut inner = self.shared.inner.lock();
            if !inner.samples.is_empty() {
                return Err(LifecycleError::NotEmpty.into());
            }
            inner.sampler.reset();
        }
        let listener: Arc<dyn StepListener> = self.shared.clone();
        let id = run.add_step_listener(listener);
        self.attachment = Some(id);

        debug!(?id, "collector attached");
        Ok(())
    }

    /// Stop sampling. Samples already taken stay.
    pub fn detach(&mut self, run: &mut dyn StepSource) -> Result<(), StatisticError> {
        let id = self.attachment.ok_or(LifecycleError::NotAttached)?;
        if !run.remove_step_listener(id) {
            return Err(LifecycleError::UnknownListener.into());
        }
        self.attachment = None;

        debug!(?id, samples = self.len(), "collector detached");
        Ok(())
    }

    pub fn header(&self) -> &'static str {
        HEADER
    }

    /// Append the samples stored in `lines`: a header record followed by
    /// one data record per sample.
    ///
    /// Stops at the first malformed record. Samples parsed before it have
    /// already been appended, so callers should drop the collector on error.
    pub fn load_from<I, S>(&mut self, lines: I) -> Result<usize, StatisticError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lines = lines.into_iter();

        let header = lines.next().ok_or(StatisticError::Format {
            line: 1,
            source: FormatError::MissingHeader,
        })?;
        if header.as_ref() != HEADER {
            return Err(StatisticError::Format {
                line: 1,
                source: FormatError::UnexpectedHeader {
                    found: header.as_ref().to_owned(),
                },
            });
        }

        let mut inner = self.shared.inner.lock();
        let mut loaded = 0;
        for (index, line) in lines.enumerate() {
            let sample = Sample::from_csv_line(line.as_ref()).map_err(|source| {
                StatisticError::Format {
                    line: index + 2,
                    source,
                }
            })?;
            inner.samples.push(sample);
            loaded += 1;
        }

        info!(loaded, "statistic loaded");
        Ok(loaded)
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.shared.samples()
    }

    pub fn len(&self) -> usize {
        self.shared.inner.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Header plus one record per sample, ready to be written out.
    pub fn csv_lines(&self) -> Vec<String> {
        self.shared.csv_lines()
    }

    pub fn reader(&self) -> SampleReader {
        SampleReader {
            shared: self.shared.clone(),
        }
    }
}

impl Default for ThroughputCollector {
    fn default() -> Self {
        Self::with_sampler(RateSampler::default())
    }
}

impl Shared {
    fn samples(&self) -> Vec<Sample> {
        self.inner.lock().samples.clone()
    }

    fn csv_lines(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let mut lines = Vec::with_capacity(inner.samples.len() + 1);
        lines.push(HEADER.to_owned());
        lines.extend(inner.samples.iter().map(Sample::to_csv_line));
        lines
    }
}

// ─── SampleReader impl ───────────────────────────────────────────

impl SampleReader {
    pub fn samples(&self) -> Vec<Sample> {
        self.shared.samples()
    }

    pub fn csv_lines(&self) -> Vec<String> {
        self.shared.csv_lines()
    }
}
