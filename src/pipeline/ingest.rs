use crate::config::types::{CoercionMode, EncodingPolicy};
use crate::pattern::Pattern;
use crate::pipeline::normalize::{BatchNormalizer, Dataset, SchemaError};
use crate::source::line::{parse_line, LineMatch, RawRecord};
use crate::source::reader::{LineReader, ReaderError};
use crate::source::timestamp::TargetZone;
use std::io::BufRead;
use std::num::NonZeroUsize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: line {line} at byte offset {offset} is not valid UTF-8")]
    Encoding { line: u64, offset: u64 },

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("pattern error: {0}")]
    Pattern(#[from] crate::pattern::PatternError),
}

impl From<ReaderError> for IngestError {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::Io(e) => IngestError::Io(e),
            ReaderError::Encoding { line, offset } => IngestError::Encoding { line, offset },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// None processes the whole input as a single batch
    pub chunk_size: Option<NonZeroUsize>,
    pub coercion: CoercionMode,
    pub target_zone: Option<TargetZone>,
    pub on_undecodable: EncodingPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines_read: u64,
    pub matched: u64,
    pub unmatched: u64,
    pub undecodable: u64,
    /// Size of every normalized batch, in order
    pub batch_sizes: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub dataset: Dataset,
    pub stats: IngestStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    /// Pulling lines into the current batch
    Reading,
    /// Batch reached chunk size and is normalized on the next step
    Normalizing,
    /// Input exhausted, the partial batch is normalized on the next step
    Flushing,
    Done,
}

/// Streams a source through the line parser into normalized batches
///
/// At most `chunk_size` raw records are held at any time.
pub struct Ingestor<'p, R> {
    reader: LineReader<R>,
    pattern: &'p Pattern,
    normalizer: BatchNormalizer,
    chunk_size: Option<NonZeroUsize>,
    batch: Vec<RawRecord>,
    dataset: Dataset,
    state: IngestState,
    stats: IngestStats,
}

impl<'p, R: BufRead> Ingestor<'p, R> {
    pub fn new(reader: LineReader<R>, pattern: &'p Pattern, options: &IngestOptions) -> Self {
        let normalizer = BatchNormalizer::new(pattern, options.target_zone, options.coercion);
        let dataset = Dataset::new(normalizer.columns());
        let capacity = options.chunk_size.map(NonZeroUsize::get).unwrap_or(0);

        Self {
            reader,
            pattern,
            normalizer,
            chunk_size: options.chunk_size,
            batch: Vec::with_capacity(capacity),
            dataset,
            state: IngestState::Reading,
            stats: IngestStats::default(),
        }
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Records waiting in the current batch
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Advance by one transition and return the new state
    pub fn step(&mut self) -> Result<IngestState, IngestError> {
        self.state = match self.state {
            IngestState::Reading => self.read_one()?,
            IngestState::Normalizing => {
                self.flush_batch()?;
                IngestState::Reading
            }
            IngestState::Flushing => {
                if !self.batch.is_empty() {
                    self.flush_batch()?;
                }
                self.stats.undecodable = self.reader.undecodable();
                IngestState::Done
            }
            IngestState::Done => IngestState::Done,
        };
        Ok(self.state)
    }

    /// Drive the machine to completion
    pub fn run(mut self) -> Result<IngestOutcome, IngestError> {
        info!(
            pattern = %self.pattern.name(),
            chunk_size = ?self.chunk_size,
            "Starting ingestion"
        );
        if self.chunk_size.is_none() {
            warn!("No chunk size configured, the whole input is normalized as one batch");
        }

        while self.step()? != IngestState::Done {}

        info!(
            lines = self.stats.lines_read,
            rows = self.dataset.len(),
            unmatched = self.stats.unmatched,
            undecodable = self.stats.undecodable,
            batches = self.stats.batch_sizes.len(),
            "Ingestion complete"
        );

        Ok(IngestOutcome {
            dataset: self.dataset,
            stats: self.stats,
        })
    }

    fn read_one(&mut self) -> Result<IngestState, IngestError> {
        let next = self.reader.next_line()?;
        // Counts every line read, skipped undecodable ones included
        self.stats.lines_read = self.reader.lines_read();
        let Some(line) = next else {
            return Ok(IngestState::Flushing);
        };

        match parse_line(&line.text, self.pattern) {
            LineMatch::Record(record) => {
                self.stats.matched += 1;
                self.batch.push(record);
            }
            LineMatch::NoMatch => {
                self.stats.unmatched += 1;
            }
        }

        match self.chunk_size {
            Some(size) if self.batch.len() >= size.get() => Ok(IngestState::Normalizing),
            _ => Ok(IngestState::Reading),
        }
    }

    fn flush_batch(&mut self) -> Result<(), IngestError> {
        let capacity = self.batch.capacity();
        let records = std::mem::replace(&mut self.batch, Vec::with_capacity(capacity));
        let size = records.len();
        let rows = self.normalizer.normalize(records)?;

        debug!(batch = self.stats.batch_sizes.len(), size, "Normalized batch");
        self.stats.batch_sizes.push(size);
        self.dataset.append(rows);
        Ok(())
    }
}

/// Ingest a source with the given pattern and options
pub fn ingest<R: BufRead>(
    source: R,
    pattern: &Pattern,
    options: &IngestOptions,
) -> Result<IngestOutcome, IngestError> {
    let reader = LineReader::new(source, options.on_undecodable);
    Ingestor::new(reader, pattern, options).run()
}
