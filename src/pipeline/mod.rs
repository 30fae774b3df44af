//! Ingestion and normalization pipeline.
//!
//! ```text
//! LineReader ──► parse_line ──► batch ──► BatchNormalizer ──► Dataset ──► SpamFilter
//! ```
//!
//! Everything runs synchronously on the calling thread. Only one batch of
//! raw records is alive at a time.

pub mod filter;
pub mod ingest;
pub mod normalize;
pub mod strategy;

pub use filter::{FilterError, SpamFilter};
pub use ingest::{ingest, IngestError, IngestOptions, IngestOutcome, IngestState, IngestStats, Ingestor};
pub use normalize::{BatchNormalizer, Dataset, NormalizedRow, SchemaError};
pub use strategy::{GenericParser, NginxParser, ParserStrategy, Strategy};

use crate::config::types::Config;
use crate::pattern::{Pattern, PatternError, PatternRegistry};
use crate::source::timestamp::{TargetZone, TimestampError};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("timezone error: {0}")]
    Timezone(#[from] TimestampError),

    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("chunk_size must be a positive integer")]
    InvalidChunkSize,

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Fully resolved run: input, active pattern, strategy and filter
#[derive(Debug, Clone)]
pub struct Pipeline {
    input: PathBuf,
    pattern: Pattern,
    strategy: Strategy,
    filter: SpamFilter,
}

impl Pipeline {
    /// Resolve everything a run needs; configuration problems surface here, before any parsing
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let registry = PatternRegistry::from_config(&config.patterns)?;
        let pattern = registry.get(&config.format)?.clone();

        let target_zone = config
            .target_timezone
            .as_deref()
            .filter(|tz| !tz.trim().is_empty())
            .map(TargetZone::parse)
            .transpose()?;

        let chunk_size = match config.chunk_size {
            Some(size) => Some(NonZeroUsize::new(size).ok_or(PipelineError::InvalidChunkSize)?),
            None => None,
        };

        let options = IngestOptions {
            chunk_size,
            coercion: config.coercion,
            target_zone,
            on_undecodable: config.on_undecodable,
        };

        Ok(Self {
            input: config.input.clone(),
            strategy: Strategy::for_kind(pattern.strategy(), options),
            pattern,
            filter: SpamFilter::new(config.exclude.as_deref())?,
        })
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Ingest, normalize and filter the input
    pub fn run(&self) -> Result<IngestOutcome, PipelineError> {
        let outcome = self.strategy.parse(&self.input, &self.pattern)?;
        Ok(IngestOutcome {
            dataset: self.filter.apply(outcome.dataset),
            stats: outcome.stats,
        })
    }
}
