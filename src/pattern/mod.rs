//! Field-extraction patterns and the registry that hands them out.
//!
//! A [`Pattern`] is a compiled regular expression whose capture groups are
//! mapped to field names, plus the timestamp format of its `time` field.

pub mod builtin;
pub mod registry;

use crate::config::types::{PatternConfig, StrategyKind};
use crate::source::timestamp::{TimestampError, TimestampFormat};
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

pub use registry::PatternRegistry;

pub const FIELD_IP: &str = "ip";
pub const FIELD_TIME: &str = "time";
pub const FIELD_METHOD: &str = "method";
pub const FIELD_URL: &str = "url";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_SIZE: &str = "size";
pub const FIELD_REFERRER: &str = "referrer";
pub const FIELD_USER_AGENT: &str = "user_agent";

/// Fields every pattern must declare so the dataset keeps its column contract
pub const REQUIRED_FIELDS: [&str; 3] = [FIELD_IP, FIELD_METHOD, FIELD_URL];

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern '{pattern}': regex compilation failed: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern '{0}' has no named capture groups")]
    NoNamedGroups(String),

    #[error("pattern '{pattern}': {groups} positional groups but {fields} field names")]
    FieldCountMismatch {
        pattern: String,
        groups: usize,
        fields: usize,
    },

    #[error("pattern '{0}': 'fields' cannot be combined with named capture groups")]
    FieldsWithNamedGroups(String),

    #[error("pattern '{pattern}': duplicate field '{field}'")]
    DuplicateField { pattern: String, field: String },

    #[error("pattern '{pattern}' must declare field '{field}'")]
    MissingRequiredField { pattern: String, field: String },

    #[error("pattern '{pattern}' declares a 'time' field but no time_format")]
    MissingTimeFormat { pattern: String },

    #[error("pattern '{pattern}': {source}")]
    Timestamp {
        pattern: String,
        #[source]
        source: TimestampError,
    },

    #[error("unknown format '{name}' (available: {available})")]
    UnknownFormat { name: String, available: String },
}

#[derive(Debug, Clone)]
pub struct Pattern {
    name: String,
    source: String,
    regex: Regex,
    /// Field names paired with the capture group index that fills them
    fields: Vec<(String, usize)>,
    time_format: Option<TimestampFormat>,
    anchored: bool,
    strategy: StrategyKind,
}

impl Pattern {
    /// Compile a pattern definition
    ///
    /// Nginx-strategy patterns are always anchored at line start.
    pub fn from_config(name: &str, config: &PatternConfig) -> Result<Self, PatternError> {
        let anchored = config.anchored || config.strategy == StrategyKind::Nginx;
        let regex = compile(name, &config.regex, anchored)?;

        let named: Vec<(String, usize)> = regex
            .capture_names()
            .enumerate()
            .filter_map(|(idx, n)| n.map(|n| (n.to_string(), idx)))
            .collect();

        let fields = if !named.is_empty() {
            if !config.fields.is_empty() {
                return Err(PatternError::FieldsWithNamedGroups(name.to_string()));
            }
            named
        } else if config.fields.is_empty() {
            return Err(PatternError::NoNamedGroups(name.to_string()));
        } else {
            let groups = regex.captures_len() - 1;
            if groups != config.fields.len() {
                return Err(PatternError::FieldCountMismatch {
                    pattern: name.to_string(),
                    groups,
                    fields: config.fields.len(),
                });
            }
            config
                .fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.trim().to_string(), i + 1))
                .collect()
        };

        let mut seen = HashSet::new();
        for (field, _) in &fields {
            if !seen.insert(field.as_str()) {
                return Err(PatternError::DuplicateField {
                    pattern: name.to_string(),
                    field: field.clone(),
                });
            }
        }

        for required in REQUIRED_FIELDS {
            if !seen.contains(required) {
                return Err(PatternError::MissingRequiredField {
                    pattern: name.to_string(),
                    field: required.to_string(),
                });
            }
        }

        let time_format = match config.time_format.as_deref() {
            Some(spec) => Some(TimestampFormat::from_spec(spec).map_err(|source| {
                PatternError::Timestamp {
                    pattern: name.to_string(),
                    source,
                }
            })?),
            None => None,
        };

        if seen.contains(FIELD_TIME) && time_format.is_none() {
            return Err(PatternError::MissingTimeFormat {
                pattern: name.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            source: config.regex.clone(),
            regex,
            fields,
            time_format,
            anchored,
            strategy: config.strategy,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn fields(&self) -> &[(String, usize)] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    pub fn time_format(&self) -> Option<&TimestampFormat> {
        self.time_format.as_ref()
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Copy of this pattern that only matches at line start
    pub fn anchored_at_start(&self) -> Result<Self, PatternError> {
        if self.anchored {
            return Ok(self.clone());
        }
        Ok(Self {
            regex: compile(&self.name, &self.source, true)?,
            anchored: true,
            ..self.clone()
        })
    }
}

fn compile(name: &str, source: &str, anchored: bool) -> Result<Regex, PatternError> {
    let source = if anchored {
        format!("^(?:{})", source)
    } else {
        source.to_string()
    };
    Regex::new(&source).map_err(|source| PatternError::InvalidRegex {
        pattern: name.to_string(),
        source,
    })
}
