use crate::config::types::StrategyKind;
use crate::pattern::{Pattern, PatternError, FIELD_STATUS, FIELD_TIME};
use crate::pipeline::ingest::{IngestError, IngestOptions, IngestOutcome, Ingestor};
use crate::source::reader::LineReader;
use std::path::Path;
use tracing::info;

/// One way of turning a log file into a dataset
pub trait ParserStrategy {
    fn name(&self) -> &'static str;

    fn options(&self) -> &IngestOptions;

    /// Pattern as this strategy applies it to each line
    fn prepare(&self, pattern: &Pattern) -> Result<Pattern, PatternError>;

    fn parse(&self, source: &Path, pattern: &Pattern) -> Result<IngestOutcome, IngestError> {
        let pattern = self.prepare(pattern)?;
        info!(
            strategy = self.name(),
            source = %source.display(),
            "Parsing log file"
        );
        let reader = LineReader::open(source, self.options().on_undecodable)?;
        Ingestor::new(reader, &pattern, self.options()).run()
    }
}

/// Applies the pattern exactly as configured
#[derive(Debug, Clone, Default)]
pub struct GenericParser {
    options: IngestOptions,
}

impl GenericParser {
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }
}

impl ParserStrategy for GenericParser {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn options(&self) -> &IngestOptions {
        &self.options
    }

    fn prepare(&self, pattern: &Pattern) -> Result<Pattern, PatternError> {
        Ok(pattern.clone())
    }
}

/// Combined-log-format parser: anchored at line start, needs time and status
#[derive(Debug, Clone, Default)]
pub struct NginxParser {
    options: IngestOptions,
}

impl NginxParser {
    pub fn new(options: IngestOptions) -> Self {
        Self { options }
    }
}

impl ParserStrategy for NginxParser {
    fn name(&self) -> &'static str {
        "nginx"
    }

    fn options(&self) -> &IngestOptions {
        &self.options
    }

    fn prepare(&self, pattern: &Pattern) -> Result<Pattern, PatternError> {
        for field in [FIELD_TIME, FIELD_STATUS] {
            if !pattern.has_field(field) {
                return Err(PatternError::MissingRequiredField {
                    pattern: pattern.name().to_string(),
                    field: field.to_string(),
                });
            }
        }
        pattern.anchored_at_start()
    }
}

/// Strategy chosen from configuration at startup
#[derive(Debug, Clone)]
pub enum Strategy {
    Generic(GenericParser),
    Nginx(NginxParser),
}

impl Strategy {
    pub fn for_kind(kind: StrategyKind, options: IngestOptions) -> Self {
        match kind {
            StrategyKind::Generic => Strategy::Generic(GenericParser::new(options)),
            StrategyKind::Nginx => Strategy::Nginx(NginxParser::new(options)),
        }
    }
}

impl ParserStrategy for Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::Generic(p) => p.name(),
            Strategy::Nginx(p) => p.name(),
        }
    }

    fn options(&self) -> &IngestOptions {
        match self {
            Strategy::Generic(p) => p.options(),
            Strategy::Nginx(p) => p.options(),
        }
    }

    fn prepare(&self, pattern: &Pattern) -> Result<Pattern, PatternError> {
        match self {
            Strategy::Generic(p) => p.prepare(pattern),
            Strategy::Nginx(p) => p.prepare(pattern),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::PatternConfig;
    use crate::pattern::PatternRegistry;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn loose_pattern() -> Pattern {
        Pattern::from_config(
            "loose",
            &PatternConfig {
                regex: r"(?P<ip>\d+\.\d+\.\d+\.\d+) (?P<method>[A-Z]+) (?P<url>\S+)".to_string(),
                fields: Vec::new(),
                time_format: None,
                anchored: false,
                strategy: StrategyKind::Generic,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_for_kind() {
        let generic = Strategy::for_kind(StrategyKind::Generic, IngestOptions::default());
        let nginx = Strategy::for_kind(StrategyKind::Nginx, IngestOptions::default());

        assert_eq!(generic.name(), "generic");
        assert_eq!(nginx.name(), "nginx");
    }

    #[test]
    fn test_nginx_requires_time_and_status() {
        let nginx = NginxParser::default();

        let err = nginx.prepare(&loose_pattern()).unwrap_err();

        assert!(matches!(err, PatternError::MissingRequiredField { ref field, .. } if field == "time"));
    }

    #[test]
    fn test_nginx_anchors_generic_pattern() {
        let registry = PatternRegistry::builtin().unwrap();
        let nginx = NginxParser::default();

        let prepared = nginx.prepare(registry.get("generic").unwrap()).unwrap();

        assert!(prepared.is_anchored());
    }

    #[test]
    fn test_generic_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "host-a 10.0.0.1 GET /one").unwrap();
        writeln!(file, "garbage").unwrap();
        writeln!(file, "host-b 10.0.0.2 POST /two").unwrap();

        let outcome = GenericParser::default()
            .parse(file.path(), &loose_pattern())
            .unwrap();

        let urls: Vec<&str> = outcome.dataset.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["/one", "/two"]);
        assert_eq!(outcome.dataset.rows()[1].method, "POST");
        assert_eq!(outcome.dataset.rows()[1].timestamp, None);
    }

    #[test]
    fn test_parse_missing_file_is_io_error() {
        let result = GenericParser::default().parse(Path::new("/nonexistent/access.log"), &loose_pattern());

        assert!(matches!(result, Err(IngestError::Io(_))));
    }
}
