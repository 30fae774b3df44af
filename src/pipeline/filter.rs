use crate::pipeline::normalize::Dataset;
use regex::Regex;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid exclusion expression '{expression}': {source}")]
    InvalidExpression {
        expression: String,
        #[source]
        source: regex::Error,
    },
}

/// Drops rows whose url matches an exclusion expression
#[derive(Debug, Clone, Default)]
pub struct SpamFilter {
    regex: Option<Regex>,
}

impl SpamFilter {
    /// Compile an alternation such as `admin/|secret=`; empty or None is a no-op filter
    pub fn new(expression: Option<&str>) -> Result<Self, FilterError> {
        let regex = match expression {
            Some(expr) if !expr.is_empty() => {
                Some(Regex::new(expr).map_err(|source| FilterError::InvalidExpression {
                    expression: expr.to_string(),
                    source,
                })?)
            }
            _ => None,
        };
        Ok(Self { regex })
    }

    pub fn is_noop(&self) -> bool {
        self.regex.is_none()
    }

    /// Empty urls never match
    pub fn excludes(&self, url: &str) -> bool {
        match &self.regex {
            Some(re) => !url.is_empty() && re.is_match(url),
            None => false,
        }
    }

    pub fn apply(&self, mut dataset: Dataset) -> Dataset {
        if self.is_noop() {
            return dataset;
        }
        let before = dataset.len();
        dataset.retain(|row| !self.excludes(&row.url));
        info!(removed = before - dataset.len(), kept = dataset.len(), "Applied spam filter");
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternation() {
        let filter = SpamFilter::new(Some("admin/|secret=")).unwrap();

        assert!(filter.excludes("/admin/login"));
        assert!(filter.excludes("/page?secret=1"));
        assert!(!filter.excludes("/public/index"));
    }

    #[test]
    fn test_empty_url_kept() {
        let filter = SpamFilter::new(Some("x*")).unwrap();

        assert!(!filter.excludes(""));
    }

    #[test]
    fn test_noop() {
        assert!(SpamFilter::new(None).unwrap().is_noop());
        assert!(SpamFilter::new(Some("")).unwrap().is_noop());
        assert!(!SpamFilter::new(None).unwrap().excludes("/admin/"));
    }

    #[test]
    fn test_invalid_expression() {
        assert!(matches!(
            SpamFilter::new(Some("admin/|(")),
            Err(FilterError::InvalidExpression { .. })
        ));
    }
}
