use crate::pattern::Pattern;

/// One line of input, newline stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    /// Byte offset of the line start in the source
    pub offset: u64,
    /// 1-based line number
    pub number: u64,
}

/// Captured field values of one matched line, in pattern field order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<(String, String)> {
        self.fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    Record(RawRecord),
    NoMatch,
}

/// Apply a pattern to one line
///
/// Every field of the pattern is present in the record; a group that did
/// not participate in the match yields an empty string.
pub fn parse_line(line: &str, pattern: &Pattern) -> LineMatch {
    let Some(captures) = pattern.regex().captures(line) else {
        return LineMatch::NoMatch;
    };

    let fields = pattern
        .fields()
        .iter()
        .map(|(name, idx)| {
            let value = captures.get(*idx).map(|m| m.as_str()).unwrap_or("");
            (name.clone(), value.to_string())
        })
        .collect();

    LineMatch::Record(RawRecord::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternRegistry;

    const COMBINED: &str = r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /index.html HTTP/1.1" 200 1024 "-" "curl/7.68""#;

    fn record(line: &str, format: &str) -> RawRecord {
        let registry = PatternRegistry::builtin().unwrap();
        match parse_line(line, registry.get(format).unwrap()) {
            LineMatch::Record(record) => record,
            LineMatch::NoMatch => panic!("line did not match {}: {}", format, line),
        }
    }

    #[test]
    fn test_nginx_combined_line() {
        let record = record(COMBINED, "nginx");

        assert_eq!(record.get("ip"), Some("10.0.0.1"));
        assert_eq!(record.get("time"), Some("10/Oct/2023:13:55:36 +0000"));
        assert_eq!(record.get("method"), Some("GET"));
        assert_eq!(record.get("url"), Some("/index.html"));
        assert_eq!(record.get("status"), Some("200"));
        assert_eq!(record.get("size"), Some("1024"));
        assert_eq!(record.get("referrer"), Some("-"));
        assert_eq!(record.get("user_agent"), Some("curl/7.68"));
        assert_eq!(record.len(), 8);
    }

    #[test]
    fn test_nginx_line_without_request() {
        let line = r#"10.0.0.7 - - [10/Oct/2023:13:55:40 +0000] "-" 400 0 "-" "-""#;

        let record = record(line, "nginx");

        assert_eq!(record.get("method"), Some(""));
        assert_eq!(record.get("url"), Some(""));
        assert_eq!(record.get("status"), Some("400"));
        assert_eq!(record.len(), 8);
    }

    #[test]
    fn test_generic_line_positional_fields() {
        let record = record(COMBINED, "generic");

        let names: Vec<&str> = record.names().collect();
        assert_eq!(names, vec!["ip", "time", "method", "url", "status"]);
        assert_eq!(record.get("url"), Some("/index.html"));
        assert_eq!(record.get("status"), Some("200"));
    }

    #[test]
    fn test_generic_is_unanchored() {
        let line = format!("frontend-01 {}", COMBINED);

        assert_eq!(record(&line, "generic").get("ip"), Some("10.0.0.1"));

        let registry = PatternRegistry::builtin().unwrap();
        assert_eq!(
            parse_line(&line, registry.get("nginx").unwrap()),
            LineMatch::NoMatch
        );
    }

    #[test]
    fn test_garbage_is_no_match() {
        let registry = PatternRegistry::builtin().unwrap();

        for format in ["nginx", "generic"] {
            let pattern = registry.get(format).unwrap();
            assert_eq!(parse_line("", pattern), LineMatch::NoMatch);
            assert_eq!(parse_line("not a log line", pattern), LineMatch::NoMatch);
        }
    }

    #[test]
    fn test_empty_group_value() {
        let line = r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /a HTTP/1.1" 200 0 "" """#;

        let record = record(line, "nginx");

        assert_eq!(record.get("referrer"), Some(""));
        assert_eq!(record.get("user_agent"), Some(""));
    }
}
