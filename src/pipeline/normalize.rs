use crate::config::types::CoercionMode;
use crate::pattern::{
    Pattern, FIELD_IP, FIELD_METHOD, FIELD_REFERRER, FIELD_SIZE, FIELD_STATUS, FIELD_TIME,
    FIELD_URL, FIELD_USER_AGENT,
};
use crate::source::line::RawRecord;
use crate::source::timestamp::{TargetZone, TimestampParser};
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Weekday};
use std::collections::BTreeMap;
use thiserror::Error;

/// Columns every dataset carries, in output order
pub const BASE_COLUMNS: [&str; 7] = ["ip", "method", "url", "status", "timestamp", "hour", "day_name"];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("record {row} is missing field '{field}'")]
    MissingField { row: usize, field: String },

    #[error("record {row} has unexpected field '{field}'")]
    UnexpectedField { row: usize, field: String },

    #[error("batch of {expected} records normalized into {actual} rows")]
    RowCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub ip: String,
    pub method: String,
    pub url: String,
    pub status: Option<i64>,
    pub size: Option<i64>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Hour of `timestamp` in its displayed offset
    pub hour: Option<u32>,
    pub day_name: Option<&'static str>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    /// Any other captured fields, unchanged
    pub extra: BTreeMap<String, String>,
}

/// Full English weekday name
pub fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse an integer field; never fails, the mode decides what a bad value becomes
pub fn coerce_int(value: &str, mode: CoercionMode) -> Option<i64> {
    match value.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => match mode {
            CoercionMode::Nullify => None,
            CoercionMode::Zero => Some(0),
        },
    }
}

/// Ordered rows of one ingestion run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<NormalizedRow>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a normalized batch, keeping order
    pub fn append(&mut self, batch: Vec<NormalizedRow>) {
        self.rows.extend(batch);
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&NormalizedRow) -> bool,
    {
        self.rows.retain(keep);
    }

    pub fn into_rows(self) -> Vec<NormalizedRow> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a NormalizedRow;
    type IntoIter = std::slice::Iter<'a, NormalizedRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Turns batches of raw records into typed rows
#[derive(Debug, Clone)]
pub struct BatchNormalizer {
    schema: Vec<String>,
    timestamps: Option<TimestampParser>,
    coercion: CoercionMode,
}

impl BatchNormalizer {
    pub fn new(pattern: &Pattern, zone: Option<TargetZone>, coercion: CoercionMode) -> Self {
        let schema: Vec<String> = pattern.field_names().map(str::to_string).collect();
        let timestamps = if pattern.has_field(FIELD_TIME) {
            pattern
                .time_format()
                .cloned()
                .map(|format| TimestampParser::new(format, zone))
        } else {
            None
        };

        Self {
            schema,
            timestamps,
            coercion,
        }
    }

    pub fn coercion(&self) -> CoercionMode {
        self.coercion
    }

    /// Dataset columns produced for this schema
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        for optional in [FIELD_SIZE, FIELD_REFERRER, FIELD_USER_AGENT] {
            if self.schema.iter().any(|f| f == optional) {
                columns.push(optional.to_string());
            }
        }
        for field in &self.schema {
            if !is_typed_field(field) {
                columns.push(field.clone());
            }
        }
        columns
    }

    /// Normalize one batch
    ///
    /// Bad values become None (or 0 under the zero mode); only structural
    /// problems with the batch are errors.
    pub fn normalize(&self, records: Vec<RawRecord>) -> Result<Vec<NormalizedRow>, SchemaError> {
        let expected = records.len();
        let mut rows = Vec::with_capacity(expected);

        for (row, record) in records.into_iter().enumerate() {
            self.check_schema(row, &record)?;
            rows.push(self.normalize_record(record));
        }

        if rows.len() != expected {
            return Err(SchemaError::RowCountMismatch {
                expected,
                actual: rows.len(),
            });
        }

        Ok(rows)
    }

    fn check_schema(&self, row: usize, record: &RawRecord) -> Result<(), SchemaError> {
        for field in &self.schema {
            if record.get(field).is_none() {
                return Err(SchemaError::MissingField {
                    row,
                    field: field.clone(),
                });
            }
        }
        if let Some(field) = record.names().find(|n| !self.schema.iter().any(|f| f == n)) {
            return Err(SchemaError::UnexpectedField {
                row,
                field: field.to_string(),
            });
        }
        Ok(())
    }

    fn normalize_record(&self, record: RawRecord) -> NormalizedRow {
        let mut row = NormalizedRow {
            ip: String::new(),
            method: String::new(),
            url: String::new(),
            status: None,
            size: None,
            timestamp: None,
            hour: None,
            day_name: None,
            referrer: None,
            user_agent: None,
            extra: BTreeMap::new(),
        };

        for (name, value) in record.into_fields() {
            match name.as_str() {
                FIELD_IP => row.ip = value,
                FIELD_METHOD => row.method = value,
                FIELD_URL => row.url = value,
                FIELD_STATUS => row.status = coerce_int(&value, self.coercion),
                FIELD_SIZE => row.size = coerce_int(&value, self.coercion),
                FIELD_REFERRER => row.referrer = Some(value),
                FIELD_USER_AGENT => row.user_agent = Some(value),
                FIELD_TIME => {
                    row.timestamp = self.timestamps.as_ref().and_then(|p| p.parse(&value));
                }
                _ => {
                    row.extra.insert(name, value);
                }
            }
        }

        // hour and day_name follow the timestamp exactly
        if let Some(ts) = row.timestamp {
            row.hour = Some(ts.hour());
            row.day_name = Some(day_name(ts.weekday()));
        }

        row
    }
}

fn is_typed_field(field: &str) -> bool {
    matches!(
        field,
        FIELD_IP
            | FIELD_METHOD
            | FIELD_URL
            | FIELD_STATUS
            | FIELD_SIZE
            | FIELD_TIME
            | FIELD_REFERRER
            | FIELD_USER_AGENT
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternRegistry;

    fn nginx_record(status: &str, size: &str, time: &str) -> RawRecord {
        RawRecord::new(vec![
            ("ip".into(), "10.0.0.1".into()),
            ("time".into(), time.into()),
            ("method".into(), "GET".into()),
            ("url".into(), "/x".into()),
            ("status".into(), status.into()),
            ("size".into(), size.into()),
            ("referrer".into(), "-".into()),
            ("user_agent".into(), "curl/7.68".into()),
        ])
    }

    fn nginx_normalizer(mode: CoercionMode) -> BatchNormalizer {
        let registry = PatternRegistry::builtin().unwrap();
        BatchNormalizer::new(registry.get("nginx").unwrap(), None, mode)
    }

    #[test]
    fn test_typed_fields() {
        let normalizer = nginx_normalizer(CoercionMode::Nullify);

        let rows = normalizer
            .normalize(vec![nginx_record("404", "512", "10/Oct/2023:13:55:36 +0000")])
            .unwrap();

        let row = &rows[0];
        assert_eq!(row.status, Some(404));
        assert_eq!(row.size, Some(512));
        assert_eq!(row.hour, Some(13));
        assert_eq!(row.day_name, Some("Tuesday"));
        assert_eq!(row.referrer.as_deref(), Some("-"));
        assert_eq!(row.user_agent.as_deref(), Some("curl/7.68"));
        assert!(row.extra.is_empty());
    }

    #[test]
    fn test_bad_numbers_nullify() {
        let normalizer = nginx_normalizer(CoercionMode::Nullify);

        let rows = normalizer
            .normalize(vec![nginx_record("abc", "-", "10/Oct/2023:13:55:36 +0000")])
            .unwrap();

        assert_eq!(rows[0].status, None);
        assert_eq!(rows[0].size, None);
    }

    #[test]
    fn test_bad_numbers_zero() {
        let normalizer = nginx_normalizer(CoercionMode::Zero);

        let rows = normalizer
            .normalize(vec![nginx_record("abc", "-", "10/Oct/2023:13:55:36 +0000")])
            .unwrap();

        assert_eq!(rows[0].status, Some(0));
        assert_eq!(rows[0].size, Some(0));
    }

    #[test]
    fn test_bad_timestamp_nulls_calendar_fields() {
        let normalizer = nginx_normalizer(CoercionMode::Nullify);

        let rows = normalizer
            .normalize(vec![nginx_record("200", "1", "yesterday-ish")])
            .unwrap();

        assert_eq!(rows[0].timestamp, None);
        assert_eq!(rows[0].hour, None);
        assert_eq!(rows[0].day_name, None);
        assert_eq!(rows[0].status, Some(200));
    }

    #[test]
    fn test_target_zone_moves_hour() {
        let registry = PatternRegistry::builtin().unwrap();
        let zone = TargetZone::parse("Asia/Tokyo").unwrap();
        let normalizer =
            BatchNormalizer::new(registry.get("nginx").unwrap(), Some(zone), CoercionMode::Nullify);

        let rows = normalizer
            .normalize(vec![nginx_record("200", "1", "10/Oct/2023:20:00:00 +0000")])
            .unwrap();

        assert_eq!(rows[0].hour, Some(5));
        assert_eq!(rows[0].day_name, Some("Wednesday"));
    }

    #[test]
    fn test_missing_field_is_schema_error() {
        let normalizer = nginx_normalizer(CoercionMode::Nullify);
        let record = RawRecord::new(vec![
            ("ip".into(), "10.0.0.1".into()),
            ("method".into(), "GET".into()),
            ("url".into(), "/".into()),
        ]);

        let err = normalizer.normalize(vec![record]).unwrap_err();

        assert!(matches!(err, SchemaError::MissingField { row: 0, ref field } if field == "time"));
    }

    #[test]
    fn test_unexpected_field_is_schema_error() {
        let registry = PatternRegistry::builtin().unwrap();
        let normalizer =
            BatchNormalizer::new(registry.get("generic").unwrap(), None, CoercionMode::Nullify);

        let err = normalizer
            .normalize(vec![nginx_record("200", "1", "10/Oct/2023:13:55:36 +0000")])
            .unwrap_err();

        assert!(matches!(err, SchemaError::UnexpectedField { .. }));
    }

    #[test]
    fn test_columns() {
        let nginx = nginx_normalizer(CoercionMode::Nullify);
        assert_eq!(
            nginx.columns(),
            vec![
                "ip", "method", "url", "status", "timestamp", "hour", "day_name", "size",
                "referrer", "user_agent"
            ]
        );

        let registry = PatternRegistry::builtin().unwrap();
        let generic =
            BatchNormalizer::new(registry.get("generic").unwrap(), None, CoercionMode::Nullify);
        assert_eq!(generic.columns(), BASE_COLUMNS.to_vec());
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int("1024", CoercionMode::Nullify), Some(1024));
        assert_eq!(coerce_int("", CoercionMode::Nullify), None);
        assert_eq!(coerce_int("", CoercionMode::Zero), Some(0));
        assert_eq!(coerce_int("12.5", CoercionMode::Zero), Some(0));
    }

    #[test]
    fn test_dataset_append_keeps_order() {
        let normalizer = nginx_normalizer(CoercionMode::Nullify);
        let mut dataset = Dataset::new(normalizer.columns());

        dataset.append(normalizer.normalize(vec![nginx_record("200", "1", "")]).unwrap());
        dataset.append(normalizer.normalize(vec![nginx_record("500", "1", "")]).unwrap());

        let statuses: Vec<Option<i64>> = dataset.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![Some(200), Some(500)]);
    }
}
