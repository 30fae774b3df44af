use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("timestamp format cannot be empty")]
    EmptyFormat,

    #[error("unknown timezone '{0}': expected an IANA name (e.g. Europe/Kyiv), UTC, or an offset like +02:00")]
    UnknownZone(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampFormat {
    Strptime(String),
    Iso8601,
    Epoch,
    EpochMs,
}

impl TimestampFormat {
    /// Build a format from its config spelling
    ///
    /// One of: strptime format string, 'iso8601', 'epoch', 'epoch_ms'
    pub fn from_spec(format: &str) -> Result<Self, TimestampError> {
        match format.trim() {
            "" => Err(TimestampError::EmptyFormat),
            "iso8601" => Ok(TimestampFormat::Iso8601),
            "epoch" => Ok(TimestampFormat::Epoch),
            "epoch_ms" => Ok(TimestampFormat::EpochMs),
            _ => Ok(TimestampFormat::Strptime(format.to_string())),
        }
    }

    /// Parse a raw timestamp value
    ///
    /// Returns None when the value does not fit the format. Offsets carried
    /// by the value are preserved; values without one are taken as UTC.
    pub fn parse(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        match self {
            TimestampFormat::Iso8601 => DateTime::parse_from_rfc3339(value).ok(),
            TimestampFormat::Epoch => {
                let seconds: i64 = value.parse().ok()?;
                Utc.timestamp_opt(seconds, 0)
                    .single()
                    .map(|dt| dt.fixed_offset())
            }
            TimestampFormat::EpochMs => {
                let millis: i64 = value.parse().ok()?;
                let seconds = millis.div_euclid(1000);
                let nanos = (millis.rem_euclid(1000) * 1_000_000) as u32;
                Utc.timestamp_opt(seconds, nanos)
                    .single()
                    .map(|dt| dt.fixed_offset())
            }
            TimestampFormat::Strptime(fmt) => parse_strptime(value, fmt),
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampFormat::Strptime(fmt) => write!(f, "{}", fmt),
            TimestampFormat::Iso8601 => write!(f, "iso8601"),
            TimestampFormat::Epoch => write!(f, "epoch"),
            TimestampFormat::EpochMs => write!(f, "epoch_ms"),
        }
    }
}

fn parse_strptime(value: &str, format: &str) -> Option<DateTime<FixedOffset>> {
    if format.contains("%z") || format.contains("%:z") || format.contains("%#z") {
        DateTime::parse_from_str(value, format).ok()
    } else {
        // No offset in the format, assume UTC
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|ndt| Utc.from_utc_datetime(&ndt).fixed_offset())
    }
}

/// Zone that parsed timestamps are converted into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl TargetZone {
    /// Resolve an IANA zone name, `UTC`, or a fixed offset such as `+02:00`
    pub fn parse(name: &str) -> Result<Self, TimestampError> {
        let name = name.trim();
        if let Ok(tz) = name.parse::<Tz>() {
            return Ok(TargetZone::Named(tz));
        }
        name.parse::<FixedOffset>()
            .map(TargetZone::Fixed)
            .map_err(|_| TimestampError::UnknownZone(name.to_string()))
    }

    /// Same instant, displayed with this zone's offset
    pub fn convert(&self, timestamp: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        match self {
            TargetZone::Named(tz) => {
                let local = timestamp.with_timezone(tz);
                let offset = local.offset().fix();
                local.with_timezone(&offset)
            }
            TargetZone::Fixed(offset) => timestamp.with_timezone(offset),
        }
    }
}

impl fmt::Display for TargetZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetZone::Named(tz) => write!(f, "{}", tz.name()),
            TargetZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Parses a pattern's timestamp field and applies the optional target zone
#[derive(Debug, Clone)]
pub struct TimestampParser {
    format: TimestampFormat,
    zone: Option<TargetZone>,
}

impl TimestampParser {
    pub fn new(format: TimestampFormat, zone: Option<TargetZone>) -> Self {
        Self { format, zone }
    }

    pub fn format(&self) -> &TimestampFormat {
        &self.format
    }

    pub fn zone(&self) -> Option<TargetZone> {
        self.zone
    }

    pub fn parse(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        let parsed = self.format.parse(value)?;
        Some(match &self.zone {
            Some(zone) => zone.convert(parsed),
            None => parsed,
        })
    }
}
