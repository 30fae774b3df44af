pub mod line;
pub mod reader;
pub mod timestamp;

pub use line::{parse_line, LineMatch, LogLine, RawRecord};
pub use reader::{LineReader, ReaderError};
pub use timestamp::{TargetZone, TimestampError, TimestampFormat, TimestampParser};
