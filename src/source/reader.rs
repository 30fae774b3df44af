use crate::config::types::EncodingPolicy;
use crate::source::line::LogLine;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line} at byte offset {offset} is not valid UTF-8")]
    Encoding { line: u64, offset: u64 },
}

/// Reads a source one line at a time, tracking byte offsets
pub struct LineReader<R> {
    inner: R,
    policy: EncodingPolicy,
    buf: Vec<u8>,
    current_offset: u64,
    line_number: u64,
    undecodable: u64,
}

impl LineReader<BufReader<File>> {
    /// Open a log file for reading
    pub fn open(path: &Path, policy: EncodingPolicy) -> Result<Self, ReaderError> {
        let file = File::open(path).map_err(|e| {
            ReaderError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to open '{}': {}", path.display(), e),
            ))
        })?;
        Ok(Self::new(BufReader::new(file), policy))
    }
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R, policy: EncodingPolicy) -> Self {
        Self {
            inner,
            policy,
            buf: Vec::new(),
            current_offset: 0,
            line_number: 0,
            undecodable: 0,
        }
    }

    /// Read the next decodable line
    ///
    /// Returns Ok(None) at end of input. Lines that are not valid UTF-8 are
    /// skipped or returned as an error depending on the encoding policy.
    pub fn next_line(&mut self) -> Result<Option<LogLine>, ReaderError> {
        loop {
            self.buf.clear();
            let bytes_read = self.inner.read_until(b'\n', &mut self.buf)?;
            if bytes_read == 0 {
                return Ok(None);
            }

            let start_offset = self.current_offset;
            self.current_offset += bytes_read as u64;
            self.line_number += 1;

            let mut end = self.buf.len();
            while end > 0 && matches!(self.buf[end - 1], b'\n' | b'\r') {
                end -= 1;
            }

            match std::str::from_utf8(&self.buf[..end]) {
                Ok(text) => {
                    return Ok(Some(LogLine {
                        text: text.to_string(),
                        offset: start_offset,
                        number: self.line_number,
                    }));
                }
                Err(_) => match self.policy {
                    EncodingPolicy::Skip => {
                        warn!(
                            line = self.line_number,
                            offset = start_offset,
                            "Skipping line that is not valid UTF-8"
                        );
                        self.undecodable += 1;
                    }
                    EncodingPolicy::Abort => {
                        return Err(ReaderError::Encoding {
                            line: self.line_number,
                            offset: start_offset,
                        });
                    }
                },
            }
        }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> u64 {
        self.current_offset
    }

    pub fn lines_read(&self) -> u64 {
        self.line_number
    }

    /// Lines skipped under the skip policy
    pub fn undecodable(&self) -> u64 {
        self.undecodable
    }
}
