//! Statement streamer: merges the physical lines of a dump file into
//! logical SQL statements.
//!
//! A statement is complete once its accumulated text, right-trimmed, ends
//! with `;`. Trailing unterminated text at end of file is still yielded.
//! Lines are decoded lossily so stray bytes never abort a read.

use crate::error::{HrError, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::debug;

const STATEMENT_TERMINATOR: char = ';';
const INSERT_PREFIX: &str = "INSERT INTO";

/// Tracks one statement across multiple physical lines.
#[derive(Debug, Default)]
pub struct StatementAccumulator {
    buffer: String,
    statements_emitted: usize,
}

impl StatementAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one physical line (including its newline, if any) and return
    /// the statements it completes, in order.
    pub fn push_line(&mut self, line: &str) -> Vec<String> {
        let mut completed = Vec::new();

        if !self.buffer.is_empty() && starts_insert(line) {
            // A new INSERT while a terminated statement is still pending
            // flushes the pending text first.
            if is_terminated(&self.buffer) {
                completed.push(self.take());
            }
        }
        self.buffer.push_str(line);

        if is_terminated(&self.buffer) {
            completed.push(self.take());
        }
        completed
    }

    /// Flush whatever is left at end of input, terminated or not.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            self.buffer.clear();
            return None;
        }
        Some(self.take())
    }

    pub fn statements_emitted(&self) -> usize {
        self.statements_emitted
    }

    fn take(&mut self) -> String {
        self.statements_emitted += 1;
        std::mem::take(&mut self.buffer)
    }
}

fn starts_insert(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed
        .get(..INSERT_PREFIX.len())
        .map(|head| head.eq_ignore_ascii_case(INSERT_PREFIX))
        .unwrap_or(false)
}

fn is_terminated(text: &str) -> bool {
    text.trim_end().ends_with(STATEMENT_TERMINATOR)
}

/// Lazy, finite iterator of statement texts read from a dump.
pub struct StatementStream<R> {
    reader: R,
    accumulator: StatementAccumulator,
    ready: std::collections::VecDeque<String>,
    line: Vec<u8>,
    exhausted: bool,
}

impl StatementStream<BufReader<File>> {
    /// Open a dump file. A missing or unreadable file is fatal.
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening dump file {}", path.display());
        let file = File::open(path).map_err(|e| {
            io::Error::new(e.kind(), format!("cannot open dump {}: {}", path.display(), e))
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> StatementStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            accumulator: StatementAccumulator::new(),
            ready: std::collections::VecDeque::new(),
            line: Vec::new(),
            exhausted: false,
        }
    }
}

impl<R: BufRead> Iterator for StatementStream<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(statement) = self.ready.pop_front() {
                return Some(Ok(statement));
            }
            if self.exhausted {
                return None;
            }

            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => {
                    self.exhausted = true;
                    if let Some(rest) = self.accumulator.finish() {
                        self.ready.push_back(rest);
                    }
                    debug!(
                        "Dump exhausted after {} statements",
                        self.accumulator.statements_emitted()
                    );
                }
                Ok(_) => {
                    let text = String::from_utf8_lossy(&self.line);
                    self.ready.extend(self.accumulator.push_line(&text));
                }
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(HrError::Io(e)));
                }
            }
        }
    }
}
