//! Line assembly for the text command channel.
//!
//! Bytes arrive one at a time from the serial transport. A line ends at
//! `\n` or `\r`; surrounding whitespace is trimmed and empty lines are
//! dropped so that `\r\n` terminators yield a single line.

use heapless::String;

/// Maximum accepted line length in bytes (after the terminator is stripped)
pub const MAX_LINE_LEN: usize = 64;

/// A complete, trimmed command line
pub type Line = String<MAX_LINE_LEN>;

/// Errors that can occur while assembling lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded [`MAX_LINE_LEN`]; the rest of it is discarded
    Overflow,
    /// Byte was not valid ASCII text
    InvalidByte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Accumulating bytes of the current line
    Reading,
    /// Current line overflowed or was corrupt; skip until the terminator
    Discarding,
}

/// Incremental line parser
#[derive(Debug, Clone)]
pub struct LineParser {
    state: ParseState,
    buffer: String<MAX_LINE_LEN>,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    /// Create a new line parser
    pub fn new() -> Self {
        Self {
            state: ParseState::Reading,
            buffer: String::new(),
        }
    }

    /// Reset the parser state, dropping any partial line
    pub fn reset(&mut self) {
        self.state = ParseState::Reading;
        self.buffer.clear();
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(line))` when a terminator completes a non-empty line,
    /// `Ok(None)` when more bytes are needed, or `Err` when the current line
    /// had to be abandoned. An error is reported once per abandoned line.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        if byte == b'\n' || byte == b'\r' {
            let discarded = self.state == ParseState::Discarding;
            let line = self.take_line();
            self.reset();
            return match (discarded, line) {
                (true, _) => Ok(None),
                (false, line) => Ok(line),
            };
        }

        if self.state == ParseState::Discarding {
            return Ok(None);
        }

        if !byte.is_ascii() {
            self.state = ParseState::Discarding;
            self.buffer.clear();
            return Err(LineError::InvalidByte);
        }

        if self.buffer.push(byte as char).is_err() {
            self.state = ParseState::Discarding;
            self.buffer.clear();
            return Err(LineError::Overflow);
        }

        Ok(None)
    }

    fn take_line(&self) -> Option<Line> {
        let trimmed = self.buffer.trim();
        if trimmed.is_empty() {
            return None;
        }
        let mut line = Line::new();
        // Cannot fail: trimmed is a sub-slice of a buffer of the same capacity
        let _ = line.push_str(trimmed);
        Some(line)
    }
}
