//! Line-oriented log parsing.
//!
//! [`parse`] walks one raw log stream line by line and yields one
//! [`LogEvent`] per line. The iterator is lazy (memory use is bounded by
//! one line regardless of log size) and restartable: it holds no shared
//! mutable state, so parsing the same [`RawLogFile`] twice yields the
//! identical sequence.
//!
//! Parsing never fails on content. Lines no rule understands come out as
//! [`LogEvent::Unrecognized`] and are counted by the aggregator.

mod events;
mod patterns;

pub use events::{ConnectionRef, LogEvent, LoggingChange, PackageInstall, PackageManager};

use crate::bundle::{RawLogFile, StreamKind};

/// Lazy event iterator over the lines of one log stream.
pub struct EventIter<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    stream: StreamKind,
}

impl Iterator for EventIter<'_> {
    type Item = LogEvent;

    fn next(&mut self) -> Option<LogEvent> {
        let (index, line) = self.lines.next()?;
        Some(patterns::classify_line(line, index + 1, self.stream))
    }
}

/// Parse one log stream into a sequence of typed events.
pub fn parse(file: &RawLogFile) -> EventIter<'_> {
    EventIter {
        lines: file.text.lines().enumerate(),
        stream: file.stream,
    }
}
