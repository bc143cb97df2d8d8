//! Optional text sink for check diagnostics.

use std::fmt;
use std::io::{self, Write};

/// An append-only destination for diagnostic lines.
///
/// Works with `write!`/`writeln!`; when no sink was supplied every write is a
/// no-op, so callers never need to branch on whether output is wanted.
pub struct Output<'a> {
    sink: Option<&'a mut dyn Write>,
}

impl<'a> Output<'a> {
    /// Wraps an optional sink.
    pub fn new(sink: Option<&'a mut dyn Write>) -> Self {
        Self { sink }
    }

    /// An output that discards everything.
    #[must_use]
    pub fn none() -> Self {
        Self { sink: None }
    }

    /// Returns true if a sink is attached.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Writes formatted text to the sink, if any.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        match &mut self.sink {
            Some(sink) => sink.write_fmt(args),
            None => Ok(()),
        }
    }

    /// Flushes the sink, if any.
    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Output<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_reach_the_sink() {
        let mut buf = Vec::new();
        {
            let mut out = Output::new(Some(&mut buf));
            writeln!(out, "postlist:").unwrap();
            writeln!(out, "{} errors", 2).unwrap();
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "postlist:\n2 errors\n");
    }

    #[test]
    fn missing_sink_swallows_writes() {
        let mut out = Output::none();
        assert!(!out.is_enabled());
        writeln!(out, "ignored").unwrap();
        out.flush().unwrap();
    }
}
