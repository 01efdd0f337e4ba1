pub mod hexdump;

use chrono::SecondsFormat;
use std::io::{self, Write};

use crate::models::packet::Frame;

/// Destination for frames that passed the filter
pub trait ReportSink: Send {
    /// Emit one accepted frame with its header report
    fn report(&mut self, frame: &Frame, lines: &[String]) -> io::Result<()>;
}

/// Writes reports as text: timestamp, length, header lines and a hex dump
pub struct TextSink<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Report sink printing to standard output
pub type StdoutSink = TextSink<io::Stdout>;

impl StdoutSink {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ReportSink for TextSink<W> {
    fn report(&mut self, frame: &Frame, lines: &[String]) -> io::Result<()> {
        writeln!(
            self.out,
            "timestamp: {}",
            frame.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false)
        )?;
        writeln!(self.out, "frame length: {} bytes", frame.wire_length)?;
        for line in lines {
            writeln!(self.out, "{}", line)?;
        }
        writeln!(self.out)?;
        for row in hexdump::hexdump(&frame.data) {
            writeln!(self.out, "{}", row)?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}
