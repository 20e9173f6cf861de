//! Line editing for the pseudo-terminal.
//!
//! [`LineEditor`] turns single input units into committed lines, echoing as
//! it goes. All output goes through an [`OutputChannel`], an explicit handle
//! owned by the session that created it. Once the session closes the channel,
//! further writes are dropped.

use std::io::{self, Write};
use tracing::debug;

pub const CARRIAGE_RETURN: char = '\r';
pub const DELETE: char = '\x7f';
pub const BACKSPACE: char = '\x08';

/// Line break as understood by the terminal.
pub const NEWLINE: &str = "\r\n";
/// Cursor back, blank the cell, cursor back.
pub const ERASE_SEQUENCE: &str = "\x08 \x08";

/// Write side of a pseudo-terminal session.
///
/// Writes are append-only and go straight to the wrapped writer while the
/// channel is open.
#[derive(Debug)]
pub struct OutputChannel<W: Write> {
    writer: Option<W>,
}

impl<W: Write> OutputChannel<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Invalidates the channel and hands back the writer.
    pub fn close(&mut self) -> Option<W> {
        self.writer.take()
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.writer.as_ref()
    }

    pub fn write_str(&mut self, data: &str) -> io::Result<()> {
        self.write_all(data.as_bytes())
    }
}

impl<W: Write> Write for OutputChannel<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => {
                debug!("Dropping {} bytes written to a closed terminal", buf.len());
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// Converts text to terminal line endings: every line break becomes CR LF.
pub fn to_terminal_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', NEWLINE)
}

/// Writes `text` followed by a line break, using terminal line endings.
pub fn write_line(out: &mut dyn Write, text: &str) -> io::Result<()> {
    out.write_all(to_terminal_text(text).as_bytes())?;
    out.write_all(NEWLINE.as_bytes())
}

/// Writer adapter that turns bare LF into CR LF.
///
/// Used for log output that shares the screen with a raw-mode session.
#[derive(Debug)]
pub struct CrlfWriter<W: Write> {
    inner: W,
    last_was_cr: bool,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            last_was_cr: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut converted = Vec::with_capacity(buf.len() + 8);
        for &byte in buf {
            if byte == b'\n' && !self.last_was_cr {
                converted.push(b'\r');
            }
            converted.push(byte);
            self.last_was_cr = byte == b'\r';
        }
        self.inner.write_all(&converted)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Accumulates the line currently being typed.
///
/// The buffer never holds control characters, and backspace only removes
/// from its end.
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The line typed so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Processes one input unit and returns the committed line, if any.
    ///
    /// - carriage return: newline is echoed; a non-empty buffer is committed
    ///   and cleared
    /// - delete/backspace: the last character is removed and erased on
    ///   screen; nothing happens on an empty buffer
    /// - other control characters are ignored
    /// - anything else is appended and echoed
    pub fn feed(&mut self, input: char, out: &mut dyn Write) -> io::Result<Option<String>> {
        match input {
            CARRIAGE_RETURN => {
                out.write_all(NEWLINE.as_bytes())?;
                if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(std::mem::take(&mut self.buffer)))
                }
            }
            DELETE | BACKSPACE => {
                if self.buffer.pop().is_some() {
                    out.write_all(ERASE_SEQUENCE.as_bytes())?;
                }
                Ok(None)
            }
            ch if ch.is_control() => Ok(None),
            ch => {
                self.buffer.push(ch);
                let mut encoded = [0u8; 4];
                out.write_all(ch.encode_utf8(&mut encoded).as_bytes())?;
                Ok(None)
            }
        }
    }
}
