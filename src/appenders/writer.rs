//! Appender over any `std::io::Write`

use crate::core::{Appender, ErrorHandler, LogEvent, Result};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

pub struct WriterAppender<W: Write + Send> {
    writer: W,
    immediate_flush: bool,
}

impl<W: Write + Send> WriterAppender<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            immediate_flush: true,
        }
    }

    #[must_use]
    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl WriterAppender<SharedBuffer> {
    /// Appender writing into memory, plus a handle for reading it back
    pub fn shared_buffer() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::new();
        (Self::new(buffer.clone()), buffer)
    }
}

impl<W: Write + Send> Appender for WriterAppender<W> {
    fn append(&mut self, event: &LogEvent, formatted: Option<&str>, _errors: &dyn ErrorHandler) -> Result<()> {
        let text = formatted.unwrap_or(event.message.as_str());
        self.writer.write_all(text.as_bytes())?;
        if self.immediate_flush {
            self.writer.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Cloneable in-memory writer; every clone sees the same bytes
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
