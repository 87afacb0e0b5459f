//! Stream appender: writes rendered records to any `Write` sink

use crate::core::{
    Appender, DestinationKind, LifecycleState, LogEntry, LoggerError, PatternLayout, Result,
    DEFAULT_PATTERN,
};
use std::io::Write;

pub struct StreamAppender {
    writer: Option<Box<dyn Write + Send>>,
    layout: PatternLayout,
    immediate_flush: bool,
    state: LifecycleState,
    kind: DestinationKind,
}

impl StreamAppender {
    /// Wrap `writer` and start the appender
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if `pattern` does not compile.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_logger_registry::appenders::StreamAppender;
    ///
    /// let appender = StreamAppender::new(Vec::<u8>::new(), Some("%level %msg%n")).unwrap();
    /// ```
    pub fn new(writer: impl Write + Send + 'static, pattern: Option<&str>) -> Result<Self> {
        Self::from_boxed(Box::new(writer), pattern)
    }

    pub fn from_boxed(writer: Box<dyn Write + Send>, pattern: Option<&str>) -> Result<Self> {
        let layout = PatternLayout::compile_or(pattern, DEFAULT_PATTERN)?;
        let mut appender = Self {
            writer: Some(writer),
            layout,
            immediate_flush: true,
            state: LifecycleState::Constructed,
            kind: DestinationKind::Stream,
        };
        appender.state = LifecycleState::Started;
        Ok(appender)
    }

    /// Flush after every record (default: true)
    #[must_use]
    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    /// Report under another destination kind (used by the console appender)
    pub(crate) fn as_kind(mut self, kind: DestinationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn layout(&self) -> &PatternLayout {
        &self.layout
    }

    /// Write one already-rendered record with a single `write_all`
    pub(crate) fn write_record(&mut self, record: &[u8]) -> Result<()> {
        if self.state != LifecycleState::Started {
            return Err(LoggerError::AppenderStopped(self.kind));
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or(LoggerError::AppenderStopped(self.kind))?;

        writer.write_all(record)?;
        if self.immediate_flush {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Appender for StreamAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let record = self.layout.render(entry);
        self.write_record(record.as_bytes())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.state == LifecycleState::Stopped {
            return Ok(());
        }
        self.state = LifecycleState::Stopped;
        // Dropping the writer closes the sink
        match self.writer.take() {
            Some(mut writer) => writer.flush().map_err(Into::into),
            None => Ok(()),
        }
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn kind(&self) -> DestinationKind {
        self.kind
    }
}

impl Drop for StreamAppender {
    fn drop(&mut self) {
        // Ensure all buffered data reaches the sink
        let _ = self.stop();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use parking_lot::Mutex;
    use std::io::Write;
    use std::sync::Arc;

    /// Cloneable in-memory sink for capturing appender output
    #[derive(Clone, Default)]
    pub struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
