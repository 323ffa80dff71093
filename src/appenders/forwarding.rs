//! Appender that passes events on to other appenders

use crate::core::{Appender, AppenderRef, ErrorHandler, LogEvent, Result};

/// Forwards every event to its attached appenders, which apply their own
/// layout, filters and threshold.
///
/// It is attachable: hierarchy shutdown closes it, and through it its
/// targets, before closing ordinary appenders.
#[derive(Debug, Default)]
pub struct ForwardingAppender {
    targets: Vec<AppenderRef>,
}

impl ForwardingAppender {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_appender(mut self, target: AppenderRef) -> Self {
        self.attach(target);
        self
    }

    pub fn attach(&mut self, target: AppenderRef) {
        if !self.targets.iter().any(|t| std::sync::Arc::ptr_eq(t, &target)) {
            self.targets.push(target);
        }
    }

    pub fn targets(&self) -> &[AppenderRef] {
        &self.targets
    }
}

impl Appender for ForwardingAppender {
    fn append(&mut self, event: &LogEvent, _formatted: Option<&str>, _errors: &dyn ErrorHandler) -> Result<()> {
        for target in &self.targets {
            target.do_append(event);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for target in &self.targets {
            target.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        for target in &self.targets {
            target.close();
        }
        Ok(())
    }

    fn requires_layout(&self) -> bool {
        false
    }

    fn is_attachable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::WriterAppender;
    use crate::core::{AppenderHandle, LogLevel};
    use crate::layout::PatternLayout;

    #[test]
    fn test_forwards_to_each_target_once() {
        let (writer, out) = WriterAppender::shared_buffer();
        let target = AppenderHandle::with_layout("target", writer, PatternLayout::new("%m;"));

        let forwarding = ForwardingAppender::new()
            .with_appender(target.clone())
            .with_appender(target.clone());
        assert_eq!(forwarding.targets().len(), 1);

        let handle = AppenderHandle::new("fwd", forwarding);
        assert!(handle.is_attachable());
        handle.do_append(&LogEvent::new("f", LogLevel::Info, "hello"));
        assert_eq!(out.contents(), "hello;");

        handle.close();
        assert!(target.is_closed());
    }
}
