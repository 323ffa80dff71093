//! Named loggers
//!
//! A [`Logger`] is a cheap, cloneable handle onto a node owned by a
//! [`Hierarchy`]. Level checks, parent lookups and appender collection all go
//! through the hierarchy so that the view of the tree stays consistent while
//! other threads create loggers.

use super::appender::AppenderRef;
use super::diagnostics;
use super::hierarchy::{Hierarchy, NodeId};
use super::log_event::{LocationInfo, LogEvent};
use super::log_level::LogLevel;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub(crate) const NO_PARENT: usize = usize::MAX;

/// State of one named logger.
///
/// Nodes are created by a [`LoggerFactory`] and owned by the hierarchy; the
/// parent link is maintained by the hierarchy and only changes while its
/// registry lock is held exclusively.
pub struct LoggerNode {
    name: String,
    level: RwLock<Option<LogLevel>>,
    additive: AtomicBool,
    appenders: RwLock<Vec<AppenderRef>>,
    parent: AtomicUsize,
}

impl LoggerNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(None),
            additive: AtomicBool::new(true),
            appenders: RwLock::new(Vec::new()),
            parent: AtomicUsize::new(NO_PARENT),
        }
    }

    #[must_use]
    pub fn with_level(self, level: Option<LogLevel>) -> Self {
        *self.level.write() = level;
        self
    }

    #[must_use]
    pub fn with_additivity(self, additive: bool) -> Self {
        self.additive.store(additive, Ordering::Relaxed);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Option<LogLevel> {
        *self.level.read()
    }

    pub(crate) fn set_level(&self, level: Option<LogLevel>) {
        *self.level.write() = level;
    }

    pub fn additive(&self) -> bool {
        self.additive.load(Ordering::Relaxed)
    }

    pub(crate) fn set_additive(&self, additive: bool) {
        self.additive.store(additive, Ordering::Relaxed);
    }

    pub(crate) fn parent_id(&self) -> Option<NodeId> {
        match self.parent.load(Ordering::Acquire) {
            NO_PARENT => None,
            id => Some(NodeId(id)),
        }
    }

    pub(crate) fn set_parent(&self, parent: NodeId) {
        self.parent.store(parent.0, Ordering::Release);
    }

    pub(crate) fn appenders(&self) -> &RwLock<Vec<AppenderRef>> {
        &self.appenders
    }
}

impl fmt::Debug for LoggerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerNode")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("additive", &self.additive())
            .field("appenders", &self.appenders.read().len())
            .finish()
    }
}

/// Creates the node for a logger name the hierarchy has not seen yet
pub trait LoggerFactory: Send + Sync {
    fn new_logger_node(&self, name: &str) -> LoggerNode;
}

/// Nodes with an inherited level and additivity on
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLoggerFactory;

impl LoggerFactory for DefaultLoggerFactory {
    fn new_logger_node(&self, name: &str) -> LoggerNode {
        LoggerNode::new(name)
    }
}

/// Handle to a named logger
#[derive(Clone)]
pub struct Logger {
    hierarchy: Hierarchy,
    node: Arc<LoggerNode>,
    id: NodeId,
}

impl Logger {
    pub(crate) fn from_parts(hierarchy: Hierarchy, node: Arc<LoggerNode>, id: NodeId) -> Self {
        Self {
            hierarchy,
            node,
            id,
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.node.name()
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn is_root(&self) -> bool {
        self.id == NodeId::ROOT
    }

    /// Level assigned to this logger, `None` when inherited
    pub fn level(&self) -> Option<LogLevel> {
        self.node.level()
    }

    /// Assign or clear this logger's level. The root must keep a level, so
    /// clearing it is reported and ignored.
    pub fn set_level(&self, level: Option<LogLevel>) {
        if level.is_none() && self.is_root() {
            diagnostics::error("You have tried to set a null level to root.");
            return;
        }
        self.node.set_level(level);
    }

    pub fn additivity(&self) -> bool {
        self.node.additive()
    }

    pub fn set_additivity(&self, additive: bool) {
        self.node.set_additive(additive);
    }

    /// Own level, else the nearest ancestor's
    pub fn effective_level(&self) -> LogLevel {
        self.hierarchy.effective_level(self.id)
    }

    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        !self.hierarchy.is_disabled(level) && level.is_greater_or_equal(self.effective_level())
    }

    pub fn parent(&self) -> Option<Logger> {
        self.hierarchy.parent_of(self.id)
    }

    /// Attach an appender. Attaching the same appender twice is a no-op.
    pub fn add_appender(&self, appender: AppenderRef) {
        let mut appenders = self.node.appenders().write();
        if !appenders.iter().any(|a| Arc::ptr_eq(a, &appender)) {
            appenders.push(appender);
        }
    }

    pub fn remove_appender(&self, appender: &AppenderRef) -> bool {
        let mut appenders = self.node.appenders().write();
        let before = appenders.len();
        appenders.retain(|a| !Arc::ptr_eq(a, appender));
        appenders.len() != before
    }

    pub fn remove_appender_by_name(&self, name: &str) -> Option<AppenderRef> {
        let mut appenders = self.node.appenders().write();
        let index = appenders.iter().position(|a| a.name() == name)?;
        Some(appenders.remove(index))
    }

    /// Detach every appender without closing it
    pub fn remove_all_appenders(&self) -> Vec<AppenderRef> {
        std::mem::take(&mut *self.node.appenders().write())
    }

    pub fn appenders(&self) -> Vec<AppenderRef> {
        self.node.appenders().read().clone()
    }

    pub fn appender(&self, name: &str) -> Option<AppenderRef> {
        self.node
            .appenders()
            .read()
            .iter()
            .find(|a| a.name() == name)
            .cloned()
    }

    pub fn is_attached(&self, appender: &AppenderRef) -> bool {
        self.node
            .appenders()
            .read()
            .iter()
            .any(|a| Arc::ptr_eq(a, appender))
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.is_enabled_for(level) {
            return;
        }
        self.call_appenders(&LogEvent::new(self.name(), level, message));
    }

    /// Log with an explicit source location
    pub fn log_at(&self, level: LogLevel, message: impl Into<String>, location: LocationInfo) {
        if !self.is_enabled_for(level) {
            return;
        }
        let event = LogEvent::new(self.name(), level, message).with_location(location);
        self.call_appenders(&event);
    }

    /// Hand a prepared event to this logger's appenders and, while
    /// additive, to those of its ancestors. No level check is made.
    pub fn call_appenders(&self, event: &LogEvent) {
        let appenders = self.hierarchy.collect_appenders(self.id);
        if appenders.is_empty() {
            self.hierarchy.emit_no_appender_warning(self.name());
            return;
        }
        for appender in &appenders {
            appender.do_append(event);
        }
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }
}

impl PartialEq for Logger {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Logger {}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("additive", &self.additivity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::WriterAppender;
    use crate::core::appender::AppenderHandle;
    use crate::layout::PatternLayout;

    fn capture(name: &str) -> (AppenderRef, crate::appenders::SharedBuffer) {
        let (writer, buffer) = WriterAppender::shared_buffer();
        (
            AppenderHandle::with_layout(name, writer, PatternLayout::new("%c:%p:%m;")),
            buffer,
        )
    }

    #[test]
    fn test_add_appender_is_idempotent() {
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.get_logger("app");
        let (appender, _) = capture("cap");

        logger.add_appender(appender.clone());
        logger.add_appender(appender.clone());
        assert_eq!(logger.appenders().len(), 1);
        assert!(logger.is_attached(&appender));

        assert!(logger.remove_appender(&appender));
        assert!(!logger.remove_appender(&appender));
    }

    #[test]
    fn test_additivity_controls_ancestor_appenders() {
        let hierarchy = Hierarchy::new();
        let (root_appender, root_out) = capture("root");
        let (child_appender, child_out) = capture("child");
        hierarchy.root_logger().add_appender(root_appender);

        let child = hierarchy.get_logger("a.b");
        child.add_appender(child_appender);
        child.info("both");

        child.set_additivity(false);
        child.info("child only");

        assert_eq!(child_out.contents(), "a.b:INFO:both;a.b:INFO:child only;");
        assert_eq!(root_out.contents(), "a.b:INFO:both;");
    }

    #[test]
    fn test_level_check_and_threshold() {
        let hierarchy = Hierarchy::new();
        let (appender, out) = capture("cap");
        hierarchy.root_logger().add_appender(appender);

        let logger = hierarchy.get_logger("svc");
        logger.set_level(Some(LogLevel::Warn));
        logger.info("dropped");
        logger.warn("kept");

        hierarchy.set_threshold(LogLevel::Error);
        logger.warn("below threshold");
        logger.error("kept too");

        assert_eq!(out.contents(), "svc:WARN:kept;svc:ERROR:kept too;");
    }

    #[test]
    fn test_root_level_cannot_be_cleared() {
        let hierarchy = Hierarchy::new();
        let root = hierarchy.root_logger();
        root.set_level(None);
        assert_eq!(root.level(), Some(LogLevel::Debug));
    }

    #[test]
    fn test_appender_lookup_by_name() {
        let hierarchy = Hierarchy::new();
        let logger = hierarchy.get_logger("x");
        let (appender, _) = capture("named");
        logger.add_appender(appender);

        assert!(logger.appender("named").is_some());
        assert!(logger.appender("other").is_none());
        assert!(logger.remove_appender_by_name("named").is_some());
        assert!(logger.appenders().is_empty());
    }

    #[test]
    fn test_log_at_carries_location() {
        let hierarchy = Hierarchy::new();
        let (writer, out) = WriterAppender::shared_buffer();
        hierarchy
            .root_logger()
            .add_appender(AppenderHandle::with_layout("loc", writer, PatternLayout::new("%M:%L")));

        hierarchy
            .get_logger("x")
            .log_at(LogLevel::Info, "m", LocationInfo::new("x", "run", "x.rs", 12));
        assert_eq!(out.contents(), "run:12");
    }
}
