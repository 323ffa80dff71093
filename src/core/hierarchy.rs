//! Logger hierarchy
//!
//! Owns every logger node and resolves dotted names to them. Parenthood is
//! purely by dot-segment prefix: `a.b` is the parent of `a.b.c` as soon as
//! both exist, whatever order they were created in. Names whose ancestors do
//! not exist yet are remembered in provision entries, which are replaced
//! in place when the ancestor is finally created.

use super::diagnostics;
use super::log_event;
use super::log_level::LogLevel;
use super::logger::{DefaultLoggerFactory, Logger, LoggerFactory, LoggerNode};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const ROOT_LOGGER_NAME: &str = "root";

/// Index of a node in the hierarchy's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RegistryEntry {
    Node(NodeId),
    /// Nodes waiting for this name to be created
    Provision(Vec<NodeId>),
}

struct Registry {
    entries: HashMap<String, RegistryEntry>,
    nodes: Vec<Arc<LoggerNode>>,
}

impl Registry {
    fn node(&self, id: NodeId) -> Option<&Arc<LoggerNode>> {
        self.nodes.get(id.0)
    }

    fn root(&self) -> &Arc<LoggerNode> {
        &self.nodes[NodeId::ROOT.0]
    }

    /// Link `id` to its nearest existing ancestor, leaving provisions for
    /// every missing one on the way up.
    fn update_parents(&mut self, id: NodeId) {
        let name = self.nodes[id.0].name().to_string();
        let mut parent = NodeId::ROOT;
        let mut end = name.len();

        while let Some(dot) = name[..end].rfind('.') {
            let prefix = &name[..dot];
            match self.entries.get_mut(prefix) {
                None => {
                    self.entries
                        .insert(prefix.to_string(), RegistryEntry::Provision(vec![id]));
                }
                Some(RegistryEntry::Node(ancestor)) => {
                    parent = *ancestor;
                    break;
                }
                Some(RegistryEntry::Provision(waiters)) => waiters.push(id),
            }
            end = dot;
        }

        self.nodes[id.0].set_parent(parent);
    }

    /// Insert `id` between each waiter and the waiter's current parent,
    /// unless that parent already lies inside the new node's subtree.
    fn update_children(&mut self, waiters: Vec<NodeId>, id: NodeId) {
        let new_node = Arc::clone(&self.nodes[id.0]);
        for waiter in waiters {
            let Some(waiter_node) = self.node(waiter) else {
                diagnostics::invariant_violation(format!(
                    "Provision for [{}] lists unknown node {:?}",
                    new_node.name(),
                    waiter
                ));
                continue;
            };
            let current = waiter_node.parent_id().unwrap_or(NodeId::ROOT);
            let relink = current == NodeId::ROOT
                || match self.node(current) {
                    Some(parent) => !is_same_or_descendant(parent.name(), new_node.name()),
                    None => true,
                };
            if relink {
                new_node.set_parent(current);
                waiter_node.set_parent(id);
            }
        }
    }
}

/// Segment-wise test: `a.bc` is not a descendant of `a.b`
fn is_same_or_descendant(name: &str, ancestor: &str) -> bool {
    match name.strip_prefix(ancestor) {
        Some("") => true,
        Some(rest) => rest.starts_with('.'),
        None => false,
    }
}

struct HierarchyInner {
    registry: RwLock<Registry>,
    threshold: RwLock<LogLevel>,
    no_appender_warning_emitted: AtomicBool,
}

/// Tree of named loggers rooted at the root logger.
///
/// Cloning yields another handle onto the same tree.
///
/// # Example
///
/// ```
/// use rust_logger_hierarchy::core::{Hierarchy, LogLevel};
///
/// let hierarchy = Hierarchy::new();
/// let child = hierarchy.get_logger("app.net.server");
/// hierarchy.get_logger("app.net").set_level(Some(LogLevel::Warn));
///
/// assert_eq!(child.parent().unwrap().name(), "app.net");
/// assert_eq!(child.effective_level(), LogLevel::Warn);
/// ```
#[derive(Clone)]
pub struct Hierarchy {
    inner: Arc<HierarchyInner>,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl Hierarchy {
    /// New hierarchy whose root logs at `DEBUG` with a threshold of `ALL`
    pub fn new() -> Self {
        log_event::start_time();
        let root = LoggerNode::new(ROOT_LOGGER_NAME).with_level(Some(LogLevel::Debug));
        Self {
            inner: Arc::new(HierarchyInner {
                registry: RwLock::new(Registry {
                    entries: HashMap::new(),
                    nodes: vec![Arc::new(root)],
                }),
                threshold: RwLock::new(LogLevel::All),
                no_appender_warning_emitted: AtomicBool::new(false),
            }),
        }
    }

    pub fn root_logger(&self) -> Logger {
        let registry = self.inner.registry.read();
        Logger::from_parts(self.clone(), Arc::clone(registry.root()), NodeId::ROOT)
    }

    pub fn get_logger(&self, name: &str) -> Logger {
        self.get_logger_with_factory(name, &DefaultLoggerFactory)
    }

    /// Return the logger named `name`, creating it with `factory` if needed.
    ///
    /// Existing loggers are returned unchanged and only take the shared
    /// lock. Creation links the new node into the tree under the exclusive
    /// registry lock, so concurrent callers always receive the same node.
    pub fn get_logger_with_factory(&self, name: &str, factory: &dyn LoggerFactory) -> Logger {
        {
            let registry = self.inner.registry.read();
            if let Some(RegistryEntry::Node(id)) = registry.entries.get(name) {
                return self.logger_for(&registry, *id);
            }
        }

        let mut registry = self.inner.registry.write();
        if let Some(RegistryEntry::Node(id)) = registry.entries.get(name) {
            return self.logger_for(&registry, *id);
        }

        let id = NodeId(registry.nodes.len());
        registry.nodes.push(Arc::new(factory.new_logger_node(name)));
        let previous = registry
            .entries
            .insert(name.to_string(), RegistryEntry::Node(id));
        if let Some(RegistryEntry::Provision(waiters)) = previous {
            registry.update_children(waiters, id);
        }
        registry.update_parents(id);
        diagnostics::debug(format!("Created logger [{}]", name));

        self.logger_for(&registry, id)
    }

    /// The logger named `name` if it has been created
    pub fn exists(&self, name: &str) -> Option<Logger> {
        let registry = self.inner.registry.read();
        match registry.entries.get(name) {
            Some(RegistryEntry::Node(id)) => Some(self.logger_for(&registry, *id)),
            _ => None,
        }
    }

    /// Every created logger except the root, in creation order
    pub fn current_loggers(&self) -> Vec<Logger> {
        let registry = self.inner.registry.read();
        registry
            .nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, node)| Logger::from_parts(self.clone(), Arc::clone(node), NodeId(index)))
            .collect()
    }

    pub fn set_threshold(&self, level: LogLevel) {
        *self.inner.threshold.write() = level;
    }

    /// Set the threshold from a level name; unknown names are reported and
    /// leave the threshold unchanged.
    pub fn set_threshold_str(&self, level: &str) {
        match level.parse::<LogLevel>() {
            Ok(level) => self.set_threshold(level),
            Err(_) => diagnostics::warn(format!("Could not convert [{}] to Level.", level)),
        }
    }

    pub fn threshold(&self) -> LogLevel {
        *self.inner.threshold.read()
    }

    /// `true` when the hierarchy-wide threshold suppresses `level`
    pub fn is_disabled(&self, level: LogLevel) -> bool {
        !level.is_greater_or_equal(self.threshold())
    }

    /// Restore defaults: root at `DEBUG`, threshold `ALL`, every appender
    /// closed and removed, every other logger inherited and additive.
    /// Loggers themselves are kept.
    pub fn reset(&self) {
        let registry = self.inner.registry.write();
        registry.root().set_level(Some(LogLevel::Debug));
        self.set_threshold(LogLevel::All);
        Self::shutdown_nodes(&registry);

        for node in registry.nodes.iter().skip(1) {
            node.set_level(None);
            node.set_additive(true);
        }
        diagnostics::debug("Hierarchy reset");
    }

    /// Close every appender, attachable ones first, and detach them all
    pub fn shutdown(&self) {
        let registry = self.inner.registry.write();
        Self::shutdown_nodes(&registry);
    }

    fn shutdown_nodes(registry: &Registry) {
        for node in &registry.nodes {
            for appender in node.appenders().read().iter() {
                if appender.is_attachable() {
                    appender.close();
                }
            }
        }
        for node in &registry.nodes {
            let removed = std::mem::take(&mut *node.appenders().write());
            for appender in removed {
                appender.close();
            }
        }
    }

    fn logger_for(&self, registry: &Registry, id: NodeId) -> Logger {
        match registry.node(id) {
            Some(node) => Logger::from_parts(self.clone(), Arc::clone(node), id),
            None => {
                diagnostics::invariant_violation(format!(
                    "Registry refers to missing logger node {:?}; using the root logger",
                    id
                ));
                Logger::from_parts(self.clone(), Arc::clone(registry.root()), NodeId::ROOT)
            }
        }
    }

    /// Walk from `id` towards the root, calling `visit` until it returns
    /// `false`. A cycle or a dangling parent is reported and ends the walk.
    fn walk<F>(registry: &Registry, id: NodeId, mut visit: F)
    where
        F: FnMut(&LoggerNode) -> bool,
    {
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(id) = current {
            let Some(node) = registry.node(id) else {
                diagnostics::invariant_violation(format!("Parent link to missing node {:?}", id));
                return;
            };
            if !visit(node) {
                return;
            }
            hops += 1;
            if hops > registry.nodes.len() {
                diagnostics::invariant_violation(format!(
                    "Cycle in parent links starting at [{}]",
                    node.name()
                ));
                return;
            }
            current = node.parent_id();
        }
    }

    pub(crate) fn effective_level(&self, id: NodeId) -> LogLevel {
        let registry = self.inner.registry.read();
        let mut found = None;
        Self::walk(&registry, id, |node| {
            found = node.level();
            found.is_none()
        });
        found
            .or_else(|| registry.root().level())
            .unwrap_or(LogLevel::Debug)
    }

    pub(crate) fn parent_of(&self, id: NodeId) -> Option<Logger> {
        let registry = self.inner.registry.read();
        let parent = registry.node(id)?.parent_id()?;
        Some(self.logger_for(&registry, parent))
    }

    /// Appenders of `id` and, while additive, of its ancestors
    pub(crate) fn collect_appenders(&self, id: NodeId) -> Vec<super::appender::AppenderRef> {
        let registry = self.inner.registry.read();
        let mut collected = Vec::new();
        Self::walk(&registry, id, |node| {
            collected.extend(node.appenders().read().iter().cloned());
            node.additive()
        });
        collected
    }

    pub(crate) fn emit_no_appender_warning(&self, logger_name: &str) {
        if !self
            .inner
            .no_appender_warning_emitted
            .swap(true, Ordering::Relaxed)
        {
            diagnostics::warn(format!(
                "No appenders could be found for logger ({}).",
                logger_name
            ));
            diagnostics::warn("Please initialize the logging system properly.");
        }
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.read();
        f.debug_struct("Hierarchy")
            .field("loggers", &registry.nodes.len())
            .field("threshold", &self.threshold())
            .finish()
    }
}
