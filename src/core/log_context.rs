//! Diagnostic context captured into every log event
//!
//! This module provides:
//! - `LogContext`: the key/value snapshot carried by an event
//! - `Mdc`: per-thread mapped diagnostic context
//! - `Ndc`: per-thread nested diagnostic context
//! - `MdcGuard`: RAII guard for scoped context

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// Value type for context fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Unordered key/value context attached to an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogContext {
    fields: HashMap<String, FieldValue>,
}

impl LogContext {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// Add a field to the context
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field to the context (mutable version)
    pub fn add_field<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Entries sorted ascending by key
    pub fn sorted_entries(&self) -> Vec<(&String, &FieldValue)> {
        let mut entries: Vec<_> = self.fields.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

thread_local! {
    static MDC: RefCell<LogContext> = RefCell::new(LogContext::new());
    static NDC: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Mapped diagnostic context for the current thread.
///
/// Every event created on this thread captures a snapshot of the map.
///
/// # Example
///
/// ```
/// use rust_logger_hierarchy::core::Mdc;
///
/// Mdc::put("request_id", "abc-123");
/// assert_eq!(Mdc::get("request_id").unwrap().to_string(), "abc-123");
/// Mdc::remove("request_id");
/// assert!(Mdc::get("request_id").is_none());
/// ```
pub struct Mdc;

impl Mdc {
    pub fn put<K, V>(key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        MDC.with(|mdc| mdc.borrow_mut().add_field(key, value));
    }

    pub fn get(key: &str) -> Option<FieldValue> {
        MDC.with(|mdc| mdc.borrow().get(key).cloned())
    }

    pub fn remove(key: &str) {
        MDC.with(|mdc| {
            mdc.borrow_mut().fields.remove(key);
        });
    }

    pub fn clear() {
        MDC.with(|mdc| mdc.borrow_mut().fields.clear());
    }

    /// Copy of the current thread's map
    pub fn snapshot() -> LogContext {
        MDC.with(|mdc| mdc.borrow().clone())
    }

    /// Put a field that is removed again when the guard drops
    #[must_use = "the field is removed as soon as the guard is dropped"]
    pub fn scoped<K, V>(key: K, value: V) -> MdcGuard
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        Self::put(key.clone(), value);
        MdcGuard { key }
    }
}

/// RAII guard for scoped MDC fields
pub struct MdcGuard {
    key: String,
}

impl Drop for MdcGuard {
    fn drop(&mut self) {
        Mdc::remove(&self.key);
    }
}

/// Nested diagnostic context for the current thread.
///
/// Rendered as the pushed messages joined by single spaces.
pub struct Ndc;

impl Ndc {
    pub fn push(message: impl Into<String>) {
        NDC.with(|ndc| ndc.borrow_mut().push(message.into()));
    }

    pub fn pop() -> Option<String> {
        NDC.with(|ndc| ndc.borrow_mut().pop())
    }

    pub fn peek() -> Option<String> {
        NDC.with(|ndc| ndc.borrow().last().cloned())
    }

    pub fn depth() -> usize {
        NDC.with(|ndc| ndc.borrow().len())
    }

    pub fn clear() {
        NDC.with(|ndc| ndc.borrow_mut().clear());
    }

    /// Full context, or `None` when the stack is empty
    pub fn get() -> Option<String> {
        NDC.with(|ndc| {
            let ndc = ndc.borrow();
            if ndc.is_empty() {
                None
            } else {
                Some(ndc.join(" "))
            }
        })
    }
}
