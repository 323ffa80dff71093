//! Event filters evaluated by an appender before rendering

use super::log_event::LogEvent;
use super::log_level::LogLevel;

/// Outcome of a single filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Accept,
    Deny,
    Neutral,
}

pub trait Filter: Send + Sync {
    fn decide(&self, event: &LogEvent) -> FilterDecision;
}

/// Walk a filter chain in order: the first `Deny` drops the event, the first
/// `Accept` admits it without consulting the rest, and an all-neutral chain
/// admits it.
pub fn evaluate_chain(filters: &[Box<dyn Filter>], event: &LogEvent) -> bool {
    for filter in filters {
        match filter.decide(event) {
            FilterDecision::Deny => return false,
            FilterDecision::Accept => return true,
            FilterDecision::Neutral => {}
        }
    }
    true
}

/// Drops every event. Usually the last element of a chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllFilter;

impl Filter for DenyAllFilter {
    fn decide(&self, _event: &LogEvent) -> FilterDecision {
        FilterDecision::Deny
    }
}

/// Denies events outside `[level_min, level_max]`.
///
/// Events inside the range are accepted when `accept_on_match` is set,
/// otherwise left neutral.
#[derive(Debug, Clone)]
pub struct LevelRangeFilter {
    pub level_min: Option<LogLevel>,
    pub level_max: Option<LogLevel>,
    pub accept_on_match: bool,
}

impl Default for LevelRangeFilter {
    fn default() -> Self {
        Self {
            level_min: None,
            level_max: None,
            accept_on_match: false,
        }
    }
}

impl LevelRangeFilter {
    pub fn new(level_min: Option<LogLevel>, level_max: Option<LogLevel>) -> Self {
        Self {
            level_min,
            level_max,
            accept_on_match: false,
        }
    }

    #[must_use]
    pub fn with_accept_on_match(mut self, accept: bool) -> Self {
        self.accept_on_match = accept;
        self
    }
}

impl Filter for LevelRangeFilter {
    fn decide(&self, event: &LogEvent) -> FilterDecision {
        if let Some(min) = self.level_min {
            if !event.level.is_greater_or_equal(min) {
                return FilterDecision::Deny;
            }
        }
        if let Some(max) = self.level_max {
            if event.level.rank() > max.rank() {
                return FilterDecision::Deny;
            }
        }
        if self.accept_on_match {
            FilterDecision::Accept
        } else {
            FilterDecision::Neutral
        }
    }
}

/// Matches one exact level
#[derive(Debug, Clone)]
pub struct LevelMatchFilter {
    pub level_to_match: Option<LogLevel>,
    pub accept_on_match: bool,
}

impl LevelMatchFilter {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level_to_match: Some(level),
            accept_on_match: true,
        }
    }

    #[must_use]
    pub fn with_accept_on_match(mut self, accept: bool) -> Self {
        self.accept_on_match = accept;
        self
    }
}

impl Filter for LevelMatchFilter {
    fn decide(&self, event: &LogEvent) -> FilterDecision {
        match self.level_to_match {
            Some(level) if level == event.level => {
                if self.accept_on_match {
                    FilterDecision::Accept
                } else {
                    FilterDecision::Deny
                }
            }
            _ => FilterDecision::Neutral,
        }
    }
}

/// Matches a substring of the rendered message
#[derive(Debug, Clone)]
pub struct StringMatchFilter {
    pub string_to_match: Option<String>,
    pub accept_on_match: bool,
}

impl StringMatchFilter {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            string_to_match: Some(needle.into()),
            accept_on_match: true,
        }
    }

    #[must_use]
    pub fn with_accept_on_match(mut self, accept: bool) -> Self {
        self.accept_on_match = accept;
        self
    }
}

impl Filter for StringMatchFilter {
    fn decide(&self, event: &LogEvent) -> FilterDecision {
        match &self.string_to_match {
            Some(needle) if event.message.contains(needle.as_str()) => {
                if self.accept_on_match {
                    FilterDecision::Accept
                } else {
                    FilterDecision::Deny
                }
            }
            _ => FilterDecision::Neutral,
        }
    }
}
