//! Configuration of a hierarchy from code or from key/value pairs
//!
//! [`Configurator`] wires loggers to named appenders. Appenders are either
//! registered up front with [`Configurator::register_appender`] or described
//! by `appender.<name>.*` keys passed to [`Configurator::configure`]. Every
//! problem is reported to the diagnostics channel and the offending element
//! is skipped; the rest of the configuration still applies.

use crate::appenders::{
    ConsoleAppender, ConsoleTarget, DailyRollingFileAppender, FileAppender, FileOptions,
    RollingPolicy,
};
use crate::core::{
    diagnostics, AppenderHandle, AppenderRef, DenyAllFilter, ErrorHandler, FallbackErrorHandler,
    Filter, Hierarchy, LevelMatchFilter, LevelRangeFilter, LevelSpec, LogLevel, Logger,
    LoggerError, OnlyOnceErrorHandler, Result, StringMatchFilter,
};
use crate::layout::{PatternLayout, DEFAULT_CONVERSION_PATTERN, TTCC_CONVERSION_PATTERN};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::env;
use std::sync::Arc;

pub const DEBUG_KEY: &str = "debug";
pub const RESET_KEY: &str = "reset";
pub const THRESHOLD_KEY: &str = "threshold";
pub const ROOT_LOGGER_KEY: &str = "rootLogger";
pub const LOGGER_PREFIX: &str = "logger.";
pub const ADDITIVITY_PREFIX: &str = "additivity.";
pub const APPENDER_PREFIX: &str = "appender.";

const INHERITED: &str = "INHERITED";
const MAX_SUBSTITUTION_DEPTH: usize = 8;

type Properties = BTreeMap<String, String>;

/// Applies logger and appender settings to a [`Hierarchy`]
///
/// # Examples
///
/// ```
/// use rust_logger_hierarchy::appenders::WriterAppender;
/// use rust_logger_hierarchy::config::Configurator;
/// use rust_logger_hierarchy::core::{AppenderHandle, Hierarchy, LogLevel};
///
/// let hierarchy = Hierarchy::new();
/// let mut configurator = Configurator::new(hierarchy.clone());
///
/// let (writer, out) = WriterAppender::shared_buffer();
/// configurator.register_appender("mem", AppenderHandle::new("mem", writer));
/// configurator.register_layout_pattern("mem", "%p %c - %m%n").unwrap();
/// configurator.configure_root("WARN", &["mem"]);
///
/// hierarchy.get_logger("app").warn("careful");
/// assert_eq!(out.contents(), "WARN app - careful\n");
/// ```
pub struct Configurator {
    hierarchy: Hierarchy,
    registered: HashMap<String, AppenderRef>,
}

impl Configurator {
    pub fn new(hierarchy: Hierarchy) -> Self {
        Self {
            hierarchy,
            registered: HashMap::new(),
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Make `appender` available under `name`. A name that is already taken
    /// keeps its first appender, which is returned.
    pub fn register_appender(&mut self, name: impl Into<String>, appender: AppenderRef) -> AppenderRef {
        let name = name.into();
        if let Some(existing) = self.registered.get(&name) {
            diagnostics::debug(format!("Appender [{}] already registered; keeping it", name));
            return existing.clone();
        }
        self.registered.insert(name, appender.clone());
        appender
    }

    pub fn appender(&self, name: &str) -> Option<AppenderRef> {
        self.registered.get(name).cloned()
    }

    /// Give a registered appender a pattern layout
    ///
    /// # Errors
    ///
    /// Returns an error if no appender is registered under `appender_name`.
    pub fn register_layout_pattern(&self, appender_name: &str, pattern: &str) -> Result<()> {
        let appender = self.registered.get(appender_name).ok_or_else(|| {
            LoggerError::config(
                "Configurator",
                format!("No appender named [{}] is registered", appender_name),
            )
        })?;
        appender.set_layout(PatternLayout::new(pattern));
        Ok(())
    }

    /// Set the root level and replace its appenders with the named ones
    pub fn configure_root(&self, level: &str, appender_names: &[&str]) {
        let root = self.hierarchy.root_logger();
        let appenders = self.resolve_registered(appender_names);
        apply_logger_settings(&root, Some(level), appenders, &self.registered);
    }

    /// Set `name`'s level (a level name, `INHERITED` or `NULL`), replace its
    /// appenders with the named ones and set its additivity
    pub fn configure_logger(&self, name: &str, level: &str, appender_names: &[&str], additive: bool) {
        let logger = self.hierarchy.get_logger(name);
        let appenders = self.resolve_registered(appender_names);
        apply_logger_settings(&logger, Some(level), appenders, &self.registered);
        logger.set_additivity(additive);
    }

    fn resolve_registered(&self, names: &[&str]) -> Vec<AppenderRef> {
        names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .filter_map(|name| match self.registered.get(name) {
                Some(appender) => Some(appender.clone()),
                None => {
                    diagnostics::error(format!("Appender named [{}] could not be found.", name));
                    None
                }
            })
            .collect()
    }

    /// Apply already-parsed key/value pairs. Later duplicates of a key win.
    ///
    /// Appenders described in the pairs are built once per call and shared
    /// by every logger that names them; names without an `appender.<name>`
    /// key fall back to registered appenders.
    pub fn configure<I, K, V>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let props: Properties = pairs
            .into_iter()
            .map(|(k, v)| (k.into().trim().to_string(), v.into()))
            .collect();
        let mut run = ConfigRun {
            registered: &self.registered,
            props: &props,
            built: HashMap::new(),
            in_progress: HashSet::new(),
        };

        if let Some(debug) = run.value(DEBUG_KEY) {
            diagnostics::set_internal_debugging(to_bool(&debug, false));
        }
        if run.value(RESET_KEY).is_some_and(|v| to_bool(&v, false)) {
            self.hierarchy.reset();
            diagnostics::debug("Hierarchy reset by configuration");
        }
        if let Some(threshold) = run.value(THRESHOLD_KEY) {
            self.hierarchy.set_threshold_str(threshold.trim());
            diagnostics::debug(format!("Hierarchy threshold set to [{}].", self.hierarchy.threshold()));
        }

        match run.value(ROOT_LOGGER_KEY) {
            Some(value) => run.configure_logger(&self.hierarchy.root_logger(), &value),
            None => diagnostics::debug("Could not find root logger information. Is this OK?"),
        }

        for key in props.keys() {
            if let Some(name) = key.strip_prefix(LOGGER_PREFIX) {
                let logger = self.hierarchy.get_logger(name);
                if let Some(value) = run.value(key) {
                    run.configure_logger(&logger, &value);
                }
                if let Some(additive) = run.value(&format!("{}{}", ADDITIVITY_PREFIX, name)) {
                    let additive = to_bool(&additive, true);
                    diagnostics::debug(format!("Setting additivity for \"{}\" to {}", name, additive));
                    logger.set_additivity(additive);
                }
            } else if let Some(name) = key.strip_prefix(ADDITIVITY_PREFIX) {
                if !props.contains_key(&format!("{}{}", LOGGER_PREFIX, name)) {
                    if let Some(additive) = run.value(key) {
                        self.hierarchy
                            .get_logger(name)
                            .set_additivity(to_bool(&additive, true));
                    }
                }
            }
        }
    }
}

/// State for one `configure` call
struct ConfigRun<'a> {
    registered: &'a HashMap<String, AppenderRef>,
    props: &'a Properties,
    built: HashMap<String, AppenderRef>,
    in_progress: HashSet<String>,
}

impl ConfigRun<'_> {
    /// Value for `key` with `${var}` references substituted
    fn value(&self, key: &str) -> Option<String> {
        self.props
            .get(key)
            .map(|raw| substitute_vars(raw, self.props, 0))
    }

    /// Option `name` below `prefix`, matched case-insensitively
    fn option(&self, prefix: &str, name: &str) -> Option<String> {
        let wanted = format!("{}.{}", prefix, name);
        self.props
            .keys()
            .find(|key| key.eq_ignore_ascii_case(&wanted))
            .and_then(|key| self.value(key))
            .map(|v| v.trim().to_string())
    }

    fn bool_option(&self, prefix: &str, name: &str, default: bool) -> bool {
        self.option(prefix, name)
            .map(|v| to_bool(&v, default))
            .unwrap_or(default)
    }

    fn level_option(&self, prefix: &str, name: &str) -> Option<LogLevel> {
        let raw = self.option(prefix, name)?;
        match raw.parse::<LevelSpec>() {
            Ok(spec) => spec.level(),
            Err(e) => {
                diagnostics::error(format!("Could not convert [{}] for {}.{}: {}", raw, prefix, name, e));
                None
            }
        }
    }

    /// `LEVEL, appender1, appender2`; an empty level leaves the level alone
    fn configure_logger(&mut self, logger: &Logger, value: &str) {
        diagnostics::debug(format!("Parsing for [{}] with value=[{}].", logger.name(), value));
        let mut tokens = value.split(',');
        let level = tokens.next().map(str::trim).filter(|t| !t.is_empty());

        let mut appenders = Vec::new();
        for name in tokens.map(str::trim).filter(|t| !t.is_empty()) {
            diagnostics::debug(format!("Parsing appender named \"{}\".", name));
            if let Some(appender) = self.appender(name) {
                appenders.push(appender);
            }
        }
        apply_logger_settings(logger, level, appenders, self.registered);
    }

    /// Appender `name`, built from its keys the first time it is requested
    fn appender(&mut self, name: &str) -> Option<AppenderRef> {
        if let Some(appender) = self.built.get(name) {
            diagnostics::debug(format!("Appender \"{}\" was already parsed.", name));
            return Some(appender.clone());
        }
        let prefix = format!("{}{}", APPENDER_PREFIX, name);
        let Some(kind) = self.value(&prefix) else {
            if let Some(appender) = self.registered.get(name) {
                return Some(appender.clone());
            }
            diagnostics::error(format!("Could not find value for key {}", prefix));
            return None;
        };
        if !self.in_progress.insert(name.to_string()) {
            diagnostics::error(format!("Appender [{}] refers to itself through its error handler", name));
            return None;
        }

        let appender = self.build_appender(name, &prefix, kind.trim());
        self.in_progress.remove(name);
        let appender = appender?;
        self.built.insert(name.to_string(), appender.clone());
        Some(appender)
    }

    fn build_appender(&mut self, name: &str, prefix: &str, kind: &str) -> Option<AppenderRef> {
        let handle = match self.build_sink(name, prefix, kind) {
            Ok(handle) => handle,
            Err(e) => {
                diagnostics::error_with(format!("Could not instantiate appender named \"{}\".", name), &e);
                return None;
            }
        };

        let layout_prefix = format!("{}.layout", prefix);
        match self.value(&layout_prefix) {
            Some(layout) => {
                let pattern = match short_kind(&layout) {
                    "PatternLayout" => self
                        .option(&layout_prefix, "conversionPattern")
                        .unwrap_or_else(|| DEFAULT_CONVERSION_PATTERN.to_string()),
                    "SimpleLayout" => "%p - %m%n".to_string(),
                    "TTCCLayout" => TTCC_CONVERSION_PATTERN.to_string(),
                    other => {
                        diagnostics::error(format!("Unknown layout [{}] for appender [{}]", other, name));
                        DEFAULT_CONVERSION_PATTERN.to_string()
                    }
                };
                diagnostics::debug(format!("Parsing layout options for \"{}\".", name));
                handle.set_layout(PatternLayout::new(pattern));
            }
            None if handle.requires_layout() => {
                diagnostics::error(format!("Appender [{}] requires a layout but none was configured", name));
            }
            None => {}
        }

        if let Some(threshold) = self.level_option(prefix, "threshold") {
            handle.set_threshold(threshold);
        }

        self.configure_error_handler(name, prefix, &handle);
        self.configure_filters(prefix, &handle);
        diagnostics::debug(format!("Parsed \"{}\" options.", name));
        Some(handle)
    }

    fn build_sink(&self, name: &str, prefix: &str, kind: &str) -> Result<AppenderRef> {
        match short_kind(kind) {
            "ConsoleAppender" => {
                let target = match self.option(prefix, "target") {
                    Some(target) => target.parse::<ConsoleTarget>()?,
                    None => ConsoleTarget::default(),
                };
                let console = ConsoleAppender::new()
                    .with_target(target)
                    .with_immediate_flush(self.bool_option(prefix, "immediateFlush", true));
                Ok(AppenderHandle::new(name, console))
            }
            "FileAppender" => {
                let path = self.required_file(name, prefix)?;
                let mut options = FileOptions::new()
                    .with_append(self.bool_option(prefix, "append", true))
                    .with_immediate_flush(self.bool_option(prefix, "immediateFlush", true))
                    .with_buffered_io(self.bool_option(prefix, "bufferedIO", false));
                if let Some(size) = self.option(prefix, "bufferSize").and_then(|v| parse_usize(prefix, &v)) {
                    options = options.with_buffer_size(size);
                }
                Ok(AppenderHandle::new(name, FileAppender::with_options(path, options)?))
            }
            "DailyRollingFileAppender" => {
                let path = self.required_file(name, prefix)?;
                let mut policy = RollingPolicy::new()
                    .with_append(self.bool_option(prefix, "append", true))
                    .with_immediate_flush(self.bool_option(prefix, "immediateFlush", true))
                    .with_buffered_io(self.bool_option(prefix, "bufferedIO", false));
                if let Some(pattern) = self.option(prefix, "datePattern") {
                    policy = policy.with_date_pattern(pattern);
                }
                if let Some(count) = self
                    .option(prefix, "maxBackupIndex")
                    .and_then(|v| parse_usize(prefix, &v))
                {
                    policy = policy.with_max_backup_count(count);
                }
                Ok(AppenderHandle::new(
                    name,
                    DailyRollingFileAppender::with_policy(path, policy)?,
                ))
            }
            other => Err(LoggerError::config(
                "Configurator",
                format!("Unknown appender kind [{}]", other),
            )),
        }
    }

    fn required_file(&self, name: &str, prefix: &str) -> Result<String> {
        self.option(prefix, "file")
            .filter(|f| !f.is_empty())
            .ok_or_else(|| {
                LoggerError::config(
                    "Configurator",
                    format!("File option not set for appender [{}].", name),
                )
            })
    }

    fn configure_error_handler(&mut self, name: &str, prefix: &str, handle: &AppenderRef) {
        let handler_prefix = format!("{}.errorhandler", prefix);
        let Some(kind) = self.value(&handler_prefix) else {
            return;
        };
        let mut handler: Box<dyn ErrorHandler> = match short_kind(kind.trim()) {
            "FallbackErrorHandler" => Box::new(FallbackErrorHandler::new()),
            "OnlyOnceErrorHandler" => Box::new(OnlyOnceErrorHandler::new()),
            other => {
                diagnostics::error(format!("Unknown error handler [{}] for appender [{}]", other, name));
                return;
            }
        };
        if let Some(backup_name) = self.option(&handler_prefix, "appender-ref") {
            if let Some(backup) = self.appender(&backup_name) {
                handler.set_backup_appender(backup);
            }
        }
        handle.set_error_handler(handler);
    }

    /// Filters are `<prefix>.filter.<id>` keys applied in sorted id order
    fn configure_filters(&self, prefix: &str, handle: &AppenderRef) {
        let filter_prefix = format!("{}.filter.", prefix);
        let ids: BTreeSet<&str> = self
            .props
            .keys()
            .filter_map(|key| key.strip_prefix(filter_prefix.as_str()))
            .map(|rest| rest.split('.').next().unwrap_or(rest))
            .filter(|id| !id.is_empty())
            .collect();

        for id in ids {
            let key = format!("{}{}", filter_prefix, id);
            let Some(kind) = self.value(&key) else {
                diagnostics::warn(format!("Missing class definition for filter: {}", key));
                continue;
            };
            diagnostics::debug(format!("Adding filter of type [{}] with id [{}].", kind.trim(), id));
            if let Some(filter) = self.build_filter(&key, kind.trim()) {
                handle.add_boxed_filter(filter);
            }
        }
    }

    fn build_filter(&self, prefix: &str, kind: &str) -> Option<Box<dyn Filter>> {
        let accept = self.option(prefix, "acceptOnMatch").map(|v| to_bool(&v, true));
        match short_kind(kind) {
            "DenyAllFilter" => Some(Box::new(DenyAllFilter)),
            "LevelRangeFilter" => {
                let filter = LevelRangeFilter::new(
                    self.level_option(prefix, "levelMin"),
                    self.level_option(prefix, "levelMax"),
                );
                Some(Box::new(match accept {
                    Some(accept) => filter.with_accept_on_match(accept),
                    None => filter,
                }))
            }
            "LevelMatchFilter" => {
                let Some(level) = self.level_option(prefix, "levelToMatch") else {
                    diagnostics::error(format!("{}.levelToMatch is required", prefix));
                    return None;
                };
                let filter = LevelMatchFilter::new(level);
                Some(Box::new(match accept {
                    Some(accept) => filter.with_accept_on_match(accept),
                    None => filter,
                }))
            }
            "StringMatchFilter" => {
                let Some(needle) = self.option(prefix, "stringToMatch") else {
                    diagnostics::error(format!("{}.stringToMatch is required", prefix));
                    return None;
                };
                let filter = StringMatchFilter::new(needle);
                Some(Box::new(match accept {
                    Some(accept) => filter.with_accept_on_match(accept),
                    None => filter,
                }))
            }
            other => {
                diagnostics::error(format!("Unknown filter [{}]", other));
                None
            }
        }
    }
}

/// Level first, then replace the logger's appenders with `appenders`
fn apply_logger_settings(
    logger: &Logger,
    level: Option<&str>,
    appenders: Vec<AppenderRef>,
    registered: &HashMap<String, AppenderRef>,
) {
    if let Some(token) = level.map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<LevelSpec>() {
            Ok(LevelSpec::Inherited) if logger.is_root() => {
                diagnostics::warn("The root logger cannot be set to null.");
            }
            Ok(LevelSpec::Custom { level, class_name }) => {
                diagnostics::warn(format!(
                    "Custom level class [{}] is not supported; using {}",
                    class_name, level
                ));
                logger.set_level(Some(level));
            }
            Ok(spec) => {
                logger.set_level(spec.level());
                diagnostics::debug(format!(
                    "Logger {} set to {}",
                    logger.name(),
                    spec.level().map_or(INHERITED, |l| l.to_str())
                ));
            }
            Err(e) => diagnostics::error(format!("Could not set level of [{}]: {}", logger.name(), e)),
        }
    }

    let replaced = logger.remove_all_appenders();
    for appender in appenders {
        logger.add_appender(appender);
    }
    close_detached(logger, replaced, registered);
}

/// Close replaced appenders that no logger and no registration still holds
fn close_detached(logger: &Logger, replaced: Vec<AppenderRef>, registered: &HashMap<String, AppenderRef>) {
    if replaced.is_empty() {
        return;
    }
    let hierarchy = logger.hierarchy();
    let mut holders = hierarchy.current_loggers();
    holders.push(hierarchy.root_logger());

    for appender in replaced {
        let still_registered = registered.values().any(|r| Arc::ptr_eq(r, &appender));
        let still_attached = holders
            .iter()
            .any(|l| l.appenders().iter().any(|a| Arc::ptr_eq(a, &appender)));
        if !still_registered && !still_attached {
            diagnostics::debug(format!("Closing replaced appender [{}].", appender.name()));
            appender.close();
        }
    }
}

/// Last dotted segment, so qualified class names select the same kind
fn short_kind(kind: &str) -> &str {
    kind.rsplit('.').next().unwrap_or(kind)
}

fn to_bool(value: &str, default: bool) -> bool {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        true
    } else if value.eq_ignore_ascii_case("false") {
        false
    } else {
        default
    }
}

fn parse_usize(key: &str, value: &str) -> Option<usize> {
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            diagnostics::error(format!("[{}] is not a valid number for {}", value, key));
            None
        }
    }
}

/// Replace `${name}` with the value of key `name`, or else of the
/// environment variable `name`. Unknown names become empty.
fn substitute_vars(value: &str, props: &Properties, depth: usize) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            diagnostics::error(format!(
                "\"{}\" has no closing brace. Opening brace at position {}.",
                value,
                value.len() - rest.len() + start
            ));
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        let replacement = props
            .get(name)
            .cloned()
            .or_else(|| env::var(name).ok())
            .unwrap_or_default();
        if depth < MAX_SUBSTITUTION_DEPTH {
            out.push_str(&substitute_vars(&replacement, props, depth + 1));
        } else {
            diagnostics::warn(format!("Substitution of [{}] nested too deeply", name));
            out.push_str(&replacement);
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
