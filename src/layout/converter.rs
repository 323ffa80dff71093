//! Typed converters produced by the pattern parser

use super::date_format::DateFormat;
use super::formatting_info::FormattingInfo;
use crate::core::log_event::LogEvent;
use chrono::Local;
use std::borrow::Cow;

/// Placeholder rendered when an event carries no source location
pub const LOCATION_NOT_AVAILABLE: &str = "?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationField {
    /// `class.method(file:line)`
    Full,
    Method,
    Line,
    File,
}

/// The field a converter extracts from an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConverterKind {
    /// Fixed text, emitted without padding
    Literal(String),
    /// `%c`; a non-zero precision keeps the rightmost N dotted segments
    LoggerName { precision: usize },
    /// `%C`; same truncation as the logger name
    ClassName { precision: usize },
    Date(DateFormat),
    /// Milliseconds since the logging runtime started
    RelativeTime,
    Thread,
    Level,
    Message,
    Ndc,
    Location(LocationField),
    /// `%X{key}` for one entry, `%X` for all entries sorted by key
    Mdc(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternConverter {
    pub info: FormattingInfo,
    pub kind: ConverterKind,
}

impl PatternConverter {
    pub fn new(info: FormattingInfo, kind: ConverterKind) -> Self {
        Self { info, kind }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            info: FormattingInfo::default(),
            kind: ConverterKind::Literal(text.into()),
        }
    }

    /// Append this converter's rendering of `event` to `out`
    pub fn format(&self, out: &mut String, event: &LogEvent) {
        if let ConverterKind::Literal(text) = &self.kind {
            out.push_str(text);
            return;
        }
        let value = self.convert(event);
        self.info.write_padded(out, value.as_deref());
    }

    fn convert<'e>(&self, event: &'e LogEvent) -> Option<Cow<'e, str>> {
        match &self.kind {
            ConverterKind::Literal(text) => Some(Cow::Owned(text.clone())),
            ConverterKind::LoggerName { precision } => {
                Some(Cow::Borrowed(abbreviate(&event.logger_name, *precision)))
            }
            ConverterKind::ClassName { precision } => event
                .location
                .as_ref()
                .map(|location| Cow::Borrowed(abbreviate(&location.class_name, *precision))),
            ConverterKind::Date(format) => {
                let mut text = String::with_capacity(24);
                format.write(&mut text, &event.timestamp.with_timezone(&Local));
                Some(Cow::Owned(text))
            }
            ConverterKind::RelativeTime => Some(Cow::Owned(event.relative_millis().to_string())),
            ConverterKind::Thread => Some(Cow::Borrowed(&event.thread_name)),
            ConverterKind::Level => Some(Cow::Borrowed(event.level.to_str())),
            ConverterKind::Message => Some(Cow::Borrowed(&event.message)),
            ConverterKind::Ndc => event.ndc.as_deref().map(Cow::Borrowed),
            ConverterKind::Location(field) => Some(match (&event.location, field) {
                (None, _) => Cow::Borrowed(LOCATION_NOT_AVAILABLE),
                (Some(location), LocationField::Full) => Cow::Owned(location.full_info()),
                (Some(location), LocationField::Method) => Cow::Borrowed(&location.method_name),
                (Some(location), LocationField::Line) => Cow::Owned(location.line.to_string()),
                (Some(location), LocationField::File) => Cow::Borrowed(&location.file_name),
            }),
            ConverterKind::Mdc(Some(key)) => event
                .context
                .get(key)
                .map(|value| Cow::Owned(value.to_string())),
            ConverterKind::Mdc(None) => {
                let mut text = String::from("{");
                for (key, value) in event.context.sorted_entries() {
                    text.push('{');
                    text.push_str(key);
                    text.push(',');
                    text.push_str(&value.to_string());
                    text.push('}');
                }
                text.push('}');
                Some(Cow::Owned(text))
            }
        }
    }
}

/// Keep the rightmost `precision` dot-separated segments of `name`.
/// Zero, or a name with fewer segments, yields the whole name.
pub fn abbreviate(name: &str, precision: usize) -> &str {
    if precision == 0 {
        return name;
    }
    let mut end = name.len();
    for _ in 0..precision {
        match name[..end].rfind('.') {
            Some(dot) => end = dot,
            None => return name,
        }
    }
    &name[end + 1..]
}
