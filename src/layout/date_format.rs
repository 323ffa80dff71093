//! Date rendering for `%d` and rolling file names
//!
//! Three named formats are supported (`ISO8601`, `ABSOLUTE`, `DATE`) plus
//! custom patterns written in the `yyyy-MM-dd HH:mm:ss,SSS` letter syntax,
//! where quoted text is literal and `''` is a single quote. Custom patterns
//! compile to chrono format items, so they can also be parsed back, which
//! the rolling appender uses to date its backup files.

use crate::core::error::{LoggerError, Result};
use chrono::format::{self, Item, Parsed, StrftimeItems};
use chrono::{DateTime, NaiveDateTime, TimeZone, Weekday};
use std::fmt::{self, Display, Write};

pub const ISO8601_NAME: &str = "ISO8601";
pub const ABSOLUTE_NAME: &str = "ABSOLUTE";
pub const DATE_NAME: &str = "DATE";

/// Date format selected by a `%d{...}` option
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// `yyyy-MM-dd HH:mm:ss,SSS`
    #[default]
    Iso8601,
    /// `HH:mm:ss,SSS`
    Absolute,
    /// `dd MMM yyyy HH:mm:ss,SSS`
    DateAndTime,
    Pattern(DatePattern),
}

impl DateFormat {
    /// Resolve a `%d` option. Named formats match case-insensitively;
    /// anything else is compiled as a custom pattern.
    pub fn from_option(option: Option<&str>) -> Result<Self> {
        let Some(option) = option else {
            return Ok(DateFormat::Iso8601);
        };
        if option.eq_ignore_ascii_case(ISO8601_NAME) {
            Ok(DateFormat::Iso8601)
        } else if option.eq_ignore_ascii_case(ABSOLUTE_NAME) {
            Ok(DateFormat::Absolute)
        } else if option.eq_ignore_ascii_case(DATE_NAME) {
            Ok(DateFormat::DateAndTime)
        } else {
            DatePattern::compile(option).map(DateFormat::Pattern)
        }
    }

    pub fn write<Tz: TimeZone>(&self, out: &mut String, datetime: &DateTime<Tz>)
    where
        Tz::Offset: Display,
    {
        // writing into a String cannot fail
        let _ = match self {
            DateFormat::Iso8601 => write!(out, "{}", datetime.format("%Y-%m-%d %H:%M:%S,%3f")),
            DateFormat::Absolute => write!(out, "{}", datetime.format("%H:%M:%S,%3f")),
            DateFormat::DateAndTime => {
                write!(out, "{}", datetime.format("%d %b %Y %H:%M:%S,%3f"))
            }
            DateFormat::Pattern(pattern) => {
                pattern.write(out, datetime);
                Ok(())
            }
        };
    }
}

/// Which date fields a pattern carries, used to fill defaults on parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Fields {
    year: bool,
    month: bool,
    day: bool,
    ordinal: bool,
    week: bool,
}

/// Compiled custom date pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    items: Vec<Item<'static>>,
    fields: Fields,
}

impl DatePattern {
    pub fn compile(pattern: &str) -> Result<Self> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut items: Vec<Item<'static>> = Vec::new();
        let mut literal = String::new();
        let mut fields = Fields::default();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == '\'' {
                if chars.get(i + 1) == Some(&'\'') {
                    literal.push('\'');
                    i += 2;
                    continue;
                }
                i += 1;
                let mut closed = false;
                while i < chars.len() {
                    if chars[i] == '\'' {
                        if chars.get(i + 1) == Some(&'\'') {
                            literal.push('\'');
                            i += 2;
                            continue;
                        }
                        closed = true;
                        i += 1;
                        break;
                    }
                    literal.push(chars[i]);
                    i += 1;
                }
                if !closed {
                    return Err(LoggerError::date_pattern(pattern, "unterminated quote"));
                }
            } else if c.is_ascii_alphabetic() {
                let start = i;
                while i < chars.len() && chars[i] == c {
                    i += 1;
                }
                let directive = strftime_for(c, i - start).ok_or_else(|| {
                    LoggerError::date_pattern(pattern, format!("illegal pattern character '{}'", c))
                })?;
                match c {
                    'y' | 'Y' => fields.year = true,
                    'M' => fields.month = true,
                    'd' => fields.day = true,
                    'D' => fields.ordinal = true,
                    'w' => fields.week = true,
                    _ => {}
                }
                flush_literal(&mut items, &mut literal);
                items.extend(StrftimeItems::new(directive));
            } else {
                literal.push(c);
                i += 1;
            }
        }
        flush_literal(&mut items, &mut literal);

        Ok(Self {
            source: pattern.to_string(),
            items,
            fields,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn format<Tz: TimeZone>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz::Offset: Display,
    {
        let mut out = String::with_capacity(self.source.len() + 8);
        self.write(&mut out, datetime);
        out
    }

    pub fn write<Tz: TimeZone>(&self, out: &mut String, datetime: &DateTime<Tz>)
    where
        Tz::Offset: Display,
    {
        let _ = write!(out, "{}", datetime.format_with_items(self.items.iter()));
    }

    /// Parse text produced by this pattern. The whole input must be
    /// consumed; fields the pattern lacks default to 1970-01-01 00:00.
    /// Offsets in the input are accepted but not applied.
    pub fn parse(&self, input: &str) -> Result<NaiveDateTime> {
        let mut parsed = Parsed::new();
        format::parse(&mut parsed, input, self.items.iter())
            .map_err(|e| LoggerError::date_pattern(&self.source, format!("'{}': {}", input, e)))?;

        // setters refuse to overwrite a parsed value, so failures are expected
        let _ = parsed.set_ampm(false);
        let _ = parsed.set_hour12(12);
        let _ = parsed.set_minute(0);
        if self.fields.week && !self.fields.day && !self.fields.ordinal {
            let _ = parsed.set_weekday(Weekday::Mon);
        } else {
            if !self.fields.year {
                let _ = parsed.set_year(1970);
            }
            if !self.fields.ordinal || self.fields.month {
                let _ = parsed.set_month(1);
                let _ = parsed.set_day(1);
            }
        }

        parsed
            .to_naive_datetime_with_offset(0)
            .map_err(|e| LoggerError::date_pattern(&self.source, format!("'{}': {}", input, e)))
    }
}

impl Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn flush_literal(items: &mut Vec<Item<'static>>, literal: &mut String) {
    if !literal.is_empty() {
        items.push(Item::OwnedLiteral(std::mem::take(literal).into_boxed_str()));
    }
}

/// strftime equivalent of a run of `count` pattern letters
fn strftime_for(letter: char, count: usize) -> Option<&'static str> {
    let padded = count >= 2;
    let directive = match letter {
        'y' if count == 2 => "%y",
        'y' => "%Y",
        'Y' if count == 2 => "%g",
        'Y' => "%G",
        'M' => match count {
            1 => "%-m",
            2 => "%m",
            3 => "%b",
            _ => "%B",
        },
        'w' if padded => "%V",
        'w' => "%-V",
        'D' if padded => "%j",
        'D' => "%-j",
        'd' if padded => "%d",
        'd' => "%-d",
        'E' if count >= 4 => "%A",
        'E' => "%a",
        'u' => "%u",
        'a' => "%p",
        'H' if padded => "%H",
        'H' => "%-H",
        'h' if padded => "%I",
        'h' => "%-I",
        'm' if padded => "%M",
        'm' => "%-M",
        's' if padded => "%S",
        's' => "%-S",
        'S' => "%3f",
        'z' => "%:z",
        'Z' => "%z",
        _ => return None,
    };
    Some(directive)
}
