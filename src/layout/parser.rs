//! Conversion pattern compiler
//!
//! A single left-to-right scan turns a pattern such as `%-5p [%t] %c{2} - %m%n`
//! into a chain of [`PatternConverter`]s. Malformed input never fails the
//! compile: problems are collected as errors and the offending text is kept
//! as a literal.

use super::converter::{ConverterKind, LocationField, PatternConverter};
use super::date_format::DateFormat;
use super::formatting_info::FormattingInfo;
use super::LINE_SEPARATOR;
use crate::core::error::LoggerError;

const ESCAPE_CHAR: char = '%';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Literal,
    Converter,
    Min,
    Dot,
    Max,
}

/// Converter chain plus the problems found while compiling it
#[derive(Debug, Default)]
pub struct ParseOutput {
    pub converters: Vec<PatternConverter>,
    pub errors: Vec<LoggerError>,
}

pub struct PatternParser {
    pattern: Vec<char>,
    i: usize,
    state: State,
    current_literal: String,
    info: FormattingInfo,
    output: ParseOutput,
}

impl PatternParser {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.chars().collect(),
            i: 0,
            state: State::Literal,
            current_literal: String::with_capacity(32),
            info: FormattingInfo::default(),
            output: ParseOutput::default(),
        }
    }

    pub fn parse(mut self) -> ParseOutput {
        let len = self.pattern.len();
        while self.i < len {
            let c = self.pattern[self.i];
            self.i += 1;
            match self.state {
                State::Literal => {
                    // a trailing '%' is literal text
                    if self.i == len {
                        self.current_literal.push(c);
                        continue;
                    }
                    if c != ESCAPE_CHAR {
                        self.current_literal.push(c);
                        continue;
                    }
                    match self.pattern[self.i] {
                        ESCAPE_CHAR => {
                            self.current_literal.push(c);
                            self.i += 1;
                        }
                        'n' => {
                            self.current_literal.push_str(LINE_SEPARATOR);
                            self.i += 1;
                        }
                        _ => {
                            self.flush_literal();
                            self.current_literal.push(c);
                            self.state = State::Converter;
                            self.info = FormattingInfo::default();
                        }
                    }
                }
                State::Converter => {
                    self.current_literal.push(c);
                    match c {
                        '-' => self.info.left_align = true,
                        '.' => self.state = State::Dot,
                        _ => match c.to_digit(10) {
                            Some(digit) => {
                                self.info.min = digit as usize;
                                self.state = State::Min;
                            }
                            None => self.finalize_converter(c),
                        },
                    }
                }
                State::Min => {
                    self.current_literal.push(c);
                    match c.to_digit(10) {
                        Some(digit) => {
                            self.info.min = self.info.min.saturating_mul(10).saturating_add(digit as usize);
                        }
                        None if c == '.' => self.state = State::Dot,
                        None => self.finalize_converter(c),
                    }
                }
                State::Dot => {
                    self.current_literal.push(c);
                    match c.to_digit(10) {
                        Some(digit) => {
                            self.info.max = digit as usize;
                            self.state = State::Max;
                        }
                        None => {
                            self.output.errors.push(LoggerError::pattern(
                                self.i,
                                format!("was expecting digit, instead got char '{}'", c),
                            ));
                            self.state = State::Literal;
                        }
                    }
                }
                State::Max => {
                    self.current_literal.push(c);
                    match c.to_digit(10) {
                        Some(digit) => {
                            self.info.max = self.info.max.saturating_mul(10).saturating_add(digit as usize);
                        }
                        None => {
                            self.finalize_converter(c);
                            self.state = State::Literal;
                        }
                    }
                }
            }
        }
        self.flush_literal();
        self.output
    }

    fn flush_literal(&mut self) {
        if !self.current_literal.is_empty() {
            let text = std::mem::take(&mut self.current_literal);
            self.output.converters.push(PatternConverter::literal(text));
        }
    }

    /// Text inside `{...}` directly after the conversion character
    fn extract_option(&mut self) -> Option<String> {
        if self.pattern.get(self.i) != Some(&'{') {
            return None;
        }
        let close = self.pattern[self.i..].iter().position(|&c| c == '}')?;
        let option: String = self.pattern[self.i + 1..self.i + close].iter().collect();
        self.i += close + 1;
        Some(option)
    }

    /// `{N}` for `%c` and `%C`; zero means no truncation
    fn extract_precision_option(&mut self) -> usize {
        let Some(option) = self.extract_option() else {
            return 0;
        };
        match option.trim().parse::<i64>() {
            Ok(value) if value > 0 => usize::try_from(value).unwrap_or(usize::MAX),
            Ok(_) => {
                self.output.errors.push(LoggerError::pattern(
                    self.i,
                    format!("precision option ({}) isn't a positive integer", option),
                ));
                0
            }
            Err(_) => {
                self.output.errors.push(LoggerError::pattern(
                    self.i,
                    format!("category option \"{}\" not a decimal integer", option),
                ));
                0
            }
        }
    }

    fn finalize_converter(&mut self, c: char) {
        let kind = match c {
            'c' => ConverterKind::LoggerName {
                precision: self.extract_precision_option(),
            },
            'C' => ConverterKind::ClassName {
                precision: self.extract_precision_option(),
            },
            'd' => {
                let option = self.extract_option();
                match DateFormat::from_option(option.as_deref()) {
                    Ok(format) => ConverterKind::Date(format),
                    Err(e) => {
                        self.output.errors.push(e);
                        ConverterKind::Date(DateFormat::Iso8601)
                    }
                }
            }
            'F' => ConverterKind::Location(LocationField::File),
            'l' => ConverterKind::Location(LocationField::Full),
            'L' => ConverterKind::Location(LocationField::Line),
            'm' => ConverterKind::Message,
            'M' => ConverterKind::Location(LocationField::Method),
            'p' => ConverterKind::Level,
            'r' => ConverterKind::RelativeTime,
            't' => ConverterKind::Thread,
            'x' => ConverterKind::Ndc,
            'X' => ConverterKind::Mdc(self.extract_option()),
            _ => {
                self.output.errors.push(LoggerError::pattern(
                    self.i,
                    format!("unexpected char [{}] in conversion pattern", c),
                ));
                let text = std::mem::take(&mut self.current_literal);
                self.add_converter(PatternConverter::literal(text));
                return;
            }
        };
        self.add_converter(PatternConverter::new(self.info, kind));
    }

    fn add_converter(&mut self, converter: PatternConverter) {
        self.current_literal.clear();
        self.output.converters.push(converter);
        self.state = State::Literal;
        self.info = FormattingInfo::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pattern: &str) -> ParseOutput {
        PatternParser::new(pattern).parse()
    }

    fn kinds(pattern: &str) -> Vec<ConverterKind> {
        parse(pattern).converters.into_iter().map(|c| c.kind).collect()
    }

    fn literal(text: &str) -> ConverterKind {
        ConverterKind::Literal(text.to_string())
    }

    #[test]
    fn test_escapes_and_newline() {
        assert_eq!(
            kinds("100%% done%n"),
            vec![literal(&format!("100% done{}", LINE_SEPARATOR))]
        );
    }

    #[test]
    fn test_trailing_percent_is_literal() {
        assert_eq!(kinds("abc%"), vec![literal("abc%")]);
    }

    #[test]
    fn test_width_and_alignment() {
        let output = parse("%-10.5c - %m");
        assert!(output.errors.is_empty());
        assert_eq!(output.converters.len(), 3);
        assert_eq!(output.converters[0].info, FormattingInfo::new(10, 5, true));
        assert_eq!(output.converters[0].kind, ConverterKind::LoggerName { precision: 0 });
        assert_eq!(output.converters[1].kind, literal(" - "));
        assert_eq!(output.converters[2].kind, ConverterKind::Message);
    }

    #[test]
    fn test_precision_option() {
        assert_eq!(kinds("%c{2}"), vec![ConverterKind::LoggerName { precision: 2 }]);

        let zero = parse("%c{0}");
        assert_eq!(zero.converters[0].kind, ConverterKind::LoggerName { precision: 0 });
        assert_eq!(zero.errors.len(), 1);

        let word = parse("%C{two}");
        assert_eq!(word.converters[0].kind, ConverterKind::ClassName { precision: 0 });
        assert_eq!(word.errors.len(), 1);
    }

    #[test]
    fn test_unterminated_option_is_ignored() {
        let output = parse("%c{2");
        assert_eq!(output.converters[0].kind, ConverterKind::LoggerName { precision: 0 });
        assert_eq!(output.converters[1].kind, literal("{2"));
    }

    #[test]
    fn test_dot_without_digit_keeps_raw_text() {
        let output = parse("%.x end");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(kinds("%.x end"), vec![literal("%.x end")]);
    }

    #[test]
    fn test_unknown_conversion_char() {
        let output = parse("a %5q b");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(
            output.converters.into_iter().map(|c| c.kind).collect::<Vec<_>>(),
            vec![literal("a "), literal("%5q"), literal(" b")]
        );
    }

    #[test]
    fn test_date_options() {
        assert_eq!(kinds("%d"), vec![ConverterKind::Date(DateFormat::Iso8601)]);
        assert_eq!(kinds("%d{ABSOLUTE}"), vec![ConverterKind::Date(DateFormat::Absolute)]);

        let invalid = parse("%d{yyyy-qq}");
        assert_eq!(invalid.errors.len(), 1);
        assert_eq!(invalid.converters[0].kind, ConverterKind::Date(DateFormat::Iso8601));
    }

    #[test]
    fn test_all_conversion_chars() {
        let output = parse("%C%d%F%l%L%m%M%p%r%t%x%X%X{k}%c");
        assert!(output.errors.is_empty());
        assert_eq!(output.converters.len(), 14);
        assert_eq!(output.converters[12].kind, ConverterKind::Mdc(Some("k".into())));
    }

    #[test]
    fn test_incomplete_converter_at_end() {
        assert_eq!(kinds("x %-"), vec![literal("x "), literal("%-")]);
    }
}
