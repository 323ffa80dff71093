//! Width and alignment of a single converter

/// Minimum width, maximum width and alignment parsed from `%-10.5c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattingInfo {
    pub min: usize,
    pub max: usize,
    pub left_align: bool,
}

impl Default for FormattingInfo {
    fn default() -> Self {
        Self {
            min: 0,
            max: usize::MAX,
            left_align: false,
        }
    }
}

impl FormattingInfo {
    pub fn new(min: usize, max: usize, left_align: bool) -> Self {
        Self {
            min,
            max,
            left_align,
        }
    }

    /// `true` when applying this info can never change a value
    pub fn is_identity(&self) -> bool {
        self.min == 0 && self.max == usize::MAX
    }

    /// Append `value` to `out` with truncation and padding applied.
    ///
    /// A missing value yields `min` spaces. A value longer than `max`
    /// characters keeps its rightmost `max` characters, which are then
    /// padded to `min` like any other value.
    pub fn write_padded(&self, out: &mut String, value: Option<&str>) {
        let Some(value) = value else {
            pad(out, self.min);
            return;
        };

        if self.is_identity() {
            out.push_str(value);
            return;
        }

        let mut len = value.chars().count();
        let mut value = value;
        if len > self.max {
            let skip = len - self.max;
            if let Some((start, _)) = value.char_indices().nth(skip) {
                value = &value[start..];
            }
            len = self.max;
        }

        if len < self.min {
            if self.left_align {
                out.push_str(value);
                pad(out, self.min - len);
            } else {
                pad(out, self.min - len);
                out.push_str(value);
            }
        } else {
            out.push_str(value);
        }
    }
}

fn pad(out: &mut String, count: usize) {
    out.extend(std::iter::repeat(' ').take(count));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(info: FormattingInfo, value: Option<&str>) -> String {
        let mut out = String::new();
        info.write_padded(&mut out, value);
        out
    }

    #[test]
    fn test_truncates_from_the_left() {
        let info = FormattingInfo::new(0, 5, false);
        assert_eq!(render(info, Some("verylongname")), "gname");
    }

    #[test]
    fn test_pads_by_alignment() {
        assert_eq!(render(FormattingInfo::new(6, usize::MAX, false), Some("abc")), "   abc");
        assert_eq!(render(FormattingInfo::new(6, usize::MAX, true), Some("abc")), "abc   ");
    }

    #[test]
    fn test_truncated_value_is_still_padded() {
        let info = FormattingInfo::new(10, 5, true);
        assert_eq!(render(info, Some("a.b.verylongname")), "gname     ");
        let info = FormattingInfo::new(8, 3, false);
        assert_eq!(render(info, Some("abcdef")), "     def");
    }

    #[test]
    fn test_missing_value_is_min_spaces() {
        assert_eq!(render(FormattingInfo::new(4, 2, true), None), "    ");
        assert_eq!(render(FormattingInfo::default(), None), "");
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let info = FormattingInfo::new(0, 2, false);
        assert_eq!(render(info, Some("äöü")), "öü");
    }
}
