use crate::config::Formatting;
use crate::error::Result;
use crate::highlight::{Highlighter, PlainHighlighter};
use crate::language::Language;
use crate::types::LineEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::BufRead;
use std::ops::{Bound, RangeBounds};
use std::path::Path;

/// Ordered, line-number-preserving view over source text
///
/// Every windowing and formatting method returns a new buffer; the receiver
/// is never modified. Line numbers are fixed when an entry is created, so a
/// window cut out of a file still reports the file's numbering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeBuffer {
    entries: Vec<LineEntry>,
    kind: Language,
    formatting: Formatting,
}

impl CodeBuffer {
    /// Empty buffer for the given language
    #[must_use]
    pub fn new(kind: Language) -> Self {
        Self {
            entries: Vec::new(),
            kind,
            formatting: Formatting::default(),
        }
    }

    /// Split text into lines numbered from `start_line`
    #[must_use]
    pub fn from_text(text: &str, start_line: usize, kind: Language) -> Self {
        Self::from_lines(text.lines(), start_line, kind)
    }

    /// Number an ordered sequence of lines from `start_line`
    pub fn from_lines<I, S>(lines: I, start_line: usize, kind: Language) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = lines
            .into_iter()
            .enumerate()
            .map(|(idx, line)| {
                let line: String = line.into();
                let text = line.trim_end_matches(['\n', '\r']).to_string();
                LineEntry::new(text, start_line + idx)
            })
            .collect();

        Self {
            entries,
            kind,
            formatting: Formatting::default(),
        }
    }

    /// Read every line of a stream
    pub fn from_reader(reader: impl BufRead, start_line: usize, kind: Language) -> Result<Self> {
        let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self::from_lines(lines, start_line, kind))
    }

    /// Read a whole file, detecting the language from its extension when `kind` is `None`
    pub fn from_file(path: impl AsRef<Path>, kind: Option<Language>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let kind = kind.unwrap_or_else(|| Language::from_path(path));
        Ok(Self::from_text(&content, 1, kind))
    }

    /// Build a buffer from entries that already carry their numbers
    pub fn from_entries(entries: Vec<LineEntry>, kind: Language) -> Self {
        Self {
            entries,
            kind,
            formatting: Formatting::default(),
        }
    }

    /// Append a line; without an explicit number it follows the last entry
    pub fn push(&mut self, text: impl Into<String>, line_number: Option<usize>) {
        let line_number = line_number.unwrap_or_else(|| {
            self.entries
                .last()
                .map_or(1, |entry| entry.line_number + 1)
        });
        self.entries.push(LineEntry::new(text, line_number));
    }

    fn with_entries(&self, entries: Vec<LineEntry>) -> Self {
        Self {
            entries,
            kind: self.kind,
            formatting: self.formatting,
        }
    }

    /// Keep the entries accepted by `predicate(text, line_number)`
    pub fn select<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&str, usize) -> bool,
    {
        let entries = self
            .entries
            .iter()
            .filter(|entry| predicate(&entry.text, entry.line_number))
            .cloned()
            .collect();
        self.with_entries(entries)
    }

    /// Contiguous window between two line numbers (inclusive)
    ///
    /// Negative bounds index from the end of the stored entries. The window
    /// ends just before the first entry numbered above `end`; when no entry
    /// is numbered above `end`, or the end falls before the start, the
    /// result is empty.
    pub fn between(&self, start: i64, end: i64) -> Self {
        let len = self.entries.len();
        let entries = match (self.find_start_index(start), self.find_end_index(end)) {
            (Some(first), Some(last)) if first <= last && first < len => {
                self.entries[first..=last.min(len - 1)].to_vec()
            }
            _ => Vec::new(),
        };
        self.with_entries(entries)
    }

    /// Window described by a range; an exclusive upper bound is decremented
    pub fn between_range<R: RangeBounds<i64>>(&self, range: R) -> Self {
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end,
            Bound::Excluded(&end) => end - 1,
            Bound::Unbounded => -1,
        };
        self.between(start, end)
    }

    fn find_start_index(&self, start: i64) -> Option<usize> {
        if start < 0 {
            return self.index_from_end(start);
        }
        Some(
            self.entries
                .iter()
                .position(|entry| to_signed(entry.line_number) >= start)
                .unwrap_or(self.entries.len()),
        )
    }

    fn find_end_index(&self, end: i64) -> Option<usize> {
        if end < 0 {
            return self.index_from_end(end);
        }
        self.entries
            .iter()
            .position(|entry| to_signed(entry.line_number) > end)
            .and_then(|idx| idx.checked_sub(1))
    }

    fn index_from_end(&self, offset: i64) -> Option<usize> {
        let idx = to_signed(self.entries.len()) + offset;
        usize::try_from(idx).ok()
    }

    /// `count` consecutive entries starting at the first entry numbered `start` or later
    ///
    /// A negative `start` indexes from the end of the buffer; a negative
    /// `count` walks backward and ends at the starting entry.
    pub fn take_lines(&self, start: i64, count: i64) -> Self {
        let len = self.entries.len();
        let start_idx = if start >= 0 {
            self.entries
                .iter()
                .position(|entry| to_signed(entry.line_number) >= start)
                .unwrap_or(len)
        } else {
            self.index_from_end(start).unwrap_or(0)
        };

        // Walking backward needs an entry to end at.
        if count < 0 && start_idx >= len {
            return self.with_entries(Vec::new());
        }

        let span = usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX);
        let range = if count >= 0 {
            start_idx..start_idx.saturating_add(span).min(len)
        } else {
            let end = (start_idx + 1).min(len);
            end.saturating_sub(span)..end
        };
        self.with_entries(self.entries[range].to_vec())
    }

    /// `context` lines before `line`, excluding it
    pub fn before(&self, line: impl Into<Option<usize>>, context: usize) -> Self {
        let Some(line) = line.into() else {
            return self.clone();
        };
        let (line, context) = (to_signed(line), to_signed(context));
        self.select(|_, number| {
            let number = to_signed(number);
            number >= line.saturating_sub(context) && number < line
        })
    }

    /// `context` lines on each side of `line`, including it
    pub fn around(&self, line: impl Into<Option<usize>>, context: usize) -> Self {
        let Some(line) = line.into() else {
            return self.clone();
        };
        let (line, context) = (to_signed(line), to_signed(context));
        self.select(|_, number| {
            let number = to_signed(number);
            number >= line.saturating_sub(context) && number <= line.saturating_add(context)
        })
    }

    /// `context` lines after `line`, excluding it
    pub fn after(&self, line: impl Into<Option<usize>>, context: usize) -> Self {
        let Some(line) = line.into() else {
            return self.clone();
        };
        let (line, context) = (to_signed(line), to_signed(context));
        self.select(|_, number| {
            let number = to_signed(number);
            number > line && number <= line.saturating_add(context)
        })
    }

    /// Keep the entries whose text matches `pattern`
    pub fn grep(&self, pattern: &Regex) -> Self {
        self.select(|text, _| pattern.is_match(text))
    }

    /// Toggle the line number column
    #[must_use]
    pub fn with_line_numbers(&self, enabled: bool) -> Self {
        self.with_formatting_unchecked(Formatting {
            line_numbers: enabled,
            ..self.formatting
        })
    }

    /// Mark one line with `=>`; `None` removes the marker
    #[must_use]
    pub fn with_marker(&self, line: impl Into<Option<usize>>) -> Self {
        self.with_formatting_unchecked(Formatting {
            marker: line.into(),
            ..self.formatting
        })
    }

    /// Indent every rendered line; `None` removes the indentation
    #[must_use]
    pub fn with_indentation(&self, spaces: impl Into<Option<usize>>) -> Self {
        self.with_formatting_unchecked(Formatting {
            indentation: spaces.into(),
            ..self.formatting
        })
    }

    /// Toggle highlighting of the raw text
    #[must_use]
    pub fn colorize(&self, enabled: bool) -> Self {
        self.with_formatting_unchecked(Formatting {
            colorize: enabled,
            ..self.formatting
        })
    }

    /// Display numbers counted from `base` instead of the stored numbers
    #[must_use]
    pub fn with_number_base(&self, base: impl Into<Option<usize>>) -> Self {
        self.with_formatting_unchecked(Formatting {
            number_base: base.into().map(|base| base.max(1)),
            ..self.formatting
        })
    }

    /// Replace the whole formatting block
    pub fn with_formatting(&self, formatting: Formatting) -> Result<Self> {
        formatting.validate()?;
        Ok(self.with_formatting_unchecked(formatting))
    }

    fn with_formatting_unchecked(&self, formatting: Formatting) -> Self {
        Self {
            entries: self.entries.clone(),
            kind: self.kind,
            formatting,
        }
    }

    /// Same entries, different language tag
    #[must_use]
    pub fn with_kind(&self, kind: Language) -> Self {
        Self {
            entries: self.entries.clone(),
            kind,
            formatting: self.formatting,
        }
    }

    fn display_number(&self, idx: usize, entry: &LineEntry) -> usize {
        self.formatting
            .number_base
            .map_or(entry.line_number, |base| base + idx)
    }

    /// Width of the widest number the line number column will show
    #[must_use]
    pub fn max_line_number_width(&self) -> usize {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| self.display_number(idx, entry).to_string().len())
            .max()
            .unwrap_or(0)
    }

    /// Render with the formatting flags, leaving colour untouched
    #[must_use]
    pub fn render(&self) -> String {
        self.render_with(&PlainHighlighter)
    }

    /// Render with the formatting flags, colouring through `highlighter`
    pub fn render_with(&self, highlighter: &dyn Highlighter) -> String {
        let formatting = self.formatting;
        let width = self.max_line_number_width();
        let mut out = String::new();

        for (idx, entry) in self.entries.iter().enumerate() {
            let mut line = if formatting.colorize {
                highlighter.highlight(&entry.text, self.kind)
            } else {
                entry.text.clone()
            };

            if formatting.line_numbers {
                let number = self.display_number(idx, entry);
                // Continuation lines of a multi-line entry line up under the text column.
                let continuation = format!("\n{}", " ".repeat(width + 2));
                line = format!("{number:>width$}: {}", line.replace('\n', &continuation));
            }

            if let Some(marker) = formatting.marker {
                line = if entry.line_number == marker {
                    format!(" => {line}")
                } else {
                    format!("    {line}")
                };
            }

            if let Some(spaces) = formatting.indentation {
                line = format!("{}{line}", " ".repeat(spaces));
            }

            out.push_str(&line);
            out.push('\n');
        }

        out
    }

    /// Entry texts, one per line, without any formatting
    #[must_use]
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.text);
            out.push('\n');
        }
        out
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[LineEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineEntry> {
        self.entries.iter()
    }

    /// Line number of the first entry, if any
    #[must_use]
    pub fn first_line_number(&self) -> Option<usize> {
        self.entries.first().map(|entry| entry.line_number)
    }

    /// Line number of the last entry, if any
    #[must_use]
    pub fn last_line_number(&self) -> Option<usize> {
        self.entries.last().map(|entry| entry.line_number)
    }

    #[must_use]
    pub const fn kind(&self) -> Language {
        self.kind
    }

    #[must_use]
    pub const fn formatting(&self) -> &Formatting {
        &self.formatting
    }
}

fn to_signed(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl PartialEq for CodeBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for CodeBuffer {}

impl PartialEq<str> for CodeBuffer {
    fn eq(&self, other: &str) -> bool {
        self.render().trim_end_matches('\n') == other.trim_end_matches('\n')
    }
}

impl PartialEq<&str> for CodeBuffer {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<String> for CodeBuffer {
    fn eq(&self, other: &String) -> bool {
        self == other.as_str()
    }
}

impl fmt::Display for CodeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<'a> IntoIterator for &'a CodeBuffer {
    type Item = &'a LineEntry;
    type IntoIter = std::slice::Iter<'a, LineEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbers(buffer: &CodeBuffer) -> Vec<usize> {
        buffer.iter().map(|entry| entry.line_number).collect()
    }

    fn twenty_lines() -> CodeBuffer {
        CodeBuffer::from_lines((1..=20).map(|n| format!("line {n}")), 1, Language::Ruby)
    }

    #[test]
    fn test_from_text_numbers_from_start_line() {
        let buffer = CodeBuffer::from_text("def foo\n  1\nend\n", 10, Language::Ruby);
        assert_eq!(buffer.len(), 3);
        assert_eq!(numbers(&buffer), vec![10, 11, 12]);
        assert_eq!(buffer.entries()[1].text, "  1");
    }

    #[test]
    fn test_from_lines_strips_newlines() {
        let buffer = CodeBuffer::from_lines(["a\n", "b\r\n"], 1, Language::Ruby);
        assert_eq!(buffer.raw_text(), "a\nb\n");
    }

    #[test]
    fn test_push_continues_numbering() {
        let mut buffer = CodeBuffer::new(Language::Ruby);
        buffer.push("first", None);
        buffer.push("jump", Some(40));
        buffer.push("next", None);
        assert_eq!(numbers(&buffer), vec![1, 40, 41]);
    }

    #[test]
    fn test_between_single_line() {
        let buffer = CodeBuffer::from_lines(["def foo", "  1", "end"], 10, Language::Ruby);
        assert_eq!(buffer.between(11, 11).raw_text(), "  1\n");
    }

    #[test]
    fn test_between_window_keeps_numbers() {
        let window = twenty_lines().between(5, 8);
        assert_eq!(numbers(&window), vec![5, 6, 7, 8]);
        assert_eq!(window.raw_text(), "line 5\nline 6\nline 7\nline 8\n");
    }

    #[test]
    fn test_between_without_later_entry_is_empty() {
        let buffer = twenty_lines();
        assert!(buffer.between(15, 20).is_empty());
        assert!(buffer.between(15, 99).is_empty());
    }

    #[test]
    fn test_between_out_of_range_is_empty() {
        let buffer = twenty_lines();
        assert!(buffer.between(30, 40).is_empty());
        assert!(buffer.between(12, 4).is_empty());
        assert!(buffer.between(-50, 3).is_empty());
    }

    #[test]
    fn test_between_negative_bounds_index_from_end() {
        let buffer = twenty_lines();
        assert_eq!(numbers(&buffer.between(-3, -1)), vec![18, 19, 20]);
        assert_eq!(numbers(&buffer.between(17, -2)), vec![17, 18, 19]);
    }

    #[test]
    fn test_between_range_forms() {
        let buffer = twenty_lines();
        assert_eq!(numbers(&buffer.between_range(3..6)), vec![3, 4, 5]);
        assert_eq!(numbers(&buffer.between_range(3..=6)), vec![3, 4, 5, 6]);
        assert_eq!(numbers(&buffer.between_range(18..)), vec![18, 19, 20]);
    }

    #[test]
    fn test_take_lines() {
        let buffer = twenty_lines();
        assert_eq!(numbers(&buffer.take_lines(5, 3)), vec![5, 6, 7]);
        assert_eq!(numbers(&buffer.take_lines(19, 5)), vec![19, 20]);
        assert_eq!(numbers(&buffer.take_lines(-2, 5)), vec![19, 20]);
        assert_eq!(numbers(&buffer.take_lines(5, -3)), vec![3, 4, 5]);
        assert!(buffer.take_lines(50, 3).is_empty());
        assert!(buffer.take_lines(50, -3).is_empty());
    }

    #[test]
    fn test_context_windows() {
        let buffer = twenty_lines();
        assert_eq!(numbers(&buffer.before(10, 2)), vec![8, 9]);
        assert_eq!(numbers(&buffer.around(10, 2)), vec![8, 9, 10, 11, 12]);
        assert_eq!(numbers(&buffer.after(10, 2)), vec![11, 12]);
        assert_eq!(buffer.before(None, 2), buffer);
        assert_eq!(numbers(&buffer.before(1, 3)), Vec::<usize>::new());
    }

    #[test]
    fn test_context_windows_with_huge_context() {
        let buffer = twenty_lines();
        let all: Vec<usize> = (1..=20).collect();
        assert_eq!(numbers(&buffer.around(10, usize::MAX)), all);
        assert_eq!(numbers(&buffer.before(10, usize::MAX)), (1..10).collect::<Vec<_>>());
        assert_eq!(numbers(&buffer.after(10, usize::MAX)), (11..=20).collect::<Vec<_>>());
        assert_eq!(numbers(&buffer.around(usize::MAX, usize::MAX)), all);
    }

    #[test]
    fn test_grep_preserves_numbers() {
        let buffer = CodeBuffer::from_lines(["foo", "bar", "food", "baz"], 7, Language::Ruby);
        let pattern = Regex::new("foo").unwrap();
        let hits = buffer.grep(&pattern);
        assert_eq!(numbers(&hits), vec![7, 9]);
        assert_eq!(hits.raw_text(), "foo\nfood\n");
    }

    #[test]
    fn test_render_line_numbers_right_justified() {
        let buffer = CodeBuffer::from_lines(["a", "b", "c"], 9, Language::Ruby);
        assert_eq!(
            buffer.with_line_numbers(true).render(),
            " 9: a\n10: b\n11: c\n"
        );
    }

    #[test]
    fn test_render_marker_and_indentation() {
        let buffer = CodeBuffer::from_lines(["a", "b"], 1, Language::Ruby)
            .with_line_numbers(true)
            .with_marker(2)
            .with_indentation(2);
        assert_eq!(buffer.render(), "      1: a\n   => 2: b\n");
    }

    #[test]
    fn test_render_number_base() {
        let buffer = CodeBuffer::from_lines(["x", "y"], 120, Language::Ruby)
            .with_line_numbers(true)
            .with_number_base(1);
        assert_eq!(buffer.render(), "1: x\n2: y\n");
        assert_eq!(numbers(&buffer), vec![120, 121]);
    }

    #[test]
    fn test_render_colorizes_raw_text_first() {
        let buffer = CodeBuffer::from_lines(["x"], 1, Language::Ruby)
            .with_line_numbers(true)
            .colorize(true);
        let highlighter = |text: &str, _: Language| format!("<{text}>");
        assert_eq!(buffer.render_with(&highlighter), "1: <x>\n");
        assert_eq!(buffer.render(), "1: x\n");
    }

    #[test]
    fn test_render_does_not_change_raw_text() {
        let buffer = twenty_lines().with_line_numbers(true).with_marker(3);
        let before = buffer.raw_text();
        let _ = buffer.render();
        assert_eq!(buffer.raw_text(), before);
    }

    #[test]
    fn test_formatting_copies_leave_receiver_alone() {
        let buffer = twenty_lines();
        let numbered = buffer.with_line_numbers(true);
        assert!(!buffer.formatting().line_numbers);
        assert!(numbered.formatting().line_numbers);
        assert_eq!(buffer, numbered);
    }

    #[test]
    fn test_equality_against_text() {
        let buffer = CodeBuffer::from_lines(["a", "b"], 1, Language::Ruby);
        assert!(buffer == "a\nb");
        assert!(buffer == "a\nb\n");
        assert!(buffer != "a\nc");
    }

    #[test]
    fn test_equality_requires_same_numbers() {
        let a = CodeBuffer::from_lines(["a", "b"], 1, Language::Ruby);
        let b = CodeBuffer::from_lines(["a", "b"], 2, Language::Ruby);
        assert_ne!(a, b);
        assert_ne!(a, a.take_lines(1, 1));
    }

    #[test]
    fn test_with_formatting_validates() {
        let buffer = twenty_lines();
        assert!(buffer.with_formatting(Formatting::listing(4)).is_ok());
        assert!(buffer
            .with_formatting(Formatting {
                number_base: Some(0),
                ..Formatting::default()
            })
            .is_err());
    }
}
