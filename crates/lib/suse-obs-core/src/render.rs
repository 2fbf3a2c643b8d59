//! Markdown rendering and output bounding.

use std::fmt::Write as _;

use suse_obs_model::schema::PLACEHOLDER;

/// Leading slice of a list together with the size of the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounded<'a, T> {
    pub shown: &'a [T],
    pub total: usize,
}

impl<'a, T> Bounded<'a, T> {
    #[must_use]
    pub fn new(items: &'a [T], cap: usize) -> Self {
        Self {
            shown: &items[..items.len().min(cap)],
            total: items.len(),
        }
    }

    #[must_use]
    pub const fn hidden(&self) -> usize {
        self.total - self.shown.len()
    }

    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.hidden() > 0
    }

    /// `... and <k> more` when anything was cut.
    #[must_use]
    pub fn continuation(&self) -> Option<String> {
        self.is_truncated()
            .then(|| format!("... and {} more", self.hidden()))
    }
}

/// Joins at most `cap` items, appending the continuation marker if any were cut.
/// An empty list renders the placeholder.
#[must_use]
pub fn join_bounded<S: AsRef<str>>(items: &[S], cap: usize) -> String {
    if items.is_empty() {
        return PLACEHOLDER.to_string();
    }
    let bounded = Bounded::new(items, cap);
    let continuation = bounded.continuation();
    let mut parts: Vec<&str> = bounded.shown.iter().map(AsRef::as_ref).collect();
    if let Some(continuation) = continuation.as_deref() {
        parts.push(continuation);
    }
    parts.join(", ")
}

/// Cuts `text` to `max` characters, marking the cut with `...`.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Returns the placeholder for blank text.
#[must_use]
pub fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        PLACEHOLDER
    } else {
        text
    }
}

/// GitHub-flavored Markdown table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_to(&self, out: &mut String) {
        write_row(out, &self.header);
        out.push('|');
        for _ in &self.header {
            out.push_str("---|");
        }
        out.push('\n');
        for row in &self.rows {
            write_row(out, row);
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

fn write_row(out: &mut String, cells: &[String]) {
    out.push('|');
    for cell in cells {
        let _ = write!(out, " {} |", escape_cell(cell));
    }
    out.push('\n');
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_reports_hidden_count() {
        let items = [1, 2, 3, 4, 5, 6, 7, 8];
        let bounded = Bounded::new(&items, 5);
        assert_eq!(bounded.shown, &[1, 2, 3, 4, 5]);
        assert_eq!(bounded.total, 8);
        assert_eq!(bounded.continuation().as_deref(), Some("... and 3 more"));

        let short = Bounded::new(&items[..2], 5);
        assert_eq!(short.hidden(), 0);
        assert!(short.continuation().is_none());
    }

    #[test]
    fn join_bounded_caps_identifiers() {
        let ids = ["urn:a", "urn:b", "urn:c", "urn:d"];
        assert_eq!(join_bounded(&ids, 2), "urn:a, urn:b, ... and 2 more");
        assert_eq!(join_bounded(&ids[..1], 2), "urn:a");
        assert_eq!(join_bounded::<&str>(&[], 2), "-");
    }

    #[test]
    fn truncate_counts_characters() {
        let long = "é".repeat(60);
        let cut = truncate_chars(&long, 50);
        assert_eq!(cut.chars().count(), 50);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_chars("short", 50), "short");
    }

    #[test]
    fn table_renders_header_separator_and_rows() {
        let mut table = MarkdownTable::new(["Name", "Value"]);
        table.push_row(vec!["a|b".to_string(), "line\nbreak".to_string()]);
        assert_eq!(
            table.render(),
            "| Name | Value |\n|---|---|\n| a\\|b | line break |\n"
        );
    }
}
