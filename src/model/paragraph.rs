//! Paragraph and run types.

use serde::Serialize;

use crate::delta::{Alignment, ListKind};
use crate::style::RunStyle;

/// A run of text with one consistent style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Run {
        Run {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Run {
        Run::new(text, RunStyle::default())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Resolved list membership of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub kind: ListKind,

    /// Ordinal assigned by the assembler's running counter; `None` for
    /// bullet items.
    pub number: Option<u32>,
}

impl ListItem {
    pub fn bullet() -> ListItem {
        ListItem {
            kind: ListKind::Bullet,
            number: None,
        }
    }

    pub fn ordered(number: u32) -> ListItem {
        ListItem {
            kind: ListKind::Ordered,
            number: Some(number),
        }
    }
}

/// A paragraph or list item: styled runs plus block-level attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub alignment: Alignment,
    pub list: Option<ListItem>,
}

impl Paragraph {
    pub fn new() -> Paragraph {
        Paragraph::default()
    }

    pub fn push_run(&mut self, run: Run) {
        self.runs.push(run);
    }

    /// Whether the paragraph carries any text at all. An empty paragraph is
    /// still a block (a blank line) when explicitly closed.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(Run::is_empty)
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}
