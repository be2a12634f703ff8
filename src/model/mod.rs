//! The native document tree built during generation.
//!
//! This is the intermediate representation between the Delta operation
//! sequence and a serialized document: an ordered list of blocks, each a
//! paragraph of styled runs or a rectangular table. The tree is built by
//! the block assembler, owned by a single generation call, and discarded
//! once serialized.

mod paragraph;
mod table;

pub use paragraph::{ListItem, Paragraph, Run};
pub use table::{Cell, Table};

use serde::Serialize;

/// A top-level content block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl Block {
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table(_))
    }

    /// Plain text content, for logging and tests.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph(p) => p.plain_text(),
            Block::Table(t) => t.plain_text(),
        }
    }
}
