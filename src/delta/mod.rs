//! The Delta interchange format.
//!
//! A Delta document is an ordered sequence of insert operations. Text
//! inserts may contain embedded newlines, each of which terminates a block
//! (paragraph or list item); block-level attributes (`align`, `list`)
//! attach to the operation carrying the terminating newline and apply to
//! the block that ends there. Embeds (tables) are standalone operations.

mod attributes;
mod table;

pub use attributes::{Alignment, Attributes, ListKind};
pub use table::TableEmbed;

use serde::{Deserialize, Serialize};

/// One atomic unit of a Delta sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaOp {
    pub insert: Insert,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl DeltaOp {
    /// A plain text insert.
    pub fn text(text: impl Into<String>) -> DeltaOp {
        DeltaOp {
            insert: Insert::Text(text.into()),
            attributes: None,
        }
    }

    /// A text insert with attributes. Empty attribute maps are dropped so
    /// the wire form never carries an empty `attributes` object.
    pub fn text_with(text: impl Into<String>, attributes: Attributes) -> DeltaOp {
        DeltaOp {
            insert: Insert::Text(text.into()),
            attributes: (!attributes.is_empty()).then_some(attributes),
        }
    }

    /// A block-terminating newline insert.
    pub fn newline(attributes: Attributes) -> DeltaOp {
        DeltaOp::text_with("\n", attributes)
    }

    /// The `list` attribute, if any.
    pub fn list_kind(&self) -> Option<ListKind> {
        self.attributes.as_ref().and_then(|a| a.list)
    }

    /// The `align` attribute, if any.
    pub fn alignment(&self) -> Option<Alignment> {
        self.attributes.as_ref().and_then(|a| a.align)
    }
}

/// The payload of an insert operation: text or a structured embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insert {
    Text(String),

    /// An embed object such as `{"table": {...}}`. Kept as raw JSON so one
    /// malformed embed can be skipped at assembly time instead of failing
    /// deserialization of the whole sequence.
    Embed(serde_json::Map<String, serde_json::Value>),
}

impl Insert {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Insert::Text(s) => Some(s),
            Insert::Embed(_) => None,
        }
    }

    /// The raw value under the `table` key, if this is a table embed.
    pub fn as_table(&self) -> Option<&serde_json::Value> {
        match self {
            Insert::Embed(map) => map.get("table"),
            Insert::Text(_) => None,
        }
    }
}
