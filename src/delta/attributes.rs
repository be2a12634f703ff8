//! The recognized Delta attribute keys.

use serde::{Deserialize, Serialize};

use crate::style::{Script, SizeBucket};

/// Block alignment, attached to the newline that terminates the block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// List membership, attached the same way as [`Alignment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// The attribute map of one operation.
///
/// Every key is optional and absent keys are never serialized; colors stay
/// raw strings on the wire and are normalized by the attribute codec so a
/// malformed value degrades to "no color" instead of a parse failure.
/// Unrecognized keys are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeBucket>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListKind>,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        *self == Attributes::default()
    }
}
