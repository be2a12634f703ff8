//! The table embed wire type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::delta::DeltaOp;
use crate::error::{Error, Result};

/// One row: column key → inline operation sequence for that cell.
pub type TableRowEmbed = BTreeMap<String, Vec<DeltaOp>>;

/// The payload of a `{"table": {...}}` embed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableEmbed {
    #[serde(default)]
    pub rows: Vec<TableRowEmbed>,

    /// Explicit column order. Authoritative when present; otherwise columns
    /// are inferred from the first row's keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

impl TableEmbed {
    /// Parse the raw value under an embed's `table` key.
    pub fn from_value(value: &serde_json::Value) -> Result<TableEmbed> {
        serde_json::from_value(value.clone())
            .map_err(|e| Error::MalformedTableEmbed(e.to_string()))
    }

    /// The ordered column keys for this table.
    ///
    /// The explicit `columns` list wins; without one, the first row's keys
    /// are sorted ascending by their numeric suffix (`col0`, `col1`, ...,
    /// `col10`), so ten-plus-column tables keep their order. Keys without a
    /// numeric suffix sort after the numbered ones, lexically.
    pub fn column_keys(&self) -> Vec<String> {
        if let Some(cols) = &self.columns {
            return cols.clone();
        }
        let Some(first) = self.rows.first() else {
            return Vec::new();
        };
        let mut keys: Vec<String> = first.keys().cloned().collect();
        keys.sort_by(|a, b| {
            let na = numeric_suffix(a);
            let nb = numeric_suffix(b);
            match (na, nb) {
                (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.cmp(b),
            }
        });
        keys
    }
}

/// Trailing decimal digits of a key, if any.
fn numeric_suffix(key: &str) -> Option<u64> {
    let digits: String = key
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}
