//! Table types.

use serde::Serialize;

use super::Run;

/// A single table cell: one implicit paragraph of inline-styled runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cell {
    pub runs: Vec<Run>,
}

impl Cell {
    pub fn new(runs: Vec<Run>) -> Cell {
        Cell { runs }
    }

    /// A visually empty cell. Carries a non-breaking space so the grid cell
    /// is always rendered, never collapsed.
    pub fn empty() -> Cell {
        Cell {
            runs: vec![Run::plain("\u{00A0}")],
        }
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A rectangular table: every row has exactly `columns` cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
    pub columns: usize,
}

impl Table {
    pub fn new(columns: usize) -> Table {
        Table {
            rows: Vec::new(),
            columns,
        }
    }

    /// Append a row, padding or truncating to the fixed column count.
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.truncate(self.columns);
        while cells.len() < self.columns {
            cells.push(Cell::empty());
        }
        self.rows.push(cells);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns == 0
    }

    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(Cell::plain_text)
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
