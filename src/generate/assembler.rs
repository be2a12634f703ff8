//! Block assembly: replaying Delta operations into the document tree.
//!
//! The assembler is an explicit finite-state machine over the operation
//! sequence. Text parts accumulate styled runs into the block under
//! construction; every newline closes that block, carrying the closing
//! operation's block attributes (`align`, `list`) — the newline-attachment
//! rule: attributes on the operation that contains the newline apply to the
//! block that ends there, never to the one that follows. Table embeds close
//! any open block and are assembled separately into rectangular grids.

use crate::delta::{Alignment, DeltaOp, ListKind, TableEmbed};
use crate::error::Diagnostics;
use crate::model::{Block, Cell, ListItem, Paragraph, Run, Table};
use crate::style::RunStyle;

/// Policy for the ordered-list counter when a non-list block interrupts a
/// list.
///
/// The source behavior this format descends from keeps one running counter
/// for the whole document; whether that is intended is ambiguous, so the
/// choice is explicit here rather than inherited silently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListNumbering {
    /// One running counter per document, never reset (default).
    #[default]
    Continuous,
    /// The counter resets whenever a non-list block closes.
    RestartAfterBreak,
}

/// The assembler's state between operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// No block under construction.
    NoBlock,
    /// A plain paragraph is open.
    InParagraph,
    /// A list item of the given kind is open.
    InListItem(ListKind),
}

impl AssemblerState {
    fn kind(self) -> Option<ListKind> {
        match self {
            AssemblerState::InListItem(k) => Some(k),
            _ => None,
        }
    }
}

/// Replays a Delta operation sequence into an ordered list of blocks.
pub struct BlockAssembler {
    state: AssemblerState,
    runs: Vec<Run>,
    /// List kind a lazily-reopened block inherits from the one just closed.
    inherited: Option<ListKind>,
    ordered_counter: u32,
    numbering: ListNumbering,
    blocks: Vec<Block>,
    diagnostics: Diagnostics,
}

impl BlockAssembler {
    pub fn new(numbering: ListNumbering) -> BlockAssembler {
        BlockAssembler {
            state: AssemblerState::NoBlock,
            runs: Vec::new(),
            inherited: None,
            ordered_counter: 0,
            numbering,
            blocks: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Run the whole sequence through a fresh assembler.
    pub fn assemble(ops: &[DeltaOp], numbering: ListNumbering) -> (Vec<Block>, Diagnostics) {
        let mut assembler = BlockAssembler::new(numbering);
        for op in ops {
            assembler.push(op);
        }
        assembler.finish()
    }

    /// Current state, exposed so the transitions are testable in isolation.
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Process one operation.
    pub fn push(&mut self, op: &DeltaOp) {
        match op.insert.as_text() {
            Some(text) => self.push_text(text, op),
            None => self.push_embed(op),
        }
    }

    /// Flush the trailing block, if any, and return the assembled tree.
    pub fn finish(mut self) -> (Vec<Block>, Diagnostics) {
        if self.state != AssemblerState::NoBlock {
            let kind = self.state.kind();
            self.close_block(Alignment::Left, kind);
        }
        (self.blocks, self.diagnostics)
    }

    fn push_text(&mut self, text: &str, op: &DeltaOp) {
        let parts: Vec<&str> = text.split('\n').collect();
        for (i, part) in parts.iter().enumerate() {
            if !part.is_empty() {
                self.append_run(part, op);
            }
            if i + 1 < parts.len() {
                // This part is followed by a newline: close the block it
                // belongs to. The closing op's `list` attribute is
                // authoritative for that block; absent means plain
                // paragraph even inside a run of list items.
                let kind = op.list_kind();
                self.close_block(op.alignment().unwrap_or_default(), kind);
                self.inherited = kind;
                self.state = AssemblerState::NoBlock;
            }
        }
    }

    fn push_embed(&mut self, op: &DeltaOp) {
        // Any open block is flushed before the embed; an embed never joins
        // a paragraph.
        if self.state != AssemblerState::NoBlock {
            let kind = self.state.kind();
            self.close_block(Alignment::Left, kind);
            self.state = AssemblerState::NoBlock;
        }
        self.inherited = None;

        match op.insert.as_table() {
            Some(value) => {
                if let Some(table) = self.assemble_table(value) {
                    self.blocks.push(Block::Table(table));
                }
                if self.numbering == ListNumbering::RestartAfterBreak {
                    self.ordered_counter = 0;
                }
            }
            None => {
                self.diagnostics.note("unsupported embed skipped");
            }
        }
    }

    fn append_run(&mut self, text: &str, op: &DeltaOp) {
        let op_kind = op.list_kind();
        match self.state {
            AssemblerState::NoBlock => {
                self.open_block(op_kind.or(self.inherited));
            }
            // A list attribute that differs from the open block's kind
            // closes it; list changes never apply retroactively to content
            // already in the block.
            AssemblerState::InParagraph => {
                if op_kind.is_some() {
                    self.close_block(Alignment::Left, None);
                    self.open_block(op_kind);
                }
            }
            AssemblerState::InListItem(current) => {
                if let Some(kind) = op_kind {
                    if kind != current {
                        self.close_block(Alignment::Left, Some(current));
                        self.open_block(Some(kind));
                    }
                }
            }
        }

        let style = op
            .attributes
            .as_ref()
            .map(|a| RunStyle::from_attributes(a, &mut self.diagnostics))
            .unwrap_or_default();
        self.runs.push(Run::new(text, style));
    }

    fn open_block(&mut self, kind: Option<ListKind>) {
        self.state = match kind {
            Some(k) => AssemblerState::InListItem(k),
            None => AssemblerState::InParagraph,
        };
    }

    /// Emit the block under construction (possibly empty: consecutive
    /// newlines produce blank paragraphs). Ordered ordinals are taken from
    /// the running counter at close time only.
    fn close_block(&mut self, alignment: Alignment, kind: Option<ListKind>) {
        let runs = std::mem::take(&mut self.runs);
        let list = match kind {
            Some(ListKind::Ordered) => {
                self.ordered_counter += 1;
                Some(ListItem::ordered(self.ordered_counter))
            }
            Some(ListKind::Bullet) => Some(ListItem::bullet()),
            None => {
                if self.numbering == ListNumbering::RestartAfterBreak {
                    self.ordered_counter = 0;
                }
                None
            }
        };
        self.blocks.push(Block::Paragraph(Paragraph {
            runs,
            alignment,
            list,
        }));
    }

    fn assemble_table(&mut self, value: &serde_json::Value) -> Option<Table> {
        let embed = match TableEmbed::from_value(value) {
            Ok(embed) => embed,
            Err(e) => {
                self.diagnostics.record(&e);
                return None;
            }
        };

        let columns = embed.column_keys();
        if columns.is_empty() {
            self.diagnostics.note("table embed with no columns skipped");
            return None;
        }

        let mut table = Table::new(columns.len());
        for row in &embed.rows {
            let cells = columns
                .iter()
                .map(|key| match row.get(key) {
                    Some(ops) => self.render_cell(ops),
                    None => Cell::empty(),
                })
                .collect();
            table.push_row(cells);
        }
        Some(table)
    }

    /// Render a cell's operation sequence as a single line of inline text.
    /// Block attributes are ignored inside cells and newlines flatten to
    /// spaces; nested embeds are dropped.
    fn render_cell(&mut self, ops: &[DeltaOp]) -> Cell {
        let mut runs = Vec::new();
        for op in ops {
            let Some(text) = op.insert.as_text() else {
                self.diagnostics.note("embed inside table cell skipped");
                continue;
            };
            let text = text.replace('\n', " ");
            if text.is_empty() {
                continue;
            }
            let style = op
                .attributes
                .as_ref()
                .map(|a| RunStyle::from_attributes(a, &mut self.diagnostics))
                .unwrap_or_default();
            runs.push(Run::new(text, style));
        }
        if runs.is_empty() {
            Cell::empty()
        } else {
            Cell::new(runs)
        }
    }
}
