//! The production worksheet pass: fills fixed-size text batches.

use std::sync::Arc;

use tabula_columnar::STANDARD_VECTOR_SIZE;

use crate::cell::{CellKind, CellRange};
use crate::shared_strings::StringTable;
use crate::worksheet::{RawCell, SheetVisitor};
use crate::xml::XmlControl;
use crate::{Result, XlsxError};

/// Why the materializer stopped the drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YieldReason {
    /// The batch reached capacity; resume after handing it to the host.
    ChunkFull,
    /// The incoming row jumped over sheet rows; the orchestrator decides
    /// whether to pad or to end the scan.
    SkippedRow,
    /// `stop_at_empty` hit an all-empty row; the scan is over.
    EmptyRow,
}

/// A batch of text cells in column-major order plus the mapping from batch
/// row to sheet row. Capacity is the engine's standard vector size.
#[derive(Debug)]
pub struct TextChunk {
    columns: Vec<Vec<Option<Arc<str>>>>,
    sheet_rows: Vec<u32>,
    capacity: usize,
}

impl TextChunk {
    fn new(width: usize, capacity: usize) -> Self {
        Self {
            columns: (0..width).map(|_| Vec::with_capacity(capacity)).collect(),
            sheet_rows: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of committed rows.
    pub fn len(&self) -> usize {
        self.sheet_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheet_rows.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Arc<str>> {
        self.columns[col][row].as_ref()
    }

    /// The sheet row a batch row came from.
    pub fn sheet_row(&self, row: usize) -> u32 {
        self.sheet_rows[row]
    }

    pub fn reset(&mut self) {
        for col in &mut self.columns {
            col.clear();
        }
        self.sheet_rows.clear();
    }

    fn push_cell(&mut self, col: usize, value: Option<Arc<str>>) {
        self.columns[col].push(value);
    }

    fn commit_row(&mut self, sheet_row: u32) {
        debug_assert!(self.columns.iter().all(|c| c.len() == self.sheet_rows.len() + 1));
        self.sheet_rows.push(sheet_row);
    }

    fn push_null_row(&mut self, sheet_row: u32) {
        for col in &mut self.columns {
            col.push(None);
        }
        self.sheet_rows.push(sheet_row);
    }
}

/// Streams in-range rows into a [`TextChunk`], resolving shared strings and
/// null-padding gaps.
pub struct RowMaterializer {
    range: CellRange,
    strings: Arc<StringTable>,
    stop_at_empty: bool,

    chunk: TextChunk,
    last_col: u32,
    last_row: u32,
    curr_row: u32,
    row_empty: bool,
    yield_reason: Option<YieldReason>,
}

impl RowMaterializer {
    pub fn new(range: CellRange, strings: Arc<StringTable>, stop_at_empty: bool) -> Self {
        Self {
            chunk: TextChunk::new(range.width() as usize, STANDARD_VECTOR_SIZE),
            last_col: range.beg.col - 1,
            last_row: range.beg.row - 1,
            curr_row: range.beg.row,
            row_empty: false,
            yield_reason: None,
            range,
            strings,
            stop_at_empty,
        }
    }

    pub fn chunk(&self) -> &TextChunk {
        &self.chunk
    }

    pub fn reset_chunk(&mut self) {
        self.chunk.reset();
    }

    /// Takes the reason for the last stop, if any.
    pub fn take_yield_reason(&mut self) -> Option<YieldReason> {
        self.yield_reason.take()
    }

    /// True while padding rows are owed before the current row's cells may
    /// be materialized.
    pub fn found_skipped_row(&self) -> bool {
        self.last_row + 1 < self.curr_row
    }

    /// Emit all-null rows for the skipped range, stopping early when the
    /// batch fills up.
    pub fn skip_rows(&mut self) {
        while self.found_skipped_row() {
            if self.chunk.is_full() {
                return;
            }
            self.last_row += 1;
            self.chunk.push_null_row(self.last_row);
        }
    }

    /// Pad the tail of an explicit range with all-null rows after the stream
    /// ended short. Fills at most one batch; call again after yielding.
    pub fn fill_rows(&mut self) {
        while self.last_row + 1 < self.range.end.row {
            if self.chunk.is_full() {
                return;
            }
            self.last_row += 1;
            self.chunk.push_null_row(self.last_row);
        }
    }

    /// True once every row of the range has been materialized.
    pub fn range_exhausted(&self) -> bool {
        self.last_row + 1 >= self.range.end.row
    }

    /// The `A1` name of a batch cell, for conversion error messages.
    pub fn cell_name(&self, chunk_row: usize, chunk_col: usize) -> String {
        let pos = crate::cell::CellPos::new(
            self.chunk.sheet_row(chunk_row),
            chunk_col as u32 + self.range.beg.col,
        );
        pos.to_a1()
    }
}

impl SheetVisitor for RowMaterializer {
    fn on_begin_row(&mut self, ctl: &mut XmlControl, row: u32) -> Result<()> {
        if !self.range.contains_row(row) {
            return Ok(());
        }

        self.last_col = self.range.beg.col - 1;
        self.row_empty = true;
        self.curr_row = row;

        if self.found_skipped_row() {
            self.yield_reason = Some(YieldReason::SkippedRow);
            ctl.stop(true);
        }
        Ok(())
    }

    fn on_cell(&mut self, _ctl: &mut XmlControl, cell: &RawCell<'_>) -> Result<()> {
        if !self.range.contains(cell.pos) {
            return Ok(());
        }
        if cell.pos.col <= self.last_col {
            // Out-of-order duplicate within the row; ignore it.
            return Ok(());
        }

        // Null-fill any columns skipped since the previous cell.
        for col in self.last_col + 1..cell.pos.col {
            self.chunk
                .push_cell((col - self.range.beg.col) as usize, None);
        }

        let slot = (cell.pos.col - self.range.beg.col) as usize;
        if cell.kind == CellKind::SharedString {
            let idx = cell.text.trim().parse::<u32>().map_err(|_| {
                XlsxError::invalid(format!("invalid shared string index: '{}'", cell.text))
            })?;
            let handle = self.strings.get(idx).ok_or_else(|| {
                XlsxError::invalid(format!("shared string index {idx} out of range"))
            })?;
            self.chunk.push_cell(slot, Some(Arc::clone(handle)));
        } else if cell.text.is_empty() && cell.kind != CellKind::InlineString {
            // Empty non-string cells can never cast; null them immediately.
            self.chunk.push_cell(slot, None);
        } else {
            self.chunk.push_cell(slot, Some(Arc::from(cell.text)));
        }

        if !cell.text.is_empty() {
            self.row_empty = false;
        }
        self.last_col = cell.pos.col;
        Ok(())
    }

    fn on_end_row(&mut self, ctl: &mut XmlControl, row: u32) -> Result<()> {
        if !self.range.contains_row(row) {
            return Ok(());
        }

        self.last_row = row;

        if self.stop_at_empty && self.row_empty {
            // Roll back the row's cells; the scan ends before it.
            for col in &mut self.chunk.columns {
                col.truncate(self.chunk.sheet_rows.len());
            }
            self.yield_reason = Some(YieldReason::EmptyRow);
            ctl.stop(false);
            return Ok(());
        }

        // Null-fill the trailing columns.
        for col in self.last_col + 1..self.range.end.col {
            self.chunk
                .push_cell((col - self.range.beg.col) as usize, None);
        }

        self.chunk.commit_row(row);
        if self.chunk.is_full() {
            self.yield_reason = Some(YieldReason::ChunkFull);
            ctl.stop(true);
        }
        Ok(())
    }
}
