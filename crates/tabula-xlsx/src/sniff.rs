//! One-shot worksheet passes: range sniffing and header sniffing.

use crate::cell::{CellKind, CellPos, CellRange, MAX_SHEET_ROWS};
use crate::worksheet::{RawCell, SheetVisitor};
use crate::xml::XmlControl;
use crate::Result;

/// A buffered cell from a sniffed row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetCell {
    pub pos: CellPos,
    pub kind: CellKind,
    pub text: String,
    pub style: u32,
}

/// Finds the data region of a sheet: scans until the first row with any
/// non-empty cell and takes that row's first maximal contiguous run of
/// non-empty cells as the column range. Rows below are unbounded.
#[derive(Debug, Default)]
pub struct RangeSniffer {
    beg_col: u32,
    end_col: u32,
    beg_row: u32,
    state: RunState,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum RunState {
    #[default]
    Empty,
    Found,
    Ended,
}

impl RangeSniffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sniffed range; the whole sheet if no data row was found.
    pub fn range(&self) -> CellRange {
        if self.beg_row == 0 {
            return CellRange::default();
        }
        CellRange::new(
            self.beg_row,
            self.beg_col,
            MAX_SHEET_ROWS + 1,
            self.end_col + 1,
        )
    }
}

impl SheetVisitor for RangeSniffer {
    fn on_cell(&mut self, _ctl: &mut XmlControl, cell: &RawCell<'_>) -> Result<()> {
        match self.state {
            RunState::Empty => {
                if !cell.text.is_empty() {
                    self.state = RunState::Found;
                    self.beg_col = cell.pos.col;
                    self.end_col = cell.pos.col;
                }
            }
            RunState::Found => {
                if cell.text.is_empty() {
                    // The run is over; later cells in this row are ignored.
                    self.state = RunState::Ended;
                } else {
                    self.end_col = cell.pos.col;
                }
            }
            RunState::Ended => {}
        }
        Ok(())
    }

    fn on_end_row(&mut self, ctl: &mut XmlControl, row: u32) -> Result<()> {
        if matches!(self.state, RunState::Found | RunState::Ended) {
            self.beg_row = row;
            ctl.stop(false);
        } else {
            self.state = RunState::Empty;
            self.beg_col = 0;
            self.end_col = 0;
        }
        Ok(())
    }
}

/// How the reader decides whether the first row is a header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderMode {
    Never,
    #[default]
    Maybe,
    Force,
}

/// Determines the header row and the type-inference row within a range.
///
/// Gaps inside a row and missing trailing columns are padded with empty
/// cells of `default_kind` so both collected rows always span the full
/// range width.
#[derive(Debug)]
pub struct HeaderSniffer {
    range: CellRange,
    header_mode: HeaderMode,
    /// Range came from the caller rather than from sniffing; synthesized
    /// header names then use bare column letters.
    user_range: bool,
    default_kind: CellKind,

    first_row: bool,
    last_col: u32,
    header_cells: Vec<SheetCell>,
    column_cells: Vec<SheetCell>,
}

impl HeaderSniffer {
    pub fn new(
        range: CellRange,
        header_mode: HeaderMode,
        user_range: bool,
        default_kind: CellKind,
    ) -> Self {
        Self {
            range,
            header_mode,
            user_range,
            default_kind,
            first_row: true,
            last_col: 0,
            header_cells: Vec::new(),
            column_cells: Vec::new(),
        }
    }

    /// The residual data range: the input range with the header row (if one
    /// was found) excluded.
    pub fn range(&self) -> CellRange {
        self.range
    }

    pub fn header_cells(&self) -> &[SheetCell] {
        &self.header_cells
    }

    /// The row used for type inference. Empty if the sheet ran out before a
    /// data row.
    pub fn column_cells(&self) -> &[SheetCell] {
        &self.column_cells
    }

    pub fn into_parts(self) -> (CellRange, Vec<SheetCell>, Vec<SheetCell>) {
        (self.range, self.header_cells, self.column_cells)
    }

    fn pad_to(&mut self, row: u32, col_end: u32) {
        for col in self.last_col + 1..col_end {
            self.column_cells.push(SheetCell {
                pos: CellPos::new(row, col),
                kind: self.default_kind,
                text: String::new(),
                style: 0,
            });
        }
    }

    fn decide_header(&self) -> bool {
        match self.header_mode {
            HeaderMode::Never => false,
            HeaderMode::Force => true,
            HeaderMode::Maybe => self
                .column_cells
                .iter()
                .all(|cell| cell.kind.is_string() && !cell.text.is_empty()),
        }
    }
}

impl SheetVisitor for HeaderSniffer {
    fn on_begin_row(&mut self, _ctl: &mut XmlControl, row: u32) -> Result<()> {
        if !self.range.contains_row(row) {
            return Ok(());
        }
        self.column_cells.clear();
        self.last_col = self.range.beg.col - 1;
        Ok(())
    }

    fn on_cell(&mut self, _ctl: &mut XmlControl, cell: &RawCell<'_>) -> Result<()> {
        if !self.range.contains(cell.pos) {
            return Ok(());
        }
        self.pad_to(cell.pos.row, cell.pos.col);
        self.column_cells.push(SheetCell {
            pos: cell.pos,
            kind: cell.kind,
            text: cell.text.to_string(),
            style: cell.style,
        });
        self.last_col = cell.pos.col;
        Ok(())
    }

    fn on_end_row(&mut self, ctl: &mut XmlControl, row: u32) -> Result<()> {
        if !self.range.contains_row(row) {
            self.column_cells.clear();
            self.last_col = self.range.beg.col - 1;
            return Ok(());
        }

        self.pad_to(row, self.range.end.col);

        if !self.first_row {
            // This was the type-inference row.
            ctl.stop(false);
            return Ok(());
        }

        if !self.decide_header() {
            // Synthesize a header from the first row's positions.
            self.header_cells = self.column_cells.clone();
            for cell in &mut self.header_cells {
                cell.kind = CellKind::InlineString;
                cell.style = 0;
                cell.text = if self.user_range {
                    cell.pos.column_letters()
                } else {
                    cell.pos.to_a1()
                };
            }
            ctl.stop(false);
            return Ok(());
        }

        self.header_cells = std::mem::take(&mut self.column_cells);
        self.last_col = self.range.beg.col - 1;
        self.first_row = false;

        // The data range starts below the header.
        self.range.beg.row = row + 1;
        Ok(())
    }
}
