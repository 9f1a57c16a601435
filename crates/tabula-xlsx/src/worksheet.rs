//! The worksheet base state machine.
//!
//! Walks `sheetData -> row -> c -> (v | is/t)`, tracking the current cell
//! position and buffering character data, and hands rows and cells to a
//! [`SheetVisitor`]. The three worksheet passes (range sniffing, header
//! sniffing, row materialization) are visitors plugged into this walker.

use quick_xml::events::attributes::Attributes;

use crate::cell::{CellKind, CellPos, MAX_CELL_TEXT};
use crate::xml::{XmlControl, XmlHandler};
use crate::{Result, XlsxError};

/// A cell as it comes off the wire: fully positioned, text still raw.
#[derive(Debug)]
pub struct RawCell<'a> {
    pub pos: CellPos,
    pub kind: CellKind,
    pub text: &'a str,
    pub style: u32,
}

/// Row/cell callbacks shared by the worksheet passes.
pub trait SheetVisitor {
    fn on_begin_row(&mut self, _ctl: &mut XmlControl, _row: u32) -> Result<()> {
        Ok(())
    }

    fn on_cell(&mut self, _ctl: &mut XmlControl, _cell: &RawCell<'_>) -> Result<()> {
        Ok(())
    }

    fn on_end_row(&mut self, _ctl: &mut XmlControl, _row: u32) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    SheetData,
    Row,
    Cell,
    V,
    Is,
    T,
}

pub struct SheetDataHandler<V: SheetVisitor> {
    state: State,
    pos: CellPos,
    kind: CellKind,
    style: u32,
    text: String,
    visitor: V,
}

impl<V: SheetVisitor> SheetDataHandler<V> {
    pub fn new(visitor: V) -> Self {
        Self {
            state: State::Start,
            pos: CellPos::new(0, 0),
            kind: CellKind::Number,
            style: 0,
            text: String::new(),
            visitor,
        }
    }

    pub fn visitor(&self) -> &V {
        &self.visitor
    }

    pub fn visitor_mut(&mut self) -> &mut V {
        &mut self.visitor
    }

    pub fn into_visitor(self) -> V {
        self.visitor
    }

    fn enter_row(&mut self, ctl: &mut XmlControl, attrs: Attributes<'_>) -> Result<()> {
        self.pos.col = 0;

        let mut row_ref = None;
        for attr in attrs {
            let attr = attr?;
            if attr.key.as_ref() == b"r" {
                row_ref = Some(attr.unescape_value()?.into_owned());
            }
        }

        match row_ref {
            // No reference: the row follows its predecessor.
            None => self.pos.row += 1,
            Some(row_ref) => {
                self.pos.row = row_ref.trim().parse::<u32>().map_err(|_| {
                    XlsxError::invalid(format!("invalid row reference in sheet: {row_ref}"))
                })?;
            }
        }

        self.visitor.on_begin_row(ctl, self.pos.row)
    }

    fn enter_cell(&mut self, attrs: Attributes<'_>) -> Result<()> {
        self.text.clear();

        let mut type_attr = None;
        let mut cell_ref = None;
        let mut style_attr = None;
        for attr in attrs {
            let attr = attr?;
            match attr.key.as_ref() {
                b"t" => type_attr = Some(attr.value.into_owned()),
                b"r" => cell_ref = Some(attr.unescape_value()?.into_owned()),
                b"s" => style_attr = Some(attr.unescape_value()?.into_owned()),
                _ => {}
            }
        }

        self.style = style_attr
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(0);
        self.kind = type_attr
            .map(|t| CellKind::from_attr(&t))
            .unwrap_or(CellKind::Number);

        match cell_ref {
            // No reference: the cell follows its predecessor.
            None => self.pos.col += 1,
            Some(cell_ref) => {
                let Some((parsed, _, _, _)) =
                    CellPos::parse_partial(&cell_ref, CellPos::new(1, 1))
                else {
                    return Err(XlsxError::invalid(format!(
                        "invalid cell reference in sheet: {cell_ref}"
                    )));
                };
                if parsed.row != self.pos.row {
                    return Err(XlsxError::invalid(
                        "cell reference does not match row reference in sheet",
                    ));
                }
                self.pos.col = parsed.col;
            }
        }
        Ok(())
    }
}

impl<V: SheetVisitor> XmlHandler for SheetDataHandler<V> {
    fn on_start(
        &mut self,
        ctl: &mut XmlControl,
        name: &[u8],
        attrs: Attributes<'_>,
    ) -> Result<()> {
        match (self.state, name) {
            (State::Start, b"sheetData") => self.state = State::SheetData,
            (State::SheetData, b"row") => {
                self.state = State::Row;
                self.enter_row(ctl, attrs)?;
            }
            (State::Row, b"c") => {
                self.state = State::Cell;
                self.enter_cell(attrs)?;
            }
            (State::Cell, b"v") => {
                self.state = State::V;
                ctl.enable_text(true);
            }
            (State::Cell, b"is") => self.state = State::Is,
            (State::Is, b"t") => {
                self.state = State::T;
                ctl.enable_text(true);
            }
            _ => {}
        }
        Ok(())
    }

    fn on_end(&mut self, ctl: &mut XmlControl, name: &[u8]) -> Result<()> {
        match (self.state, name) {
            (State::SheetData, b"sheetData") => ctl.stop(false),
            (State::Row, b"row") => {
                let row = self.pos.row;
                self.visitor.on_end_row(ctl, row)?;
                self.state = State::SheetData;
            }
            (State::Cell, b"c") => {
                let cell = RawCell {
                    pos: self.pos,
                    kind: self.kind,
                    text: &self.text,
                    style: self.style,
                };
                self.visitor.on_cell(ctl, &cell)?;
                self.state = State::Row;
            }
            (State::V, b"v") => {
                self.state = State::Cell;
                ctl.enable_text(false);
            }
            (State::Is, b"is") => self.state = State::Cell,
            (State::T, b"t") => {
                self.state = State::Is;
                ctl.enable_text(false);
            }
            _ => {}
        }
        Ok(())
    }

    fn on_text(&mut self, _ctl: &mut XmlControl, text: &str) -> Result<()> {
        // Guard against absurd cell payloads in corrupt or hostile files.
        if self.text.len() + text.len() > MAX_CELL_TEXT * 2 {
            return Err(XlsxError::invalid(
                "cell text too large (is the file corrupted?)",
            ));
        }
        self.text.push_str(text);
        Ok(())
    }
}
