//! `xl/styles.xml` parser.
//!
//! Styles are interpreted only as far as they type numeric cells: a number
//! format whose code mentions day/year parts makes a date, hour parts make a
//! time, both make a timestamp. Everything else stays a plain double.

use std::collections::HashMap;

use quick_xml::events::attributes::Attributes;

use tabula_columnar::LogicalType;

use crate::xml::{XmlControl, XmlHandler};
use crate::{Result, XlsxError};

/// Ids below this are built-in formats; only 14..=22 carry temporal meaning.
const FIRST_CUSTOM_FORMAT_ID: u32 = 164;

/// One logical type per `cellXfs/xf` entry, index-aligned with the cell `s`
/// attribute. A `None` slot is a style we could not classify; downstream
/// reads it as "unknown" and falls back to double.
#[derive(Clone, Debug, Default)]
pub struct StyleSheet {
    slots: Vec<Option<LogicalType>>,
}

impl StyleSheet {
    pub fn format(&self, idx: usize) -> Option<LogicalType> {
        self.slots.get(idx).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn classify_format_code(code: &str) -> LogicalType {
    let has_date = ["DD", "dd", "YY", "yy"].iter().any(|p| code.contains(p));
    let has_time = ["HH", "hh", "h", "H"].iter().any(|p| code.contains(p));
    match (has_date, has_time) {
        (true, true) => LogicalType::Timestamp,
        (true, false) => LogicalType::Date,
        (false, true) => LogicalType::Time,
        (false, false) => LogicalType::Double,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    StyleSheet,
    NumFmts,
    NumFmt,
    CellXfs,
    Xf,
}

pub struct StylesHandler {
    state: State,
    number_formats: HashMap<u32, LogicalType>,
    slots: Vec<Option<LogicalType>>,
}

impl StylesHandler {
    pub fn new() -> Self {
        Self {
            state: State::Start,
            number_formats: HashMap::new(),
            slots: Vec::new(),
        }
    }

    pub fn into_style_sheet(self) -> StyleSheet {
        StyleSheet { slots: self.slots }
    }

    fn classify_xf(&self, id: u32) -> Option<LogicalType> {
        if id >= FIRST_CUSTOM_FORMAT_ID {
            return self.number_formats.get(&id).copied();
        }
        Some(match id {
            14..=17 => LogicalType::Date,
            18..=21 => LogicalType::Time,
            22 => LogicalType::Timestamp,
            _ => LogicalType::Double,
        })
    }
}

impl Default for StylesHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_id(value: &str, what: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| XlsxError::invalid(format!("invalid {what} entry in styles.xml")))
}

impl XmlHandler for StylesHandler {
    fn on_start(
        &mut self,
        _ctl: &mut XmlControl,
        name: &[u8],
        attrs: Attributes<'_>,
    ) -> Result<()> {
        match self.state {
            State::Start => {
                if name == b"styleSheet" {
                    self.state = State::StyleSheet;
                }
            }
            State::StyleSheet => {
                if name == b"numFmts" {
                    self.state = State::NumFmts;
                } else if name == b"cellXfs" {
                    self.state = State::CellXfs;
                }
            }
            State::NumFmts => {
                self.state = State::NumFmt;

                let mut id = None;
                let mut code = None;
                for attr in attrs {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"numFmtId" => id = Some(attr.unescape_value()?.into_owned()),
                        b"formatCode" => code = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }

                let Some(id) = id else {
                    return Err(XlsxError::invalid("invalid numFmt entry in styles.xml"));
                };
                let id = parse_id(&id, "numFmt")?;
                if id >= FIRST_CUSTOM_FORMAT_ID {
                    if let Some(code) = code {
                        self.number_formats.insert(id, classify_format_code(&code));
                    }
                }
            }
            State::CellXfs => {
                self.state = State::Xf;

                let mut id = None;
                for attr in attrs {
                    let attr = attr?;
                    if attr.key.as_ref() == b"numFmtId" {
                        id = Some(attr.unescape_value()?.into_owned());
                    }
                }
                let Some(id) = id else {
                    return Err(XlsxError::invalid("invalid xf entry in styles.xml"));
                };
                let id = parse_id(&id, "xf")?;
                self.slots.push(self.classify_xf(id));
            }
            _ => {}
        }
        Ok(())
    }

    fn on_end(&mut self, ctl: &mut XmlControl, name: &[u8]) -> Result<()> {
        match self.state {
            State::NumFmt => {
                if name == b"numFmt" {
                    self.state = State::NumFmts;
                }
            }
            State::Xf => {
                if name == b"xf" {
                    self.state = State::CellXfs;
                }
            }
            State::NumFmts => {
                if name == b"numFmts" {
                    self.state = State::StyleSheet;
                }
            }
            State::CellXfs => {
                if name == b"cellXfs" {
                    self.state = State::StyleSheet;
                }
            }
            State::StyleSheet => {
                if name == b"styleSheet" {
                    ctl.stop(false);
                }
            }
            _ => {}
        }
        Ok(())
    }
}
