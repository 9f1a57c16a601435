//! `xl/workbook.xml` parser: the ordered sheet list.

use quick_xml::events::attributes::Attributes;

use crate::xml::{XmlControl, XmlHandler};
use crate::{Result, XlsxError};

/// One `<sheet>` entry, in document order.
///
/// `name` is kept exactly as it appears in the XML, entities included, so
/// that lookups compare the escaped form of a caller-supplied name against
/// it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub rel_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    Workbook,
    Sheets,
    Sheet,
}

pub struct WorkbookHandler {
    state: State,
    sheets: Vec<SheetEntry>,
}

impl WorkbookHandler {
    pub fn new() -> Self {
        Self {
            state: State::Start,
            sheets: Vec::new(),
        }
    }

    pub fn into_sheets(self) -> Vec<SheetEntry> {
        self.sheets
    }
}

impl Default for WorkbookHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlHandler for WorkbookHandler {
    fn on_start(
        &mut self,
        _ctl: &mut XmlControl,
        name: &[u8],
        attrs: Attributes<'_>,
    ) -> Result<()> {
        match self.state {
            State::Start => {
                if name == b"workbook" {
                    self.state = State::Workbook;
                }
            }
            State::Workbook => {
                if name == b"sheets" {
                    self.state = State::Sheets;
                }
            }
            State::Sheets => {
                if name == b"sheet" {
                    self.state = State::Sheet;

                    let mut sheet_name = None;
                    let mut rel_id = None;
                    for attr in attrs {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"name" => {
                                sheet_name =
                                    Some(String::from_utf8_lossy(&attr.value).into_owned());
                            }
                            b"r:id" => {
                                rel_id = Some(String::from_utf8_lossy(&attr.value).into_owned());
                            }
                            _ => {}
                        }
                    }

                    let (Some(name), Some(rel_id)) = (sheet_name, rel_id) else {
                        return Err(XlsxError::invalid("invalid sheet entry in workbook.xml"));
                    };
                    self.sheets.push(SheetEntry { name, rel_id });
                }
            }
            State::Sheet => {}
        }
        Ok(())
    }

    fn on_end(&mut self, ctl: &mut XmlControl, name: &[u8]) -> Result<()> {
        match self.state {
            State::Sheet => {
                if name == b"sheet" {
                    self.state = State::Sheets;
                }
            }
            State::Sheets => {
                if name == b"sheets" {
                    self.state = State::Workbook;
                }
            }
            State::Workbook => {
                if name == b"workbook" {
                    ctl.stop(false);
                }
            }
            State::Start => {}
        }
        Ok(())
    }
}
