//! `[Content_Types].xml` parser.

use quick_xml::events::attributes::Attributes;

use crate::xml::{XmlControl, XmlHandler};
use crate::{Result, XlsxError};

const WORKBOOK_CONTENT_TYPE: &[u8] =
    b"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const WORKSHEET_CONTENT_TYPE: &[u8] =
    b"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

/// Part paths discovered from the content-type overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentTypes {
    pub workbook_path: Option<String>,
    pub sheet_path: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    Types,
    Override,
    End,
}

/// Walks `Types -> Override` and captures the workbook-main and worksheet
/// override part names.
pub struct ContentTypesHandler {
    state: State,
    info: ContentTypes,
}

impl ContentTypesHandler {
    pub fn new() -> Self {
        Self {
            state: State::Start,
            info: ContentTypes::default(),
        }
    }

    pub fn into_result(self) -> ContentTypes {
        self.info
    }
}

impl Default for ContentTypesHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlHandler for ContentTypesHandler {
    fn on_start(
        &mut self,
        _ctl: &mut XmlControl,
        name: &[u8],
        attrs: Attributes<'_>,
    ) -> Result<()> {
        match self.state {
            State::Start => {
                if name == b"Types" {
                    self.state = State::Types;
                }
            }
            State::Types => {
                if name == b"Override" {
                    self.state = State::Override;

                    let mut content_type = None;
                    let mut part_name = None;
                    for attr in attrs {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"ContentType" => content_type = Some(attr.value.into_owned()),
                            b"PartName" => part_name = Some(attr.value.into_owned()),
                            _ => {}
                        }
                    }

                    let (Some(content_type), Some(part_name)) = (content_type, part_name) else {
                        return Err(XlsxError::invalid(
                            "invalid content type entry in [Content_Types].xml",
                        ));
                    };

                    let part_name = String::from_utf8_lossy(&part_name).into_owned();
                    if content_type == WORKBOOK_CONTENT_TYPE {
                        self.info.workbook_path = Some(part_name);
                    } else if content_type == WORKSHEET_CONTENT_TYPE {
                        self.info.sheet_path = Some(part_name);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_end(&mut self, ctl: &mut XmlControl, name: &[u8]) -> Result<()> {
        match self.state {
            State::Override => {
                if name == b"Override" {
                    self.state = State::Types;
                }
            }
            State::Types => {
                if name == b"Types" {
                    self.state = State::End;
                    ctl.stop(false);
                }
            }
            _ => {}
        }
        Ok(())
    }
}
