//! `.rels` parser.

use quick_xml::events::attributes::Attributes;

use crate::xml::{XmlControl, XmlHandler};
use crate::{Result, XlsxError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    Relationships,
    Relationship,
}

pub struct RelationshipsHandler {
    state: State,
    relationships: Vec<Relationship>,
}

impl RelationshipsHandler {
    pub fn new() -> Self {
        Self {
            state: State::Start,
            relationships: Vec::new(),
        }
    }

    pub fn into_relationships(self) -> Vec<Relationship> {
        self.relationships
    }
}

impl Default for RelationshipsHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlHandler for RelationshipsHandler {
    fn on_start(
        &mut self,
        _ctl: &mut XmlControl,
        name: &[u8],
        attrs: Attributes<'_>,
    ) -> Result<()> {
        match self.state {
            State::Start => {
                if name == b"Relationships" {
                    self.state = State::Relationships;
                }
            }
            State::Relationships => {
                if name == b"Relationship" {
                    self.state = State::Relationship;

                    let mut id = None;
                    let mut rel_type = None;
                    let mut target = None;
                    for attr in attrs {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                            b"Type" => rel_type = Some(attr.unescape_value()?.into_owned()),
                            b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                            _ => {}
                        }
                    }

                    let (Some(id), Some(rel_type), Some(target)) = (id, rel_type, target) else {
                        return Err(XlsxError::invalid("invalid relationship entry in .rels"));
                    };
                    self.relationships.push(Relationship {
                        id,
                        rel_type,
                        target,
                    });
                }
            }
            State::Relationship => {}
        }
        Ok(())
    }

    fn on_end(&mut self, ctl: &mut XmlControl, name: &[u8]) -> Result<()> {
        match self.state {
            State::Relationship => {
                if name == b"Relationship" {
                    self.state = State::Relationships;
                }
            }
            State::Relationships => {
                if name == b"Relationships" {
                    ctl.stop(false);
                }
            }
            State::Start => {}
        }
        Ok(())
    }
}
