//! The suspendable XML driver.
//!
//! A thin shell over the streaming XML parser that drives a single
//! [`XmlHandler`] at a time. The underlying parser is pull-based, which makes
//! the suspend/resume contract exact by construction: a suspension is simply
//! a return out of the event loop with the reader untouched, so no callback
//! can fire between a [`DriveStatus::Suspended`] result and the next
//! [`XmlDriver::drive`] call, and parsing resumes at the precise byte offset
//! it stopped at.

use std::io::BufRead;

use quick_xml::events::attributes::Attributes;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::{Result, XlsxError};

/// Outcome of one [`XmlDriver::drive`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveStatus {
    /// The document was consumed to the end.
    Finished,
    /// The handler stopped resumably; call [`XmlDriver::drive`] again to
    /// continue from the same position.
    Suspended,
    /// The handler stopped for good. Further drives are no-ops.
    Aborted,
}

/// Control surface handed to every handler callback.
#[derive(Debug, Default)]
pub struct XmlControl {
    text_enabled: bool,
    stop: Option<bool>,
}

impl XmlControl {
    /// Toggle delivery of character data to [`XmlHandler::on_text`].
    pub fn enable_text(&mut self, enable: bool) {
        self.text_enabled = enable;
    }

    /// Stop the enclosing drive. `resumable` decides whether the drive
    /// returns [`DriveStatus::Suspended`] or [`DriveStatus::Aborted`].
    pub fn stop(&mut self, resumable: bool) {
        self.stop = Some(resumable);
    }
}

/// Callbacks for one XML part. Tag names arrive with any namespace prefix
/// already stripped (`x:row` is dispatched as `row`); attribute names are
/// matched by the handlers by exact, case-sensitive qualified name.
pub trait XmlHandler {
    fn on_start(&mut self, ctl: &mut XmlControl, name: &[u8], attrs: Attributes<'_>)
        -> Result<()>;

    fn on_end(&mut self, ctl: &mut XmlControl, name: &[u8]) -> Result<()>;

    /// Character data, already unescaped. Only delivered while text is
    /// enabled through [`XmlControl::enable_text`].
    fn on_text(&mut self, _ctl: &mut XmlControl, _text: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DriverState {
    Running,
    Finished,
    Aborted,
}

/// Drives a handler over one XML byte stream.
pub struct XmlDriver<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    ctl: XmlControl,
    state: DriverState,
}

impl<R: BufRead> XmlDriver<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(false);
        Self {
            reader,
            buf: Vec::new(),
            ctl: XmlControl::default(),
            state: DriverState::Running,
        }
    }

    /// Run the handler until it stops or the document ends.
    pub fn drive<H: XmlHandler>(&mut self, handler: &mut H) -> Result<DriveStatus> {
        match self.state {
            DriverState::Finished => return Ok(DriveStatus::Finished),
            DriverState::Aborted => return Ok(DriveStatus::Aborted),
            DriverState::Running => {}
        }

        loop {
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(source) => {
                    return Err(XlsxError::Xml {
                        offset: self.reader.error_position(),
                        source,
                    });
                }
            };

            match event {
                Event::Start(ref e) => {
                    handler.on_start(&mut self.ctl, e.local_name().as_ref(), e.attributes())?;
                }
                Event::Empty(ref e) => {
                    let name = e.local_name();
                    handler.on_start(&mut self.ctl, name.as_ref(), e.attributes())?;
                    handler.on_end(&mut self.ctl, name.as_ref())?;
                }
                Event::End(ref e) => {
                    handler.on_end(&mut self.ctl, e.local_name().as_ref())?;
                }
                Event::Text(ref t) if self.ctl.text_enabled => {
                    let text = t.unescape().map_err(|source| XlsxError::Xml {
                        offset: self.reader.buffer_position(),
                        source,
                    })?;
                    handler.on_text(&mut self.ctl, &text)?;
                }
                Event::CData(ref c) => {
                    if self.ctl.text_enabled {
                        let text = String::from_utf8_lossy(c);
                        handler.on_text(&mut self.ctl, &text)?;
                    }
                }
                Event::Eof => {
                    self.state = DriverState::Finished;
                    self.buf.clear();
                    return Ok(DriveStatus::Finished);
                }
                _ => {}
            }

            self.buf.clear();

            if let Some(resumable) = self.ctl.stop.take() {
                if resumable {
                    return Ok(DriveStatus::Suspended);
                }
                self.state = DriverState::Aborted;
                return Ok(DriveStatus::Aborted);
            }
        }
    }

    /// Drive to completion, resuming over suspensions. This is what the
    /// one-shot part parsers use; the scan loop calls [`XmlDriver::drive`]
    /// directly so it can act on each suspension.
    pub fn drive_to_end<H: XmlHandler>(&mut self, handler: &mut H) -> Result<DriveStatus> {
        loop {
            match self.drive(handler)? {
                DriveStatus::Suspended => continue,
                status => return Ok(status),
            }
        }
    }
}

/// Escape `text` for use in XML content or attribute values. NUL bytes are
/// dropped entirely; they are not representable in XML at all.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_xml_into(&mut out, text);
    out
}

pub fn escape_xml_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\0' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
}
