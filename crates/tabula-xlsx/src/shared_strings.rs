//! The shared-strings table and the `xl/sharedStrings.xml` parsers.

use std::collections::HashMap;
use std::sync::Arc;

use quick_xml::events::attributes::Attributes;

use crate::xml::{XmlControl, XmlHandler};
use crate::Result;

/// Insertion-ordered set of strings with dense-index lookup.
///
/// Indices are insertion order; `add` of a repeated string returns the
/// existing index. Handles handed out by [`StringTable::get`] are reference
/// counted and stay valid for as long as the caller keeps them, so a scan can
/// point batch cells straight at table entries without copying.
#[derive(Debug, Default)]
pub struct StringTable {
    index: Vec<Arc<str>>,
    map: HashMap<Arc<str>, u32>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity hint only; does not change semantics.
    pub fn reserve(&mut self, count: usize) {
        self.index.reserve(count);
        self.map.reserve(count);
    }

    pub fn add(&mut self, text: &str) -> u32 {
        if let Some(&idx) = self.map.get(text) {
            return idx;
        }
        let idx = self.index.len() as u32;
        let handle: Arc<str> = Arc::from(text);
        self.index.push(Arc::clone(&handle));
        self.map.insert(handle, idx);
        idx
    }

    pub fn get(&self, idx: u32) -> Option<&Arc<str>> {
        self.index.get(idx as usize)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Receiver for the strings the parser walks over.
pub trait StringSink {
    fn on_unique_count(&mut self, _count: usize) {}

    /// Called once per completed `<si>` entry. The sink may stop the parse.
    fn on_string(&mut self, ctl: &mut XmlControl, text: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    Sst,
    Si,
    T,
}

/// Walks `sst -> si -> t`, accumulating character data and emitting each
/// completed string at `</si>`. Rich-text runs concatenate their `<t>`
/// fragments into one string.
pub struct SharedStringsHandler<S: StringSink> {
    state: State,
    text: String,
    sink: S,
}

impl<S: StringSink> SharedStringsHandler<S> {
    pub fn new(sink: S) -> Self {
        Self {
            state: State::Start,
            text: String::new(),
            sink,
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: StringSink> XmlHandler for SharedStringsHandler<S> {
    fn on_start(
        &mut self,
        ctl: &mut XmlControl,
        name: &[u8],
        attrs: Attributes<'_>,
    ) -> Result<()> {
        match self.state {
            State::Start => {
                if name == b"sst" {
                    self.state = State::Sst;
                    for attr in attrs {
                        let attr = attr?;
                        if attr.key.as_ref() == b"uniqueCount" {
                            if let Ok(count) = attr.unescape_value()?.trim().parse::<usize>() {
                                self.sink.on_unique_count(count);
                            }
                        }
                    }
                }
            }
            State::Sst => {
                if name == b"si" {
                    self.state = State::Si;
                }
            }
            State::Si => {
                if name == b"t" {
                    self.state = State::T;
                    ctl.enable_text(true);
                }
            }
            State::T => {}
        }
        Ok(())
    }

    fn on_end(&mut self, ctl: &mut XmlControl, name: &[u8]) -> Result<()> {
        match self.state {
            State::T => {
                if name == b"t" {
                    ctl.enable_text(false);
                    self.state = State::Si;
                }
            }
            State::Si => {
                if name == b"si" {
                    self.state = State::Sst;
                    self.sink.on_string(ctl, &self.text);
                    self.text.clear();
                }
            }
            State::Sst => {
                if name == b"sst" {
                    ctl.stop(false);
                }
            }
            State::Start => {}
        }
        Ok(())
    }

    fn on_text(&mut self, _ctl: &mut XmlControl, text: &str) -> Result<()> {
        self.text.push_str(text);
        Ok(())
    }
}

/// Sink that loads the whole table for row materialization.
pub struct StringLoader<'t> {
    table: &'t mut StringTable,
}

impl<'t> StringLoader<'t> {
    pub fn new(table: &'t mut StringTable) -> Self {
        Self { table }
    }
}

impl StringSink for StringLoader<'_> {
    fn on_unique_count(&mut self, count: usize) {
        self.table.reserve(count);
    }

    fn on_string(&mut self, _ctl: &mut XmlControl, text: &str) {
        self.table.add(text);
    }
}

/// Sink that resolves a fixed set of indices (header cells) and stops the
/// parse as soon as the last one has been passed.
pub struct StringSearcher {
    targets: Vec<u32>,
    next_target: usize,
    current: u32,
    found: HashMap<u32, String>,
}

impl StringSearcher {
    pub fn new(mut targets: Vec<u32>) -> Self {
        targets.sort_unstable();
        targets.dedup();
        Self {
            targets,
            next_target: 0,
            current: 0,
            found: HashMap::new(),
        }
    }

    pub fn into_found(self) -> HashMap<u32, String> {
        self.found
    }
}

impl StringSink for StringSearcher {
    fn on_string(&mut self, ctl: &mut XmlControl, text: &str) {
        if self.next_target >= self.targets.len() {
            ctl.stop(false);
            return;
        }
        if self.targets[self.next_target] == self.current {
            self.found.insert(self.current, text.to_string());
            self.next_target += 1;
        }
        self.current += 1;
    }
}
