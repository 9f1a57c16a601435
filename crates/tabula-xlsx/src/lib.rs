//! Streaming XLSX table source/sink.
//!
//! The crate turns the worksheet parts of an XLSX package into fixed-size
//! typed column batches and writes such batches back into a minimal valid
//! package. The read side is a suspendable pipeline:
//!
//! - [`XmlDriver`]: a thin suspend/resume shell over the streaming XML
//!   parser, dispatching start/end/text callbacks to one handler at a time.
//! - Part parsers: small state machines for `[Content_Types].xml`,
//!   `xl/workbook.xml`, `*.rels`, `xl/styles.xml` and
//!   `xl/sharedStrings.xml`, each run to completion over a single ZIP entry.
//! - Worksheet passes: a shared `sheetData` walker specialized into a range
//!   sniffer, a header sniffer and the row materializer that fills text
//!   batches for downstream casting.
//! - [`XlsxReader`]: binds options to a schema (three discovery passes over
//!   the package) and then streams the selected sheet chunk by chunk,
//!   resolving shared strings and applying per-column casts including
//!   Excel-serial date conversion.
//! - [`XlsxWriter`]: schema-aware sink emitting one worksheet per
//!   `begin_sheet`/`end_sheet` pair plus the surrounding package parts.
//!
//! Formulas, rich styling, charts, comments and encryption are out of scope;
//! number formats are interpreted only as far as they type numeric cells as
//! dates, times or timestamps.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod cell;
mod content_types;
mod materialize;
mod package;
mod read;
mod relationships;
mod shared_strings;
mod sniff;
mod styles;
mod workbook;
mod worksheet;
mod write;
pub mod xml;

pub use crate::cell::{
    column_index, column_letters, CellKind, CellPos, CellRange, MAX_CELL_TEXT, MAX_SHEET_COLS,
    MAX_SHEET_ROWS,
};
pub use crate::content_types::{ContentTypes, ContentTypesHandler};
pub use crate::materialize::{RowMaterializer, TextChunk, YieldReason};
pub use crate::package::{PartStream, PartWriter, XlsxPackage};
pub use crate::read::{
    excel_serial_to_epoch_micros, HeaderMode, ReadOptions, ScanProgress, SheetScan, XlsxReader,
    XlsxSchema,
};
pub use crate::relationships::{Relationship, RelationshipsHandler};
pub use crate::shared_strings::{
    SharedStringsHandler, StringLoader, StringSearcher, StringSink, StringTable,
};
pub use crate::sniff::{HeaderSniffer, RangeSniffer, SheetCell};
pub use crate::styles::{StyleSheet, StylesHandler};
pub use crate::workbook::{SheetEntry, WorkbookHandler};
pub use crate::worksheet::{RawCell, SheetDataHandler, SheetVisitor};
pub use crate::write::{WriteOptions, XlsxWriter};
pub use crate::xml::{escape_xml, DriveStatus, XmlControl, XmlDriver, XmlHandler};

/// Errors surfaced at the crate boundary.
///
/// The variants mirror the pipeline's failure classes: I/O and container
/// failures, malformed XML (fatal, with the byte offset the parser stopped
/// at), malformed part content, bind-phase errors, per-cell conversion
/// failures and internal invariant violations.
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("xml parse error at byte {offset}: {source}")]
    Xml {
        offset: u64,
        source: quick_xml::Error,
    },
    #[error("xml error: {0}")]
    XmlContent(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("binder error: {0}")]
    Binder(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl XlsxError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        XlsxError::Invalid(msg.into())
    }

    pub(crate) fn binder(msg: impl Into<String>) -> Self {
        XlsxError::Binder(msg.into())
    }

    pub(crate) fn conversion(msg: impl Into<String>) -> Self {
        XlsxError::Conversion(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, XlsxError>;
