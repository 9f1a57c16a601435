//! The read orchestrator: binds options to a schema, then streams the
//! selected sheet into typed column batches.

use std::io::{Read, Seek};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, warn};

use tabula_columnar::{cast, DataChunk, LogicalType, Value, Vector};

use crate::cell::{column_letters, CellKind, CellPos, CellRange};
use crate::content_types::ContentTypesHandler;
use crate::materialize::{RowMaterializer, YieldReason};
use crate::package::{PartStream, XlsxPackage};
use crate::relationships::RelationshipsHandler;
use crate::shared_strings::{SharedStringsHandler, StringLoader, StringSearcher, StringTable};
use crate::sniff::{HeaderSniffer, RangeSniffer, SheetCell};
use crate::styles::{StyleSheet, StylesHandler};
use crate::workbook::WorkbookHandler;
use crate::worksheet::SheetDataHandler;
use crate::xml::{escape_xml, DriveStatus};
use crate::{Result, XlsxError};

pub use crate::sniff::HeaderMode;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

const MICROS_PER_DAY: i64 = 86_400_000_000;
const DAYS_BETWEEN_1900_AND_1970: f64 = 25_569.0;

/// Caller-facing scan options; see the format documentation for defaults.
#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Sheet display name; the primary (first) sheet when empty.
    pub sheet: Option<String>,
    pub header: HeaderMode,
    /// Skip type inference; every column reads as text.
    pub all_varchar: bool,
    /// Null failing cells instead of raising conversion errors.
    pub ignore_errors: bool,
    /// Explicit `A1:Z9` range; supersedes range sniffing.
    pub range: Option<String>,
    /// End the scan at the first all-empty row. Defaults to true unless an
    /// explicit range was given.
    pub stop_at_empty: Option<bool>,
    /// Pad synthesized/empty cells as inline strings rather than numbers.
    pub empty_as_varchar: bool,
}

/// The bound schema: what the scan will produce.
#[derive(Clone, Debug)]
pub struct XlsxSchema {
    pub column_names: Vec<String>,
    pub column_types: Vec<LogicalType>,
    /// The XLSX-side cell kind each column was inferred from.
    pub source_kinds: Vec<CellKind>,
    /// Data range, header row excluded.
    pub content_range: CellRange,
}

/// Convert an Excel serial day number to microseconds since the Unix epoch,
/// saturating at the representable range. The 1900 leap-year legacy is
/// intentionally not compensated.
pub fn excel_serial_to_epoch_micros(serial: f64) -> i64 {
    if !serial.is_finite() {
        return 0;
    }
    let micros = (serial - DAYS_BETWEEN_1900_AND_1970) * MICROS_PER_DAY as f64;
    micros.round() as i64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn candidates_message(wanted: &str, names: &[String]) -> String {
    let mut ranked: Vec<(usize, &String)> = names
        .iter()
        .map(|name| (levenshtein(wanted, name), name))
        .collect();
    ranked.sort_by_key(|(dist, _)| *dist);
    let suggestions: Vec<String> = ranked
        .iter()
        .take(3)
        .map(|(_, name)| {
            let display = quick_xml::escape::unescape(name)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| name.to_string());
            format!("'{display}'")
        })
        .collect();
    if suggestions.is_empty() {
        String::new()
    } else {
        format!("\nCandidate sheets: {}", suggestions.join(", "))
    }
}

/// Sheet display names (as stored, escapes included) mapped to worksheet
/// part paths, in workbook order.
fn parse_file_meta<R: Read + Seek>(package: &mut XlsxPackage<R>) -> Result<Vec<(String, String)>> {
    let mut content_types = ContentTypesHandler::new();
    package.drive_part(CONTENT_TYPES_PART, &mut content_types)?;
    // The override paths are not used directly; parsing the part still
    // validates that this is a spreadsheet package.
    let _ = content_types.into_result();

    let mut workbook = WorkbookHandler::new();
    package.drive_part(WORKBOOK_PART, &mut workbook)?;
    let sheets = workbook.into_sheets();

    let mut rels = RelationshipsHandler::new();
    package.drive_part(WORKBOOK_RELS_PART, &mut rels)?;
    let relationships = rels.into_relationships();

    let mut resolved = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let Some(rel) = relationships
            .iter()
            .find(|rel| rel.id == sheet.rel_id && rel.rel_type.ends_with("/worksheet"))
        else {
            continue;
        };
        // Normalize targets to package-absolute paths.
        let path = if let Some(stripped) = rel.target.strip_prefix("/xl/") {
            format!("xl/{stripped}")
        } else if let Some(stripped) = rel.target.strip_prefix('/') {
            stripped.to_string()
        } else {
            format!("xl/{}", rel.target)
        };
        resolved.push((sheet.name, path));
    }

    if resolved.is_empty() {
        return Err(XlsxError::binder(
            "no sheets found in xlsx file (is the file corrupt?)",
        ));
    }
    Ok(resolved)
}

fn infer_column_type(
    cell: &SheetCell,
    all_varchar: bool,
    styles: &StyleSheet,
) -> Result<LogicalType> {
    if all_varchar {
        return Ok(LogicalType::Varchar);
    }
    Ok(match cell.kind {
        // A number's logical type depends on the cell style: some styles
        // are dates, some times, some plain doubles.
        CellKind::Number => styles
            .format(cell.style as usize)
            .unwrap_or(LogicalType::Double),
        CellKind::Boolean => LogicalType::Boolean,
        CellKind::SharedString
        | CellKind::InlineString
        | CellKind::FormulaString
        | CellKind::Error => LogicalType::Varchar,
        CellKind::Date => LogicalType::Date,
        CellKind::Unknown => {
            return Err(XlsxError::binder("unknown cell type in xlsx file"));
        }
    })
}

/// A bound XLSX scan: schema resolved, package open, ready to stream.
#[derive(Debug)]
pub struct XlsxReader<R: Read + Seek> {
    package: XlsxPackage<R>,
    schema: XlsxSchema,
    sheet_path: String,
    stop_at_empty: bool,
    explicit_range: bool,
    ignore_errors: bool,
}

impl<R: Read + Seek> XlsxReader<R> {
    /// Bind phase: resolve the sheet, sniff range and header, infer the
    /// schema. All binder errors surface here, before any row is produced.
    pub fn open(reader: R, options: ReadOptions) -> Result<Self> {
        let mut package = XlsxPackage::open(reader)?;
        let sheets = parse_file_meta(&mut package)?;

        // Resolve the target sheet. Caller-supplied names are compared in
        // their XML-escaped form, which is how the workbook stores them.
        let (sheet_name, sheet_path) = match &options.sheet {
            Some(wanted) => {
                let escaped = escape_xml(wanted);
                let names: Vec<String> = sheets.iter().map(|(name, _)| name.clone()).collect();
                let Some(found) = sheets.into_iter().find(|(name, _)| *name == escaped) else {
                    return Err(XlsxError::binder(format!(
                        "sheet '{wanted}' not found in xlsx file{}",
                        candidates_message(&escaped, &names)
                    )));
                };
                found
            }
            None => sheets.into_iter().next().expect("sheet list is non-empty"),
        };
        debug!("resolved sheet {sheet_name:?} to {sheet_path}");

        let mut style_sheet = StyleSheet::default();
        if package.has_part(STYLES_PART) {
            let mut styles = StylesHandler::new();
            package.drive_part(STYLES_PART, &mut styles)?;
            style_sheet = styles.into_style_sheet();
        }

        // Range: explicit option wins, otherwise sniff the sheet.
        let explicit_range = options.range.is_some();
        let range = match &options.range {
            Some(text) => {
                let parsed = CellRange::parse(text)
                    .filter(CellRange::is_valid)
                    .ok_or_else(|| {
                        XlsxError::binder(format!("invalid range '{text}' specified"))
                    })?;
                // The caller writes inclusive bounds.
                CellRange::new(
                    parsed.beg.row,
                    parsed.beg.col,
                    parsed.end.row + 1,
                    parsed.end.col + 1,
                )
            }
            None => {
                let mut sniffer = SheetDataHandler::new(RangeSniffer::new());
                package.drive_part(&sheet_path, &mut sniffer)?;
                let range = sniffer.into_visitor().range();
                debug!("sniffed range {:?}..{:?}", range.beg, range.end);
                range
            }
        };

        let default_kind = if options.empty_as_varchar {
            CellKind::InlineString
        } else {
            CellKind::Number
        };

        let mut sniffer = SheetDataHandler::new(HeaderSniffer::new(
            range,
            options.header,
            explicit_range,
            default_kind,
        ));
        package.drive_part(&sheet_path, &mut sniffer)?;
        let (content_range, mut header_cells, mut column_cells) =
            sniffer.into_visitor().into_parts();

        if column_cells.is_empty() {
            if header_cells.is_empty() {
                if !explicit_range {
                    return Err(XlsxError::binder("no rows found in xlsx file"));
                }
                // A fully empty explicit range still binds: letter-named
                // columns over an empty data row.
                for col in range.beg.col..range.end.col {
                    let pos = CellPos::new(range.beg.row, col);
                    header_cells.push(SheetCell {
                        pos,
                        kind: CellKind::InlineString,
                        text: column_letters(col),
                        style: 0,
                    });
                }
            }
            // A header row without data rows binds to an empty relation of
            // the padded default kind.
            column_cells = header_cells
                .iter()
                .map(|cell| SheetCell {
                    pos: cell.pos,
                    kind: default_kind,
                    text: String::new(),
                    style: 0,
                })
                .collect();
        }

        resolve_header_strings(&mut package, &mut header_cells)?;

        let mut column_names = Vec::with_capacity(header_cells.len());
        for cell in &header_cells {
            column_names.push(cell.text.clone());
        }

        let mut column_types = Vec::with_capacity(column_cells.len());
        let mut source_kinds = Vec::with_capacity(column_cells.len());
        for cell in &column_cells {
            column_types.push(infer_column_type(cell, options.all_varchar, &style_sheet)?);
            source_kinds.push(cell.kind);
        }

        Ok(Self {
            package,
            schema: XlsxSchema {
                column_names,
                column_types,
                source_kinds,
                content_range,
            },
            sheet_path,
            stop_at_empty: options.stop_at_empty.unwrap_or(!explicit_range),
            explicit_range,
            ignore_errors: options.ignore_errors,
        })
    }

    pub fn schema(&self) -> &XlsxSchema {
        &self.schema
    }

    /// Check the bound schema against a caller-declared one, as a COPY FROM
    /// style binding does. Only the column count is enforced; types are
    /// cast per batch.
    pub fn expect_column_count(&self, expected: usize) -> Result<()> {
        let found = self.schema.column_types.len();
        if expected == found {
            return Ok(());
        }
        let sheet_schema: Vec<String> = self
            .schema
            .column_names
            .iter()
            .zip(&self.schema.column_types)
            .map(|(name, ty)| format!("{name} {ty}"))
            .collect();
        Err(XlsxError::binder(format!(
            "column count mismatch: expected {expected} columns but found {found}\n\
             XLSX schema: {}\n\
             An explicit range option with the expected width can override the sniffed one",
            sheet_schema.join(", ")
        )))
    }

    /// Execute phase: preload shared strings and open the sheet for
    /// streaming. The returned scan borrows the reader until dropped.
    pub fn scan(&mut self) -> Result<SheetScan<'_>> {
        let mut strings = StringTable::new();
        if self.package.has_part(SHARED_STRINGS_PART) {
            let mut loader = SharedStringsHandler::new(StringLoader::new(&mut strings));
            self.package.drive_part(SHARED_STRINGS_PART, &mut loader)?;
        }

        let column_types = self.schema.column_types.clone();
        let source_kinds = self.schema.source_kinds.clone();
        let content_range = self.schema.content_range;
        let stop_at_empty = self.stop_at_empty;
        let explicit_range = self.explicit_range;
        let ignore_errors = self.ignore_errors;

        let stream = self.package.open_part(&self.sheet_path)?;
        let progress = ScanProgress {
            consumed: stream.consumed_handle(),
            entry_len: stream.entry_len(),
        };

        Ok(SheetScan {
            stream,
            handler: SheetDataHandler::new(RowMaterializer::new(
                content_range,
                Arc::new(strings),
                stop_at_empty,
            )),
            column_types,
            source_kinds,
            stop_at_empty,
            explicit_range,
            ignore_errors,
            state: ScanState::Streaming,
            progress,
        })
    }
}

/// Bytes-consumed progress, shared with observer threads.
#[derive(Clone, Debug)]
pub struct ScanProgress {
    consumed: Arc<AtomicU64>,
    entry_len: u64,
}

impl ScanProgress {
    /// Percentage of the sheet entry consumed, in `0.0..=100.0`.
    pub fn percent(&self) -> f64 {
        if self.entry_len == 0 {
            return 0.0;
        }
        let consumed = self.consumed.load(Ordering::Relaxed) as f64;
        (consumed / self.entry_len as f64 * 100.0).min(100.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    /// Rows are still coming off the sheet stream.
    Streaming,
    /// The stream ended; an explicit range is being padded to its end.
    Filling,
    /// No more input; emit whatever the batch holds, then finish.
    Draining,
    Done,
}

/// A streaming scan over one sheet. Yields one [`DataChunk`] at a time.
pub struct SheetScan<'a> {
    stream: PartStream<'a>,
    handler: SheetDataHandler<RowMaterializer>,
    column_types: Vec<LogicalType>,
    source_kinds: Vec<CellKind>,
    stop_at_empty: bool,
    explicit_range: bool,
    ignore_errors: bool,
    state: ScanState,
    progress: ScanProgress,
}

impl SheetScan<'_> {
    pub fn progress(&self) -> ScanProgress {
        self.progress.clone()
    }

    /// Produce the next batch, or `None` once the scan is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<DataChunk>> {
        if self.state == ScanState::Done {
            return Ok(None);
        }

        while self.state == ScanState::Streaming
            && !self.handler.visitor().chunk().is_full()
        {
            // Padding owed from a row-number jump takes priority over
            // feeding the parser.
            if self.handler.visitor().found_skipped_row() {
                if self.stop_at_empty {
                    // A jump implies empty rows in between; the scan ends.
                    self.state = ScanState::Draining;
                    break;
                }
                self.handler.visitor_mut().skip_rows();
                continue;
            }

            match self.stream.drive(&mut self.handler)? {
                DriveStatus::Suspended => {
                    match self.handler.visitor_mut().take_yield_reason() {
                        Some(YieldReason::ChunkFull) | Some(YieldReason::SkippedRow) => {}
                        reason => {
                            return Err(XlsxError::Internal(format!(
                                "sheet scan suspended without a yield reason ({reason:?})"
                            )));
                        }
                    }
                }
                DriveStatus::Aborted | DriveStatus::Finished => {
                    let empty_row = self.handler.visitor_mut().take_yield_reason()
                        == Some(YieldReason::EmptyRow);
                    self.state = if !empty_row && self.explicit_range {
                        ScanState::Filling
                    } else {
                        ScanState::Draining
                    };
                }
            }
        }

        if self.state == ScanState::Filling && !self.handler.visitor().chunk().is_full() {
            let materializer = self.handler.visitor_mut();
            materializer.fill_rows();
            if materializer.range_exhausted() {
                self.state = ScanState::Draining;
            }
        }

        if self.handler.visitor().chunk().is_empty() {
            self.state = ScanState::Done;
            return Ok(None);
        }

        let chunk = self.cast_chunk()?;
        self.handler.visitor_mut().reset_chunk();
        if self.state == ScanState::Draining {
            self.state = ScanState::Done;
        }
        Ok(Some(chunk))
    }

    /// Cast the materialized text batch to the bound column types.
    fn cast_chunk(&mut self) -> Result<DataChunk> {
        let materializer = self.handler.visitor();
        let text = materializer.chunk();
        let rows = text.len();

        let mut columns = Vec::with_capacity(self.column_types.len());
        for (col_idx, (&target, &kind)) in self
            .column_types
            .iter()
            .zip(&self.source_kinds)
            .enumerate()
        {
            let mut vector = Vector::with_capacity(target, rows);
            for row in 0..rows {
                let Some(cell_text) = text.cell(row, col_idx) else {
                    vector.push_null();
                    continue;
                };

                let value = if target == LogicalType::Varchar {
                    // Same representation on both sides: reference the
                    // handle, no copy, no parse.
                    Ok(Value::Varchar(Arc::clone(cell_text)))
                } else if kind == CellKind::Number && target.is_temporal() {
                    cast::parse_double(cell_text.trim())
                        .map(|serial| serial_to_value(serial, target))
                } else {
                    cast::cast_text(cell_text, target)
                };

                match value {
                    Ok(value) => vector.push_value(value),
                    Err(detail) if self.ignore_errors => {
                        warn!(
                            "nulling cell '{}': {detail}",
                            materializer.cell_name(row, col_idx)
                        );
                        vector.push_null();
                    }
                    Err(detail) => {
                        return Err(XlsxError::conversion(format!(
                            "cell '{}': {detail}",
                            materializer.cell_name(row, col_idx)
                        )));
                    }
                }
            }
            columns.push(vector);
        }

        Ok(DataChunk::from_columns(columns))
    }
}

fn serial_to_value(serial: f64, target: LogicalType) -> Value {
    let micros = excel_serial_to_epoch_micros(serial);
    match target {
        LogicalType::Date => Value::Date(micros.div_euclid(MICROS_PER_DAY) as i32),
        LogicalType::Time => Value::Time(micros.rem_euclid(MICROS_PER_DAY)),
        LogicalType::Timestamp => Value::Timestamp(micros),
        LogicalType::TimestampSeconds => {
            Value::TimestampSeconds(micros.div_euclid(1_000_000))
        }
        _ => unreachable!("serial conversion only targets temporal types"),
    }
}

/// Resolve header cells that are shared-string references through the
/// searcher specialization.
fn resolve_header_strings<R: Read + Seek>(
    package: &mut XlsxPackage<R>,
    header_cells: &mut [SheetCell],
) -> Result<()> {
    let mut targets = Vec::new();
    let mut positions = Vec::new();
    for (idx, cell) in header_cells.iter().enumerate() {
        if cell.kind == CellKind::SharedString {
            let ssi = cell.text.trim().parse::<u32>().map_err(|_| {
                XlsxError::invalid(format!("invalid shared string index: '{}'", cell.text))
            })?;
            targets.push(ssi);
            positions.push((idx, ssi));
        }
    }
    if targets.is_empty() {
        return Ok(());
    }

    let mut searcher = SharedStringsHandler::new(StringSearcher::new(targets));
    package.drive_part(SHARED_STRINGS_PART, &mut searcher)?;
    let found = searcher.into_sink().into_found();

    for (idx, ssi) in positions {
        let Some(text) = found.get(&ssi) else {
            return Err(XlsxError::invalid(format!(
                "shared string index {ssi} out of range"
            )));
        };
        header_cells[idx].text = text.clone();
    }
    Ok(())
}
