//! The XLSX writer: schema-aware column projection to text and row-by-row
//! worksheet emission, followed by the static package parts.

use std::io::{Seek, Write};

use tabula_columnar::{DataChunk, LogicalType, Value};

use crate::cell::{column_letters, MAX_SHEET_ROWS};
use crate::package::PartWriter;
use crate::xml::{escape_xml, escape_xml_into};
use crate::{Result, XlsxError};

const MICROS_PER_DAY: f64 = 86_400_000_000.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_BETWEEN_1900_AND_1970: f64 = 25_569.0;

/// Writer-side options.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Display name of the sheet. Default `Sheet1`.
    pub sheet: String,
    /// Emit a header row built from the column names.
    pub header: bool,
    /// Override the per-sheet row ceiling. The format-wide limit always
    /// applies as an upper bound.
    pub sheet_row_limit: Option<u32>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sheet: "Sheet1".to_string(),
            header: false,
            sheet_row_limit: None,
        }
    }
}

struct SheetState {
    /// XML-escaped display name, ready for workbook.xml.
    name: String,
    /// File name within `xl/worksheets/`.
    file: String,
    /// Precomputed letters, one per column.
    column_letters: Vec<String>,
    column_names: Vec<String>,
    column_types: Vec<LogicalType>,
}

/// Streams sheets into a fresh XLSX package.
///
/// Lifecycle: [`XlsxWriter::begin_sheet`], then rows
/// (`begin_row`/`write_*_cell`/`end_row`), then [`XlsxWriter::end_sheet`];
/// repeat for more sheets; [`XlsxWriter::finish`] emits the remaining
/// package parts and closes the archive.
pub struct XlsxWriter<W: Write + Seek> {
    stream: PartWriter<W>,
    sheet_row_limit: u32,

    active: Option<SheetState>,
    written: Vec<SheetState>,

    row_idx: u32,
    row_str: String,
    col_idx: usize,
    escape_buf: String,
}

impl<W: Write + Seek> XlsxWriter<W> {
    pub fn new(sink: W, sheet_row_limit: Option<u32>) -> Self {
        Self {
            stream: PartWriter::new(sink),
            sheet_row_limit: sheet_row_limit.unwrap_or(MAX_SHEET_ROWS),
            active: None,
            written: Vec::new(),
            row_idx: 0,
            row_str: "1".to_string(),
            col_idx: 0,
            escape_buf: String::new(),
        }
    }

    pub fn begin_sheet(
        &mut self,
        sheet_name: &str,
        column_names: &[String],
        column_types: &[LogicalType],
    ) -> Result<()> {
        if self.active.is_some() {
            return Err(XlsxError::Internal(
                "begin_sheet called while a sheet is active".to_string(),
            ));
        }
        if column_names.len() != column_types.len() {
            return Err(XlsxError::Internal(
                "column name and type counts differ".to_string(),
            ));
        }

        if self.written.is_empty() {
            self.stream.add_directory("xl/")?;
            self.stream.add_directory("xl/worksheets/")?;
        }

        let sheet = SheetState {
            name: escape_xml(sheet_name),
            file: format!("sheet{}.xml", self.written.len() + 1),
            column_letters: (1..=column_names.len() as u32).map(column_letters).collect(),
            column_names: column_names.to_vec(),
            column_types: column_types.to_vec(),
        };

        self.stream
            .begin_file(&format!("xl/worksheets/{}", sheet.file))?;
        self.stream.write_str(WORKSHEET_XML_START)?;
        self.active = Some(sheet);
        Ok(())
    }

    pub fn end_sheet(&mut self) -> Result<()> {
        let Some(sheet) = self.active.take() else {
            return Err(XlsxError::Internal(
                "end_sheet called without an active sheet".to_string(),
            ));
        };
        self.stream.write_str("</sheetData></worksheet>")?;
        self.written.push(sheet);

        self.row_idx = 0;
        self.row_str = "1".to_string();
        self.col_idx = 0;
        Ok(())
    }

    pub fn begin_row(&mut self) -> Result<()> {
        self.stream
            .write_str(&format!("<row r=\"{}\">", self.row_str))?;
        Ok(())
    }

    pub fn end_row(&mut self) -> Result<()> {
        self.stream.write_str("</row>")?;
        self.col_idx = 0;

        self.row_idx += 1;
        self.row_str = (self.row_idx + 1).to_string();

        if self.row_idx > self.sheet_row_limit {
            if self.sheet_row_limit >= MAX_SHEET_ROWS {
                return Err(XlsxError::invalid(format!(
                    "sheet row limit of '{}' rows exceeded!\n\
                     * XLSX files and compatible applications generally have a limit of '{MAX_SHEET_ROWS}' rows\n\
                     * larger sheets can be exported at your own risk by setting the 'sheet_row_limit' option to a higher value",
                    self.sheet_row_limit
                )));
            }
            return Err(XlsxError::invalid(format!(
                "sheet row limit of '{}' rows exceeded!",
                self.sheet_row_limit
            )));
        }
        Ok(())
    }

    fn cell_ref(&self) -> Result<String> {
        let sheet = self.active.as_ref().ok_or_else(|| {
            XlsxError::Internal("cell written without an active sheet".to_string())
        })?;
        let letters = sheet.column_letters.get(self.col_idx).ok_or_else(|| {
            XlsxError::Internal("cell written past the sheet width".to_string())
        })?;
        Ok(format!("{letters}{}", self.row_str))
    }

    fn write_value_cell(&mut self, type_and_style: &str, value: &str) -> Result<()> {
        let cell_ref = self.cell_ref()?;
        self.stream
            .write_str(&format!("<c r=\"{cell_ref}\" {type_and_style}><v>"))?;
        self.stream.write_str(value)?;
        self.stream.write_str("</v></c>")?;
        self.col_idx += 1;
        Ok(())
    }

    pub fn write_number_cell(&mut self, value: &str) -> Result<()> {
        self.write_value_cell("t=\"n\"", value)
    }

    pub fn write_boolean_cell(&mut self, value: &str) -> Result<()> {
        self.write_value_cell("t=\"b\" s=\"5\"", value)
    }

    pub fn write_date_cell(&mut self, value: &str) -> Result<()> {
        self.write_value_cell("t=\"n\" s=\"1\"", value)
    }

    pub fn write_time_cell(&mut self, value: &str) -> Result<()> {
        self.write_value_cell("t=\"n\" s=\"3\"", value)
    }

    pub fn write_timestamp_cell(&mut self, value: &str) -> Result<()> {
        self.write_value_cell("t=\"n\" s=\"4\"", value)
    }

    pub fn write_timestamp_seconds_cell(&mut self, value: &str) -> Result<()> {
        self.write_value_cell("t=\"n\" s=\"2\"", value)
    }

    pub fn write_inline_string_cell(&mut self, value: &str) -> Result<()> {
        let cell_ref = self.cell_ref()?;
        self.stream
            .write_str(&format!("<c r=\"{cell_ref}\" t=\"inlineStr\"><is><t>"))?;
        self.escape_buf.clear();
        escape_xml_into(&mut self.escape_buf, value);
        let escaped = std::mem::take(&mut self.escape_buf);
        self.stream.write_str(&escaped)?;
        self.escape_buf = escaped;
        self.stream.write_str("</t></is></c>")?;
        self.col_idx += 1;
        Ok(())
    }

    pub fn write_empty_cell(&mut self) -> Result<()> {
        self.col_idx += 1;
        Ok(())
    }

    /// Emit a header row from the active sheet's column names.
    pub fn write_header_row(&mut self) -> Result<()> {
        let names = self
            .active
            .as_ref()
            .map(|sheet| sheet.column_names.clone())
            .ok_or_else(|| {
                XlsxError::Internal("header written without an active sheet".to_string())
            })?;
        self.begin_row()?;
        for name in &names {
            self.write_inline_string_cell(name)?;
        }
        self.end_row()
    }

    /// Project a typed batch to text and emit it row by row. Temporals are
    /// converted to Excel-serial doubles; booleans to integers; everything
    /// else to text.
    pub fn write_chunk(&mut self, chunk: &DataChunk) -> Result<()> {
        let types = self
            .active
            .as_ref()
            .map(|sheet| sheet.column_types.clone())
            .ok_or_else(|| {
                XlsxError::Internal("chunk written without an active sheet".to_string())
            })?;
        if chunk.column_count() != types.len() {
            return Err(XlsxError::Internal(
                "chunk width does not match the active sheet".to_string(),
            ));
        }

        for row in 0..chunk.len() {
            self.begin_row()?;
            for (col, &ty) in types.iter().enumerate() {
                let value = chunk.column(col).value(row);
                if value == Value::Null {
                    self.write_empty_cell()?;
                    continue;
                }
                match (ty, value) {
                    (LogicalType::Date, Value::Date(days)) => {
                        let serial = days as f64 + DAYS_BETWEEN_1900_AND_1970;
                        self.write_date_cell(&serial.to_string())?;
                    }
                    (LogicalType::Time, Value::Time(micros)) => {
                        let serial = micros as f64 / MICROS_PER_DAY;
                        self.write_time_cell(&serial.to_string())?;
                    }
                    (LogicalType::Timestamp, Value::Timestamp(micros)) => {
                        let serial =
                            micros as f64 / MICROS_PER_DAY + DAYS_BETWEEN_1900_AND_1970;
                        self.write_timestamp_cell(&serial.to_string())?;
                    }
                    (LogicalType::TimestampSeconds, Value::TimestampSeconds(secs)) => {
                        let serial = secs as f64 / SECONDS_PER_DAY + DAYS_BETWEEN_1900_AND_1970;
                        self.write_timestamp_seconds_cell(&serial.to_string())?;
                    }
                    (LogicalType::Boolean, Value::Boolean(b)) => {
                        self.write_boolean_cell(if b { "1" } else { "0" })?;
                    }
                    (LogicalType::BigInt, Value::BigInt(i)) => {
                        self.write_number_cell(&i.to_string())?;
                    }
                    (LogicalType::Double, Value::Double(f)) => {
                        self.write_number_cell(&f.to_string())?;
                    }
                    (_, value) => {
                        self.write_inline_string_cell(&tabula_columnar::cast::format_value(
                            &value,
                        ))?;
                    }
                }
            }
            self.end_row()?;
        }
        Ok(())
    }

    /// One-shot sink: a single sheet written from a stream of batches.
    pub fn write_table(
        sink: W,
        options: &WriteOptions,
        column_names: &[String],
        column_types: &[LogicalType],
        chunks: &[DataChunk],
    ) -> Result<W> {
        let mut writer = Self::new(sink, options.sheet_row_limit);
        writer.begin_sheet(&options.sheet, column_names, column_types)?;
        if options.header {
            writer.write_header_row()?;
        }
        for chunk in chunks {
            writer.write_chunk(chunk)?;
        }
        writer.end_sheet()?;
        writer.finish()
    }

    /// Emit the remaining package parts and close the archive.
    pub fn finish(mut self) -> Result<W> {
        if self.active.is_some() {
            return Err(XlsxError::Internal(
                "finish called while a sheet is active".to_string(),
            ));
        }

        self.write_workbook()?;
        self.write_rels()?;
        self.write_styles()?;
        self.write_shared_strings()?;
        self.write_props()?;
        self.write_content_types()?;

        self.stream.finish()
    }

    fn write_workbook(&mut self) -> Result<()> {
        self.stream.begin_file("xl/workbook.xml")?;
        self.stream.write_str(WORKBOOK_XML_START)?;
        // rId1..rId3 are reserved for theme/styles/sharedStrings.
        let mut rel_id = 4;
        let mut sheet_id = 1;
        for sheet in &self.written {
            self.stream.write_str(&format!(
                "<sheet name=\"{}\" state=\"visible\" sheetId=\"{sheet_id}\" r:id=\"rId{rel_id}\"/>",
                sheet.name
            ))?;
            sheet_id += 1;
            rel_id += 1;
        }
        self.stream.write_str(WORKBOOK_XML_END)?;
        Ok(())
    }

    fn write_rels(&mut self) -> Result<()> {
        self.stream.add_directory("xl/_rels/")?;
        self.stream.begin_file("xl/_rels/workbook.xml.rels")?;
        self.stream.write_str(WORKBOOK_RELS_XML_START)?;
        let mut rel_id = 4;
        for sheet in &self.written {
            self.stream.write_str(&format!(
                "<Relationship Id=\"rId{rel_id}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/{}\"/>",
                sheet.file
            ))?;
            rel_id += 1;
        }
        self.stream.write_str("</Relationships>")?;
        Ok(())
    }

    fn write_styles(&mut self) -> Result<()> {
        self.stream.begin_file("xl/styles.xml")?;
        self.stream.write_str(STYLES_XML)?;
        Ok(())
    }

    fn write_shared_strings(&mut self) -> Result<()> {
        // No writer-side shared strings; a stub keeps strict readers happy.
        self.stream.begin_file("xl/sharedStrings.xml")?;
        self.stream.write_str(SHARED_STRINGS_XML)?;
        Ok(())
    }

    fn write_props(&mut self) -> Result<()> {
        self.stream.begin_file("docProps/core.xml")?;
        self.stream.write_str(CORE_PROPS_XML)?;

        self.stream.begin_file("docProps/app.xml")?;
        self.stream.write_str(APP_PROPS_XML)?;

        self.stream.add_directory("_rels/")?;
        self.stream.begin_file("_rels/.rels")?;
        self.stream.write_str(ROOT_RELS_XML)?;
        Ok(())
    }

    fn write_content_types(&mut self) -> Result<()> {
        self.stream.begin_file("[Content_Types].xml")?;
        self.stream.write_str(CONTENT_TYPES_XML_START)?;
        for sheet in &self.written {
            self.stream.write_str(&format!(
                "<Override PartName=\"/xl/worksheets/{}\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
                sheet.file
            ))?;
        }
        self.stream.write_str("</Types>")?;
        Ok(())
    }
}

const WORKSHEET_XML_START: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheetData>"#;

const WORKBOOK_XML_START: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr/><sheets>"#;
const WORKBOOK_XML_END: &str = r#"</sheets><definedNames/><calcPr/></workbook>"#;

const WORKBOOK_RELS_XML_START: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#;

/// The fixed style catalogue covering every cell the writer emits:
/// 0 general, 1 date, 2 timestamp (seconds), 3 time, 4 timestamp (ms),
/// 5 boolean.
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="6">
<numFmt formatCode="General" numFmtId="164"/>
<numFmt formatCode="DD/MM/YY" numFmtId="165"/>
<numFmt formatCode="DD/MM/YYYY\ HH:MM:SS" numFmtId="166"/>
<numFmt formatCode="HH:MM:SS" numFmtId="167"/>
<numFmt formatCode="DD/MM/YYYY\ HH:MM:SS.000" numFmtId="168"/>
<numFmt formatCode="&quot;TRUE&quot;;&quot;TRUE&quot;;&quot;FALSE&quot;" numFmtId="169"/>
</numFmts>
<fonts count="1"><font><name val="Arial"/><family val="2"/><sz val="10"/></font></fonts>
<fills count="1"><fill><patternFill patternType="none"/></fill></fills>
<borders count="1"><border diagonalDown="false" diagonalUp="false"><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="164"></xf></cellStyleXfs>
<cellXfs count="6">
<xf numFmtId="164" xfId="0"/>
<xf numFmtId="165" xfId="0"/>
<xf numFmtId="166" xfId="0"/>
<xf numFmtId="167" xfId="0"/>
<xf numFmtId="168" xfId="0"/>
<xf numFmtId="169" xfId="0"/>
</cellXfs>
<cellStyles count="1"><cellStyle builtinId="0" customBuiltin="false" name="Normal" xfId="0"/></cellStyles>
</styleSheet>"#;

const SHARED_STRINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="0" uniqueCount="0"/>"#;

const CORE_PROPS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>tabula</dc:creator>
<cp:lastModifiedBy>tabula</cp:lastModifiedBy>
<cp:revision>1</cp:revision>
</cp:coreProperties>"#;

const APP_PROPS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
<Application>tabula</Application>
<TotalTime>0</TotalTime>
</Properties>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

const CONTENT_TYPES_XML_START: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-officedocument.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    use pretty_assertions::assert_eq;
    use zip::ZipArchive;

    fn part_text(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("open zip");
        let mut file = archive.by_name(name).expect("part exists");
        let mut out = String::new();
        file.read_to_string(&mut out).expect("read part");
        out
    }

    fn simple_package(rows: &[(&str, i64)]) -> Vec<u8> {
        let mut writer = XlsxWriter::new(Cursor::new(Vec::new()), None);
        writer
            .begin_sheet(
                "Sheet1",
                &["name".to_string(), "score".to_string()],
                &[LogicalType::Varchar, LogicalType::BigInt],
            )
            .unwrap();
        writer.write_header_row().unwrap();
        for (name, score) in rows {
            writer.begin_row().unwrap();
            writer.write_inline_string_cell(name).unwrap();
            writer.write_number_cell(&score.to_string()).unwrap();
            writer.end_row().unwrap();
        }
        writer.end_sheet().unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn emits_all_package_parts() {
        let bytes = simple_package(&[("a", 1)]);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "xl/workbook.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/styles.xml",
            "xl/sharedStrings.xml",
            "xl/worksheets/sheet1.xml",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing part {part}");
        }
    }

    #[test]
    fn sheet_cells_have_refs_types_and_styles() {
        let bytes = simple_package(&[("a", 1), ("b", 2)]);
        let sheet = part_text(&bytes, "xl/worksheets/sheet1.xml");

        assert!(sheet.contains(r#"<c r="A1" t="inlineStr"><is><t>name</t></is></c>"#));
        assert!(sheet.contains(r#"<c r="B2" t="n"><v>1</v></c>"#));
        assert!(sheet.contains(r#"<c r="A3" t="inlineStr"><is><t>b</t></is></c>"#));
        assert!(sheet.contains("</sheetData></worksheet>"));
    }

    #[test]
    fn workbook_relationships_start_at_rid4() {
        let bytes = simple_package(&[]);
        let workbook = part_text(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"<sheet name="Sheet1" state="visible" sheetId="1" r:id="rId4"/>"#));

        let rels = part_text(&bytes, "xl/_rels/workbook.xml.rels");
        assert!(rels.contains(r#"Id="rId4""#));
        assert!(rels.contains(r#"Target="worksheets/sheet1.xml""#));
    }

    #[test]
    fn sheet_names_are_escaped() {
        let mut writer = XlsxWriter::new(Cursor::new(Vec::new()), None);
        writer
            .begin_sheet("P&L <2024>", &["a".to_string()], &[LogicalType::Double])
            .unwrap();
        writer.end_sheet().unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let workbook = part_text(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="P&amp;L &lt;2024&gt;""#));
    }

    #[test]
    fn second_sheet_gets_next_file_and_rel_id() {
        let mut writer = XlsxWriter::new(Cursor::new(Vec::new()), None);
        for name in ["One", "Two"] {
            writer
                .begin_sheet(name, &["a".to_string()], &[LogicalType::Double])
                .unwrap();
            writer.end_sheet().unwrap();
        }
        let bytes = writer.finish().unwrap().into_inner();

        let workbook = part_text(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Two" state="visible" sheetId="2" r:id="rId5"/>"#));
        let types = part_text(&bytes, "[Content_Types].xml");
        assert!(types.contains("/xl/worksheets/sheet2.xml"));
    }

    #[test]
    fn caller_row_limit_is_enforced_with_its_own_message() {
        let mut writer = XlsxWriter::new(Cursor::new(Vec::new()), Some(2));
        writer
            .begin_sheet("Sheet1", &["a".to_string()], &[LogicalType::Double])
            .unwrap();
        for i in 0..2 {
            writer.begin_row().unwrap();
            writer.write_number_cell(&i.to_string()).unwrap();
            writer.end_row().unwrap();
        }
        writer.begin_row().unwrap();
        writer.write_number_cell("9").unwrap();
        let err = writer.end_row().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'2'"), "{message}");
        assert!(!message.contains("sheet_row_limit"), "{message}");
    }

    #[test]
    fn format_limit_message_suggests_the_override() {
        let writer: XlsxWriter<Cursor<Vec<u8>>> = XlsxWriter::new(Cursor::new(Vec::new()), None);
        assert_eq!(writer.sheet_row_limit, MAX_SHEET_ROWS);
    }

    #[test]
    fn write_chunk_projects_temporals_to_serials() {
        use tabula_columnar::Vector;

        let mut date_col = Vector::new(LogicalType::Date);
        date_col.push_value(Value::Date(18_993)); // 2022-01-01
        let mut bool_col = Vector::new(LogicalType::Boolean);
        bool_col.push_value(Value::Boolean(true));
        let chunk = DataChunk::from_columns(vec![date_col, bool_col]);

        let mut writer = XlsxWriter::new(Cursor::new(Vec::new()), None);
        writer
            .begin_sheet(
                "Sheet1",
                &["d".to_string(), "b".to_string()],
                &[LogicalType::Date, LogicalType::Boolean],
            )
            .unwrap();
        writer.write_chunk(&chunk).unwrap();
        writer.end_sheet().unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let sheet = part_text(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<c r="A1" t="n" s="1"><v>44562</v></c>"#), "{sheet}");
        assert!(sheet.contains(r#"<c r="B1" t="b" s="5"><v>1</v></c>"#), "{sheet}");
    }

    #[test]
    fn nulls_become_skipped_cells() {
        use tabula_columnar::Vector;

        let mut col_a = Vector::new(LogicalType::Double);
        col_a.push_null();
        let mut col_b = Vector::new(LogicalType::Double);
        col_b.push_value(Value::Double(2.5));
        let chunk = DataChunk::from_columns(vec![col_a, col_b]);

        let mut writer = XlsxWriter::new(Cursor::new(Vec::new()), None);
        writer
            .begin_sheet(
                "Sheet1",
                &["a".to_string(), "b".to_string()],
                &[LogicalType::Double, LogicalType::Double],
            )
            .unwrap();
        writer.write_chunk(&chunk).unwrap();
        writer.end_sheet().unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let sheet = part_text(&bytes, "xl/worksheets/sheet1.xml");
        assert!(!sheet.contains(r#"r="A1""#), "{sheet}");
        assert!(sheet.contains(r#"<c r="B1" t="n"><v>2.5</v></c>"#), "{sheet}");
    }
}
