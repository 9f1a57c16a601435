use std::io::{Cursor, Write};

use pretty_assertions::assert_eq;
use tabula_columnar::{LogicalType, Value};
use tabula_xlsx::{ReadOptions, XlsxError, XlsxReader};
use zip::write::FileOptions;
use zip::ZipWriter;

fn build_zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let cursor = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(cursor);
    let options = FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, text) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(text.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn build_xlsx(sheet_xml: &str) -> Vec<u8> {
    build_zip_bytes(&[
        (
            "[Content_Types].xml",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
                <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
            </Types>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<workbook><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<Relationships>
                <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
            </Relationships>"#,
        ),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ])
}

#[test]
fn minimal_numeric_sheet_without_header() {
    let bytes = build_xlsx(
        r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="n"><v>1</v></c></row>
            <row r="2"><c r="A2" t="n"><v>2</v></c></row>
            <row r="3"><c r="A3" t="n"><v>3</v></c></row>
        </sheetData></worksheet>"#,
    );

    let mut reader = XlsxReader::open(Cursor::new(bytes), ReadOptions::default()).unwrap();
    assert_eq!(reader.schema().column_names, vec!["A1"]);
    assert_eq!(reader.schema().column_types, vec![LogicalType::Double]);

    let mut scan = reader.scan().unwrap();
    let chunk = scan.next_chunk().unwrap().expect("one batch");
    assert_eq!(chunk.len(), 3);
    assert_eq!(chunk.column(0).value(0), Value::Double(1.0));
    assert_eq!(chunk.column(0).value(1), Value::Double(2.0));
    assert_eq!(chunk.column(0).value(2), Value::Double(3.0));
    assert!(scan.next_chunk().unwrap().is_none());
}

#[test]
fn maybe_header_with_all_string_first_row() {
    let bytes = build_xlsx(
        r#"<worksheet><sheetData>
            <row r="1">
                <c r="A1" t="inlineStr"><is><t>id</t></is></c>
                <c r="B1" t="inlineStr"><is><t>name</t></is></c>
            </row>
            <row r="2"><c r="A2" t="n"><v>1</v></c><c r="B2" t="inlineStr"><is><t>x</t></is></c></row>
            <row r="3"><c r="A3" t="n"><v>2</v></c><c r="B3" t="inlineStr"><is><t>y</t></is></c></row>
        </sheetData></worksheet>"#,
    );

    let mut reader = XlsxReader::open(Cursor::new(bytes), ReadOptions::default()).unwrap();
    assert_eq!(reader.schema().column_names, vec!["id", "name"]);
    assert_eq!(
        reader.schema().column_types,
        vec![LogicalType::Double, LogicalType::Varchar]
    );

    let mut scan = reader.scan().unwrap();
    let chunk = scan.next_chunk().unwrap().expect("one batch");
    assert_eq!(chunk.len(), 2);
    assert_eq!(chunk.column(0).value(0), Value::Double(1.0));
    assert_eq!(chunk.column(1).str_at(0), Some("x"));
    assert_eq!(chunk.column(1).str_at(1), Some("y"));
}

#[test]
fn header_never_keeps_first_row_as_data() {
    let bytes = build_xlsx(
        r#"<worksheet><sheetData>
            <row r="1">
                <c r="A1" t="inlineStr"><is><t>id</t></is></c>
            </row>
            <row r="2"><c r="A2" t="inlineStr"><is><t>one</t></is></c></row>
        </sheetData></worksheet>"#,
    );

    let options = ReadOptions {
        header: tabula_xlsx::HeaderMode::Never,
        ..ReadOptions::default()
    };
    let mut reader = XlsxReader::open(Cursor::new(bytes), options).unwrap();
    assert_eq!(reader.schema().column_names, vec!["A1"]);

    let mut scan = reader.scan().unwrap();
    let chunk = scan.next_chunk().unwrap().expect("one batch");
    assert_eq!(chunk.len(), 2);
    assert_eq!(chunk.column(0).str_at(0), Some("id"));
    assert_eq!(chunk.column(0).str_at(1), Some("one"));
}

#[test]
fn stop_at_empty_is_the_default_without_a_range() {
    let bytes = build_xlsx(
        r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="n"><v>1</v></c></row>
            <row r="2"><c r="A2"/></row>
            <row r="3"><c r="A3" t="n"><v>3</v></c></row>
        </sheetData></worksheet>"#,
    );

    let mut reader = XlsxReader::open(Cursor::new(bytes), ReadOptions::default()).unwrap();
    let mut scan = reader.scan().unwrap();
    let chunk = scan.next_chunk().unwrap().expect("one batch");
    assert_eq!(chunk.len(), 1);
    assert!(scan.next_chunk().unwrap().is_none());
}

#[test]
fn sheet_lookup_failure_suggests_candidates() {
    let bytes = build_xlsx(r#"<worksheet><sheetData/></worksheet>"#);
    let options = ReadOptions {
        sheet: Some("Shet1".to_string()),
        ..ReadOptions::default()
    };
    let err = XlsxReader::open(Cursor::new(bytes), options).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("'Shet1' not found"), "{message}");
    assert!(message.contains("Sheet1"), "{message}");
    assert!(matches!(err, XlsxError::Binder(_)));
}

#[test]
fn missing_workbook_part_is_a_bind_error() {
    let bytes = build_zip_bytes(&[(
        "[Content_Types].xml",
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"></Types>"#,
    )]);
    let err = XlsxReader::open(Cursor::new(bytes), ReadOptions::default()).unwrap_err();
    assert!(matches!(err, XlsxError::Binder(_)), "got {err:?}");
}

#[test]
fn empty_sheet_without_range_is_a_bind_error() {
    let bytes = build_xlsx(r#"<worksheet><sheetData/></worksheet>"#);
    let err = XlsxReader::open(Cursor::new(bytes), ReadOptions::default()).unwrap_err();
    assert!(matches!(err, XlsxError::Binder(_)), "got {err:?}");
    assert!(err.to_string().contains("no rows"), "{err}");
}

#[test]
fn progress_is_monotone_and_bounded() {
    let mut rows = String::new();
    for r in 1..=500 {
        rows.push_str(&format!(r#"<row r="{r}"><c r="A{r}" t="n"><v>{r}</v></c></row>"#));
    }
    let bytes = build_xlsx(&format!(
        "<worksheet><sheetData>{rows}</sheetData></worksheet>"
    ));

    let mut reader = XlsxReader::open(Cursor::new(bytes), ReadOptions::default()).unwrap();
    let mut scan = reader.scan().unwrap();
    let progress = scan.progress();

    let mut last = 0.0_f64;
    while let Some(_chunk) = scan.next_chunk().unwrap() {
        let now = progress.percent();
        assert!(now >= last, "progress went backwards: {last} -> {now}");
        assert!(now <= 100.0);
        last = now;
    }
    assert!(progress.percent() <= 100.0);
}

#[test]
fn column_count_check_reports_both_sides() {
    let bytes = build_xlsx(
        r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="n"><v>1</v></c><c r="B1" t="n"><v>2</v></c></row>
        </sheetData></worksheet>"#,
    );
    let reader = XlsxReader::open(Cursor::new(bytes), ReadOptions::default()).unwrap();
    assert!(reader.expect_column_count(2).is_ok());
    let err = reader.expect_column_count(3).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("expected 3 columns but found 2"), "{message}");
}
