use std::io::{Cursor, Write};

use pretty_assertions::assert_eq;
use tabula_columnar::LogicalType;
use tabula_xlsx::{ReadOptions, XlsxReader};
use zip::write::FileOptions;
use zip::ZipWriter;

fn build_xlsx(sheet_xml: &str, shared_strings_xml: &str) -> Vec<u8> {
    let cursor = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(cursor);
    let options = FileOptions::<()>::default().compression_method(zip::CompressionMethod::Deflated);

    let entries = [
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
        ("xl/sharedStrings.xml", shared_strings_xml),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ];
    for (name, text) in entries {
        zip.start_file(name, options).unwrap();
        zip.write_all(text.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

#[test]
fn shared_string_cells_resolve_through_the_table() {
    let bytes = build_xlsx(
        r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c></row>
            <row r="2"><c r="A2" t="s"><v>1</v></c></row>
            <row r="3"><c r="A3" t="s"><v>0</v></c></row>
        </sheetData></worksheet>"#,
        r#"<sst count="3" uniqueCount="2"><si><t>alpha</t></si><si><t>beta</t></si></sst>"#,
    );

    let options = ReadOptions {
        all_varchar: true,
        ..ReadOptions::default()
    };
    let mut reader = XlsxReader::open(Cursor::new(bytes), options).unwrap();
    assert_eq!(reader.schema().column_types, vec![LogicalType::Varchar]);

    let mut scan = reader.scan().unwrap();
    let chunk = scan.next_chunk().unwrap().expect("one batch");
    assert_eq!(chunk.len(), 3);
    assert_eq!(chunk.column(0).str_at(0), Some("alpha"));
    assert_eq!(chunk.column(0).str_at(1), Some("beta"));
    assert_eq!(chunk.column(0).str_at(2), Some("alpha"));
}

#[test]
fn header_cells_resolve_via_the_searcher() {
    let bytes = build_xlsx(
        r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>1</v></c><c r="B1" t="s"><v>0</v></c></row>
            <row r="2"><c r="A2" t="n"><v>10</v></c><c r="B2" t="n"><v>20</v></c></row>
        </sheetData></worksheet>"#,
        r#"<sst count="2" uniqueCount="2"><si><t>amount</t></si><si><t>id</t></si></sst>"#,
    );

    let reader = XlsxReader::open(Cursor::new(bytes), ReadOptions::default()).unwrap();
    assert_eq!(reader.schema().column_names, vec!["id", "amount"]);
    assert_eq!(
        reader.schema().column_types,
        vec![LogicalType::Double, LogicalType::Double]
    );
}

#[test]
fn rich_text_runs_concatenate() {
    let bytes = build_xlsx(
        r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c></row>
        </sheetData></worksheet>"#,
        r#"<sst count="1" uniqueCount="1"><si><r><t>hello </t></r><r><t>world</t></r></si></sst>"#,
    );

    let options = ReadOptions {
        all_varchar: true,
        header: tabula_xlsx::HeaderMode::Never,
        ..ReadOptions::default()
    };
    let mut reader = XlsxReader::open(Cursor::new(bytes), options).unwrap();
    let mut scan = reader.scan().unwrap();
    let chunk = scan.next_chunk().unwrap().expect("one batch");
    assert_eq!(chunk.column(0).str_at(0), Some("hello world"));
}
