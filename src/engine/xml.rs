//! 内蔵のSpreadsheetML書き出しエンジン
//!
//! 外部のXLSXライブラリに依存せず、`zip`と`quick-xml`のみで最小構成の
//! OOXMLパッケージ（ワークブック1つ、シート1つ、インライン文字列）を組み立てます。

use super::{check_sheet_bounds, SpreadsheetEngine};
use crate::error::ExportError;
use crate::types::{CellValue, Dataset};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

const ENGINE_NAME: &str = "xml";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"</Types>"#
);

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#
);

const WORKBOOK_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"</Relationships>"#
);

/// `zip` + `quick-xml`による最小構成のXLSXエンジン（代替エンジン）
///
/// 書式や共有文字列テーブルは持たず、文字列はすべてインライン文字列として書き出します。
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlSheetEngine;

impl XmlSheetEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SpreadsheetEngine for XmlSheetEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn write(&self, dataset: &Dataset, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
        check_sheet_bounds(ENGINE_NAME, dataset)?;

        let workbook = render_workbook(sheet_name).map_err(engine_error)?;
        let sheet = render_sheet(dataset).map_err(engine_error)?;

        let parts: [(&str, &[u8]); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", ROOT_RELS.as_bytes()),
            ("xl/workbook.xml", workbook.as_slice()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
            ("xl/worksheets/sheet1.xml", sheet.as_slice()),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in parts {
            zip.start_file(name, options).map_err(engine_error)?;
            zip.write_all(content).map_err(engine_error)?;
        }
        let cursor = zip.finish().map_err(engine_error)?;
        Ok(cursor.into_inner())
    }
}

fn engine_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::Engine {
        engine: ENGINE_NAME,
        message: e.to_string(),
    }
}

fn render_workbook(sheet_name: &str) -> Result<Vec<u8>, quick_xml::Error> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("workbook").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_REL)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("sheets")))?;
    writer.write_event(Event::Empty(BytesStart::new("sheet").with_attributes([
        ("name", sheet_name),
        ("sheetId", "1"),
        ("r:id", "rId1"),
    ])))?;
    writer.write_event(Event::End(BytesEnd::new("sheets")))?;
    writer.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(writer.into_inner())
}

fn render_sheet(dataset: &Dataset) -> Result<Vec<u8>, quick_xml::Error> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("worksheet").with_attributes([("xmlns", NS_MAIN)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let header: Vec<CellValue> = dataset
        .columns()
        .iter()
        .map(|c| CellValue::String(c.clone()))
        .collect();
    write_row(&mut writer, 0, &header)?;
    for (row_idx, row) in dataset.rows().iter().enumerate() {
        write_row(&mut writer, row_idx + 1, row)?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

fn write_row(
    writer: &mut Writer<Vec<u8>>,
    row_idx: usize,
    cells: &[CellValue],
) -> Result<(), quick_xml::Error> {
    let row_ref = (row_idx + 1).to_string();
    writer.write_event(Event::Start(
        BytesStart::new("row").with_attributes([("r", row_ref.as_str())]),
    ))?;

    for (col_idx, cell) in cells.iter().enumerate() {
        let cell_ref = format!("{}{}", col_index_to_letter(col_idx as u32), row_ref);
        match cell {
            CellValue::Empty => continue,
            CellValue::Int(n) => write_value_cell(writer, &cell_ref, None, &n.to_string())?,
            CellValue::Float(n) if n.is_finite() => {
                write_value_cell(writer, &cell_ref, None, &n.to_string())?
            }
            CellValue::Bool(b) => {
                write_value_cell(writer, &cell_ref, Some("b"), if *b { "1" } else { "0" })?
            }
            CellValue::Float(n) => write_inline_string(writer, &cell_ref, &n.to_string())?,
            CellValue::String(s) => write_inline_string(writer, &cell_ref, s)?,
        }
    }

    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

fn write_value_cell(
    writer: &mut Writer<Vec<u8>>,
    cell_ref: &str,
    cell_type: Option<&str>,
    value: &str,
) -> Result<(), quick_xml::Error> {
    let mut start = BytesStart::new("c");
    start.push_attribute(("r", cell_ref));
    if let Some(t) = cell_type {
        start.push_attribute(("t", t));
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Start(BytesStart::new("v")))?;
    writer.write_event(Event::Text(BytesText::new(&escape_control_chars(value))))?;
    writer.write_event(Event::End(BytesEnd::new("v")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

fn write_inline_string(
    writer: &mut Writer<Vec<u8>>,
    cell_ref: &str,
    value: &str,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(
        BytesStart::new("c").with_attributes([("r", cell_ref), ("t", "inlineStr")]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("is")))?;
    // 前後の空白を保持する
    writer.write_event(Event::Start(
        BytesStart::new("t").with_attributes([("xml:space", "preserve")]),
    ))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("t")))?;
    writer.write_event(Event::End(BytesEnd::new("is")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

/// XMLに書けない制御文字を`_xHHHH_`形式に置き換える
///
/// 元の文字列にある`_xHHHH_`形式の並びは、読み込み側で制御文字に戻されないよう
/// 先頭の`_`を`_x005F_`として書き出します。タブ・改行・復帰はそのまま残します。
fn escape_control_chars(value: &str) -> Cow<'_, str> {
    if !value.chars().any(is_forbidden_control) && !value.contains("_x") {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for (idx, c) in value.char_indices() {
        if c == '_' && is_escape_sequence(&value.as_bytes()[idx..]) {
            escaped.push_str("_x005F_");
        } else if is_forbidden_control(c) {
            escaped.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

fn is_forbidden_control(c: char) -> bool {
    c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r' | '\u{7F}')
}

fn is_escape_sequence(bytes: &[u8]) -> bool {
    bytes.len() >= 7
        && bytes[0] == b'_'
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

/// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
fn col_index_to_letter(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        let remainder = col % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}
