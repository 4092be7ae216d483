//! Output Formatters Implementation
//!
//! 各出力フォーマットの実装を提供するモジュール。

use crate::encoding::encode_text;
use crate::error::ExportError;
use crate::options::FormatOptions;
use crate::parser::split_lines;
use crate::types::{CellValue, Dataset};
use serde::Serialize;
use serde_json::json;
use unicode_width::UnicodeWidthStr;

/// プレーンテキストのフォーマッター
pub struct TextFormatter;

impl TextFormatter {
    pub fn render(&self, text: &str, options: &FormatOptions) -> Result<Vec<u8>, ExportError> {
        encode_text(text, options.encoding())
    }
}

/// JSON形式のフォーマッター
///
/// JSONは常にUTF-8で出力します。
pub struct JsonFormatter;

impl JsonFormatter {
    /// テキストを`{"content": [行, ...]}`として出力
    pub fn render_lines(
        &self,
        text: &str,
        options: &FormatOptions,
    ) -> Result<Vec<u8>, ExportError> {
        let lines: Vec<&str> = split_lines(text).collect();
        to_json_bytes(&json!({ "content": lines }), options.json_indent())
    }

    /// 表を`{"columns": [...], "data": [[...], ...]}`として出力
    ///
    /// 列順を保持するため、行はオブジェクトではなく配列で表現します。
    pub fn render_table(
        &self,
        dataset: &Dataset,
        options: &FormatOptions,
    ) -> Result<Vec<u8>, ExportError> {
        let data: Vec<Vec<serde_json::Value>> = dataset
            .rows()
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_json()).collect())
            .collect();
        to_json_bytes(
            &json!({ "columns": dataset.columns(), "data": data }),
            options.json_indent(),
        )
    }
}

/// CSV形式のフォーマッター
///
/// ヘッダー行に続けてデータ行を出力し、最後に指定エンコーディングへ変換します。
///
/// 区切り文字・引用符・改行を含むフィールドに加えて、読み込み時に数値や論理値として
/// 解釈されてしまう文字列（`"007"`, `"true"`など）も引用符で囲みます。
/// `Dataset::from_csv`は引用符付きのフィールドを文字列のまま読み込むため、型が保たれます。
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn render(
        &self,
        dataset: &Dataset,
        options: &FormatOptions,
    ) -> Result<Vec<u8>, ExportError> {
        // 列のない表はヘッダー行も出力しない
        if dataset.width() == 0 {
            return Ok(Vec::new());
        }

        let delimiter = options.delimiter().as_byte();
        let quoting = csv_core::WriterBuilder::new().delimiter(delimiter).build();
        // 引用はquote_fieldで済ませるため、書き出し時には何も加工しない
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(Vec::new());

        let header: Vec<String> = dataset
            .columns()
            .iter()
            .map(|name| quote_field(&quoting, name, false))
            .collect();
        writer.write_record(&header).map_err(csv_error)?;
        for row in dataset.rows() {
            let record: Vec<String> = row
                .iter()
                .map(|cell| quote_field(&quoting, &cell.to_string(), is_ambiguous(cell)))
                .collect();
            writer.write_record(&record).map_err(csv_error)?;
        }

        let buffer = writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))?;
        // csvクレートはUTF-8文字列をそのまま書き出すため、ここでは常に有効なUTF-8
        let text = String::from_utf8(buffer)
            .map_err(|e| ExportError::Encoding(format!("CSV output is not valid utf-8: {}", e)))?;
        encode_text(&text, options.encoding())
    }
}

/// 文字列セルのうち、引用符なしでは別の型として読み戻されるものを判定
fn is_ambiguous(cell: &CellValue) -> bool {
    match cell {
        CellValue::String(s) if !s.is_empty() => {
            !matches!(CellValue::infer(s), CellValue::String(_))
        }
        _ => false,
    }
}

/// 必要に応じてフィールドを引用符で囲む（内部の引用符は二重化）
fn quote_field(quoting: &csv_core::Writer, field: &str, force: bool) -> String {
    if force || quoting.should_quote(field.as_bytes()) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_error(e: csv::Error) -> ExportError {
    ExportError::Encoding(format!("failed to write CSV: {}", e))
}

/// 表を固定幅のテキストとして出力するフォーマッター
///
/// 各列は表示幅（全角文字は2）に合わせて右寄せし、列間は空白2つで区切ります。
pub struct TableTextFormatter;

impl TableTextFormatter {
    pub fn render(
        &self,
        dataset: &Dataset,
        options: &FormatOptions,
    ) -> Result<Vec<u8>, ExportError> {
        let cells: Vec<Vec<String>> = dataset
            .rows()
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        let widths = calculate_column_widths(dataset.columns(), &cells);

        let mut lines = Vec::with_capacity(cells.len() + 1);
        lines.push(pad_row(dataset.columns(), &widths));
        for row in &cells {
            lines.push(pad_row(row, &widths));
        }

        encode_text(&lines.join("\n"), options.encoding())
    }
}

/// 各列の最大表示幅を計算
fn calculate_column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in rows {
        for (col_idx, cell) in row.iter().enumerate() {
            widths[col_idx] = widths[col_idx].max(cell.width());
        }
    }
    widths
}

fn pad_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| {
            let padding = width.saturating_sub(cell.width());
            format!("{}{}", " ".repeat(padding), cell)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// JSON値をバイト列に変換（indentが0の場合はコンパクト出力）
fn to_json_bytes(value: &serde_json::Value, indent: usize) -> Result<Vec<u8>, ExportError> {
    let json_error =
        |e: serde_json::Error| ExportError::Encoding(format!("JSON serialization error: {}", e));

    if indent == 0 {
        return serde_json::to_vec(value).map_err(json_error);
    }

    let indent_bytes = vec![b' '; indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent_bytes);
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer).map_err(json_error)?;
    Ok(buffer)
}
