//! rust_xlsxwriterを使用したXLSX書き出しエンジン

use super::{check_sheet_bounds, SpreadsheetEngine};
use crate::error::ExportError;
use crate::types::{CellValue, Dataset};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

const ENGINE_NAME: &str = "xlsxwriter";

/// `rust_xlsxwriter`ベースのエンジン（優先エンジン）
///
/// ヘッダー行は太字で出力します。
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxWriterEngine;

impl XlsxWriterEngine {
    pub fn new() -> Self {
        Self
    }

    fn build(&self, dataset: &Dataset, sheet_name: &str) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name)?;

        let header_format = Format::new().set_bold();
        for (col, name) in dataset.columns().iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
        }

        for (row_idx, row) in dataset.rows().iter().enumerate() {
            let row_num = row_idx as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    CellValue::Int(n) => {
                        worksheet.write_number(row_num, col, *n as f64)?;
                    }
                    CellValue::Float(n) if n.is_finite() => {
                        worksheet.write_number(row_num, col, *n)?;
                    }
                    CellValue::Float(n) => {
                        worksheet.write_string(row_num, col, n.to_string())?;
                    }
                    CellValue::String(s) => {
                        worksheet.write_string(row_num, col, s)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(row_num, col, *b)?;
                    }
                    CellValue::Empty => {}
                }
            }
        }

        workbook.save_to_buffer()
    }
}

impl SpreadsheetEngine for XlsxWriterEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn write(&self, dataset: &Dataset, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
        check_sheet_bounds(ENGINE_NAME, dataset)?;
        self.build(dataset, sheet_name)
            .map_err(|e| ExportError::Engine {
                engine: ENGINE_NAME,
                message: e.to_string(),
            })
    }
}
