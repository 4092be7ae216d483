//! Excelブック（XLSX）の読み込み
//!
//! calamineを使用して、シートの先頭行を列名、以降の行をデータとして取り込みます。

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use std::io::Cursor;

use crate::error::ExportError;
use crate::security::SecurityConfig;
use crate::types::{CellValue, Dataset};

impl Dataset {
    /// XLSXバイト列の先頭シートから表を読み込む
    ///
    /// 入力サイズの上限はデフォルト値（512MB）です。上限を変更する場合は
    /// `Exporter::import_xlsx`を使用してください。
    pub fn from_xlsx(bytes: &[u8]) -> Result<Dataset, ExportError> {
        Self::read_workbook(bytes, None, &SecurityConfig::default())
    }

    /// XLSXバイト列の指定シートから表を読み込む
    pub fn from_xlsx_sheet(bytes: &[u8], sheet_name: &str) -> Result<Dataset, ExportError> {
        Self::read_workbook(bytes, Some(sheet_name), &SecurityConfig::default())
    }

    pub(crate) fn read_workbook(
        bytes: &[u8],
        sheet_name: Option<&str>,
        security: &SecurityConfig,
    ) -> Result<Dataset, ExportError> {
        security.check_input_size(bytes.len() as u64)?;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let all_sheet_names = workbook.sheet_names();

        let sheet_name = match sheet_name {
            Some(name) => {
                if !all_sheet_names.iter().any(|s| s == name) {
                    return Err(ExportError::Import(format!("Sheet '{}' not found", name)));
                }
                name.to_string()
            }
            None => all_sheet_names
                .first()
                .cloned()
                .ok_or_else(|| ExportError::Import("Workbook contains no sheets".to_string()))?,
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        let mut rows = range.rows();

        let columns: Vec<String> = match rows.next() {
            Some(header) => header
                .iter()
                .enumerate()
                .map(|(idx, cell)| match cell {
                    Data::Empty => format!("Unnamed: {}", idx),
                    Data::String(s) => s.clone(),
                    other => to_cell_value(other).to_string(),
                })
                .collect(),
            None => Vec::new(),
        };

        let mut dataset = Dataset::new(columns);
        for row in rows {
            dataset.push_row(row.iter().map(to_cell_value).collect())?;
        }
        Ok(dataset)
    }
}

/// calamineのセル値を変換する
///
/// XLSXの数値はすべて浮動小数点数として格納されるため、整数値は`Int`に戻します。
fn to_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => CellValue::Int(*f as i64),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match serial_to_datetime(dt.as_f64()) {
            Some(datetime) if datetime.num_seconds_from_midnight() == 0 => {
                CellValue::String(datetime.format("%Y-%m-%d").to_string())
            }
            Some(datetime) => CellValue::String(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::Error(e) => CellValue::String(e.to_string()),
        Data::Empty => CellValue::Empty,
        other => CellValue::String(other.to_string()),
    }
}

/// Excelのシリアル値（1900年システム）を日時に変換する
///
/// 起算日は1899年12月30日です（1900年3月以降の日付で正しい値になる）。
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.floor() as i64;
    let seconds = ((serial - serial.floor()) * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::days(days) + Duration::seconds(seconds))
}
