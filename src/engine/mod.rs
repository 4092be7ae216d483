//! Spreadsheet Engine Module
//!
//! 表データをXLSXに書き出すエンジンの抽象化と、順序付きフォールバック処理を提供する。
//!
//! エンジンは`SpreadsheetEngine`トレイトを実装し、`is_available()`で
//! 利用可否を報告します。`write_with_fallback`は登録順に各エンジンを試し、
//! 最初に成功したエンジンの出力を返します。

mod xml;
#[cfg(feature = "xlsxwriter")]
mod xlsxwriter;

pub use xml::XmlSheetEngine;
#[cfg(feature = "xlsxwriter")]
pub use xlsxwriter::XlsxWriterEngine;

use crate::error::ExportError;
use crate::types::Dataset;
use log::{debug, warn};
use std::fmt;

/// Excelの最大行数（ヘッダー行を含む）
pub(crate) const MAX_ROWS: usize = 1_048_576;

/// Excelの最大列数
pub(crate) const MAX_COLS: usize = 16_384;

/// XLSX書き出しエンジン
///
/// 実装は`Send + Sync`であり、`Exporter`を複数スレッドで共有できる必要があります。
///
/// # 使用例
///
/// ```rust
/// use exportzero::{Dataset, ExportError, SpreadsheetEngine};
///
/// #[derive(Debug)]
/// struct Unavailable;
///
/// impl SpreadsheetEngine for Unavailable {
///     fn name(&self) -> &'static str {
///         "unavailable"
///     }
///
///     fn is_available(&self) -> bool {
///         false
///     }
///
///     fn write(&self, _dataset: &Dataset, _sheet_name: &str) -> Result<Vec<u8>, ExportError> {
///         unreachable!("never called when unavailable")
///     }
/// }
/// ```
pub trait SpreadsheetEngine: Send + Sync + fmt::Debug {
    /// ログやエラーメッセージで使用するエンジン名
    fn name(&self) -> &'static str;

    /// エンジンが利用可能かどうか
    fn is_available(&self) -> bool {
        true
    }

    /// 表データを1シートのXLSXブックとして書き出す
    fn write(&self, dataset: &Dataset, sheet_name: &str) -> Result<Vec<u8>, ExportError>;
}

/// デフォルトのエンジン一覧（優先順）
///
/// `xlsxwriter`フィーチャーが有効な場合は`rust_xlsxwriter`ベースのエンジンを
/// 先頭に置き、内蔵の`XmlSheetEngine`を二番目とします。
pub fn default_engines() -> Vec<Box<dyn SpreadsheetEngine>> {
    let mut engines: Vec<Box<dyn SpreadsheetEngine>> = Vec::new();
    #[cfg(feature = "xlsxwriter")]
    engines.push(Box::new(XlsxWriterEngine::new()));
    engines.push(Box::new(XmlSheetEngine::new()));
    engines
}

/// 登録順にエンジンを試し、最初に成功した出力を返す
///
/// 利用不可のエンジンはスキップし、失敗したエンジンは警告を記録して次へ進みます。
/// いずれも成功しなかった場合は`ExportError::ExportUnavailable`を返します。
pub(crate) fn write_with_fallback(
    engines: &[Box<dyn SpreadsheetEngine>],
    dataset: &Dataset,
    sheet_name: &str,
) -> Result<Vec<u8>, ExportError> {
    let mut failures = Vec::new();

    for engine in engines {
        if !engine.is_available() {
            debug!("spreadsheet engine '{}' is unavailable, skipping", engine.name());
            continue;
        }

        match engine.write(dataset, sheet_name) {
            Ok(bytes) => {
                debug!(
                    "spreadsheet written by '{}' ({} bytes)",
                    engine.name(),
                    bytes.len()
                );
                return Ok(bytes);
            }
            Err(e) => {
                warn!("spreadsheet engine '{}' failed: {}", engine.name(), e);
                failures.push(format!("{}: {}", engine.name(), e));
            }
        }
    }

    if failures.is_empty() {
        Err(ExportError::ExportUnavailable(
            "XLSX export requires a spreadsheet engine, but none is available".to_string(),
        ))
    } else {
        Err(ExportError::ExportUnavailable(format!(
            "Failed to create Excel file with all available engines ({})",
            failures.join("; ")
        )))
    }
}

/// Excelのシートに収まるかを検証する
pub(crate) fn check_sheet_bounds(
    engine: &'static str,
    dataset: &Dataset,
) -> Result<(), ExportError> {
    if dataset.height() + 1 > MAX_ROWS {
        return Err(ExportError::Engine {
            engine,
            message: format!(
                "{} rows exceed the worksheet limit of {}",
                dataset.height() + 1,
                MAX_ROWS
            ),
        });
    }
    if dataset.width() > MAX_COLS {
        return Err(ExportError::Engine {
            engine,
            message: format!(
                "{} columns exceed the worksheet limit of {}",
                dataset.width(),
                MAX_COLS
            ),
        });
    }
    Ok(())
}
