//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use crate::api::TargetFormat;
use thiserror::Error;

/// exportzeroクレート全体で使用するエラー型
///
/// エクスポート処理中に発生するすべてのエラーを統一的に扱います。
/// いずれのエラーも呼び出し側で回復可能であり、エラー時には部分的な
/// バイト列は一切返されません。
///
/// # エラーの種類
///
/// - `InvalidPayloadType`: ペイロードの種類が出力形式と一致しない
/// - `Encoding`: 文字コード変換に失敗した
/// - `ExportUnavailable`: 出力可能なエンジン・コーデックが存在しない
/// - `UnsupportedImageFormat`: 画像のデコード・エンコードに失敗した
/// - `ArchiveWrite`: ZIPアーカイブの組み立てに失敗した
///
/// # 使用例
///
/// ```rust,no_run
/// use exportzero::{ExportError, ExportRequest, ExporterBuilder, Payload, TargetFormat};
///
/// # fn main() -> Result<(), ExportError> {
/// let exporter = ExporterBuilder::new().build()?;
/// let request = ExportRequest::new(Payload::Text("hello".into()), TargetFormat::Png);
///
/// match exporter.export(request) {
///     Err(ExportError::InvalidPayloadType { payload, format }) => {
///         println!("{} cannot become {}", payload, format);
///     }
///     other => println!("{:?}", other),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum ExportError {
    /// ペイロードの種類が出力形式と互換性がない
    ///
    /// 例えば、テキストをPNGとして出力しようとした場合に発生します。
    #[error("Invalid payload type: {payload} payload cannot be exported as {format}")]
    InvalidPayloadType {
        /// ペイロードの種類（`text`, `table`, `image`, `archive`）
        payload: &'static str,
        /// 要求された出力形式
        format: TargetFormat,
    },

    /// 文字コード変換エラー
    ///
    /// 選択したエンコーディングで表現できない文字が含まれている場合や、
    /// 入力バイト列が指定エンコーディングとして不正な場合に発生します。
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// 出力可能なエンジンが存在しない
    ///
    /// XLSX出力ですべてのスプレッドシートエンジンが利用不可または失敗した場合、
    /// あるいは画像コーデックが組み込まれていない場合に発生します。
    #[error("Export unavailable: {0}")]
    ExportUnavailable(String),

    /// 画像コーデックが入力をデコード（またはエンコード）できない
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// ZIPアーカイブの組み立てエラー
    #[error("Archive write error: {0}")]
    ArchiveWrite(String),

    /// 個々のスプレッドシートエンジンの失敗
    ///
    /// フォールバック処理の内部で集約され、最終的には`ExportUnavailable`として
    /// 呼び出し側に報告されます。独自エンジンを実装する場合に使用します。
    #[error("Spreadsheet engine '{engine}' failed: {message}")]
    Engine {
        /// エンジン名
        engine: &'static str,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// 表データの読み込みエラー（CSV/XLSX）
    #[error("Import error: {0}")]
    Import(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `ExporterBuilder::build()`や`FormatOptions`の検証時、
    /// または存在しない列を選択した場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// 入力サイズやアーカイブのエントリ数が上限を超えた場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<calamine::Error> for ExportError {
    fn from(err: calamine::Error) -> Self {
        ExportError::Import(format!("failed to read workbook: {}", err))
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Import(format!("failed to read CSV: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: ExportError = io_err.into();

        match error {
            ExportError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(e.to_string(), "File not found");
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_invalid_payload_type_display() {
        let error = ExportError::InvalidPayloadType {
            payload: "text",
            format: TargetFormat::Png,
        };

        let error_msg = error.to_string();
        assert!(error_msg.contains("Invalid payload type"));
        assert!(error_msg.contains("text"));
        assert!(error_msg.contains("png"));
    }

    #[test]
    fn test_engine_error_display() {
        let error = ExportError::Engine {
            engine: "xlsxwriter",
            message: "sheet name too long".to_string(),
        };

        let error_msg = error.to_string();
        assert!(error_msg.contains("xlsxwriter"));
        assert!(error_msg.contains("sheet name too long"));
    }

    #[test]
    fn test_calamine_error_becomes_import() {
        let error: ExportError = calamine::Error::Msg("Corrupted file").into();

        match error {
            ExportError::Import(msg) => assert!(msg.contains("Corrupted file")),
            _ => panic!("Expected Import error"),
        }
    }

    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), ExportError> {
            let _file = std::fs::File::open("nonexistent_file.xlsx")?;
            Ok(())
        }

        match io_operation() {
            Err(ExportError::Io(_)) => {}
            _ => panic!("Expected Io error from ? operator"),
        }
    }

    // エラーメッセージのフォーマット確認
    #[test]
    fn test_all_error_formats() {
        assert!(ExportError::Encoding("x".into())
            .to_string()
            .starts_with("Encoding error"));
        assert!(ExportError::ExportUnavailable("x".into())
            .to_string()
            .starts_with("Export unavailable"));
        assert!(ExportError::UnsupportedImageFormat("x".into())
            .to_string()
            .starts_with("Unsupported image format"));
        assert!(ExportError::ArchiveWrite("x".into())
            .to_string()
            .starts_with("Archive write error"));
        assert!(ExportError::Config("x".into())
            .to_string()
            .starts_with("Configuration error"));
        assert!(ExportError::SecurityViolation("x".into())
            .to_string()
            .starts_with("Security violation"));
    }
}
