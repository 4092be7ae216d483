//! Builder Module
//!
//! Fluent Builder APIを提供し、`Exporter`インスタンスを段階的に構築する。

use crate::api::{file_name, Delimiter, TargetFormat, TextEncoding};
use crate::archive::{read_archive_with, ArchiveManifest};
use crate::engine::{default_engines, SpreadsheetEngine};
use crate::error::ExportError;
use crate::options::FormatOptions;
use crate::output::OutputEncoder;
use crate::raster::{default_image_codec, ImageCodec};
use crate::security::SecurityConfig;
use crate::timestamp::Timestamp;
use crate::types::{Dataset, ExportRequest, ExportResult, Payload};
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::HashSet;

/// エクスポート処理の設定を保持する内部構造体
#[derive(Debug)]
pub(crate) struct ExportConfig {
    /// XLSXエンジン（先頭から順に試行）
    pub engines: Vec<Box<dyn SpreadsheetEngine>>,

    /// 画像コーデック（Noneの場合は画像エクスポート不可）
    pub image_codec: Option<Box<dyn ImageCodec>>,

    /// サイズ制限
    pub security: SecurityConfig,

    /// ファイル名に使用するタイムスタンプ（Noneの場合は`build()`時点の時刻）
    pub timestamp: Option<Timestamp>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            engines: default_engines(),
            image_codec: default_image_codec(),
            security: SecurityConfig::default(),
            timestamp: None,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Exporter`インスタンスを段階的に構築するためのビルダーです。
/// デフォルトでは有効なフィーチャーのエンジン・コーデックがすべて登録されます。
///
/// # 使用例
///
/// ```rust
/// use exportzero::{ExporterBuilder, Timestamp, XmlSheetEngine};
///
/// # fn main() -> Result<(), exportzero::ExportError> {
/// let exporter = ExporterBuilder::new()
///     .with_engines(vec![Box::new(XmlSheetEngine::new())])
///     .without_image_codec()
///     .with_timestamp(Timestamp::parse("20250101-120000")?)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExporterBuilder {
    /// 内部設定（構築中）
    config: ExportConfig,
}

impl Default for ExporterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - XLSXエンジン: `xlsxwriter`（フィーチャー有効時）→ `xml`
    /// - 画像コーデック: `image`（フィーチャー有効時）
    /// - 入力サイズ上限: 512MB
    /// - タイムスタンプ: `build()`時点の現地時刻
    pub fn new() -> Self {
        Self {
            config: ExportConfig::default(),
        }
    }

    /// XLSXエンジンを末尾に追加する
    pub fn with_engine(mut self, engine: Box<dyn SpreadsheetEngine>) -> Self {
        self.config.engines.push(engine);
        self
    }

    /// XLSXエンジンの一覧を置き換える
    ///
    /// エンジンは指定した順に試行されます。
    pub fn with_engines(mut self, engines: Vec<Box<dyn SpreadsheetEngine>>) -> Self {
        self.config.engines = engines;
        self
    }

    /// XLSXエンジンをすべて取り除く
    ///
    /// XLSXへのエクスポートは`ExportError::ExportUnavailable`になります。
    pub fn without_engines(mut self) -> Self {
        self.config.engines.clear();
        self
    }

    pub fn with_image_codec(mut self, codec: Box<dyn ImageCodec>) -> Self {
        self.config.image_codec = Some(codec);
        self
    }

    pub fn without_image_codec(mut self) -> Self {
        self.config.image_codec = None;
        self
    }

    /// ファイル名に使用するタイムスタンプを固定する
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.config.timestamp = Some(timestamp);
        self
    }

    /// 入力ペイロードの最大サイズ（バイト）を指定する
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.security.max_input_size = bytes;
        self
    }

    /// ZIPアーカイブの最大エントリ数を指定する
    pub fn with_max_archive_entries(mut self, entries: usize) -> Self {
        self.config.security.max_archive_entries = entries;
        self
    }

    /// アーカイブの単一エントリの最大サイズ（バイト）を指定する
    pub fn with_max_entry_size(mut self, bytes: u64) -> Self {
        self.config.security.max_entry_size = bytes;
        self
    }

    /// 設定を検証し、`Exporter`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `ExportError::Config(String)`: 設定の検証に失敗した場合
    ///   * サイズ制限に0が指定された
    ///   * 同じ名前のエンジンが複数登録された
    ///
    /// 利用できないフォーマットがある場合は、ここで一度だけ警告を記録します。
    pub fn build(self) -> Result<Exporter, ExportError> {
        let security = &self.config.security;
        if security.max_input_size == 0 {
            return Err(ExportError::Config(
                "max_input_size must be greater than 0".to_string(),
            ));
        }
        if security.max_archive_entries == 0 {
            return Err(ExportError::Config(
                "max_archive_entries must be greater than 0".to_string(),
            ));
        }
        if security.max_entry_size == 0 {
            return Err(ExportError::Config(
                "max_entry_size must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for engine in &self.config.engines {
            if !seen.insert(engine.name()) {
                return Err(ExportError::Config(format!(
                    "Spreadsheet engine '{}' is registered more than once",
                    engine.name()
                )));
            }
        }

        let timestamp = self.config.timestamp.unwrap_or_else(Timestamp::now);
        let exporter = Exporter {
            config: self.config,
            timestamp,
        };

        for format in exporter.missing_capabilities() {
            warn!("{} export is unavailable in this configuration", format);
        }
        debug!(
            "exporter ready (session {}, engines: {:?})",
            timestamp,
            exporter.capabilities().spreadsheet_engines
        );

        Ok(exporter)
    }
}

/// 利用可能なエンジン・コーデックの一覧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityReport {
    /// 利用可能なXLSXエンジン名（試行順）
    pub spreadsheet_engines: Vec<&'static str>,
    /// 画像コーデック名
    pub image_codec: Option<&'static str>,
}

impl CapabilityReport {
    /// 指定フォーマットを出力できるか
    pub fn supports(&self, format: TargetFormat) -> bool {
        match format {
            TargetFormat::Xlsx => !self.spreadsheet_engines.is_empty(),
            TargetFormat::Png | TargetFormat::Jpg => self.image_codec.is_some(),
            _ => true,
        }
    }
}

/// `export_bundle`が生成するエントリ（この順で格納される）
const BUNDLE_ENTRIES: &[(&str, TargetFormat)] = &[
    ("data.txt", TargetFormat::Txt),
    ("data.csv", TargetFormat::Csv),
    ("data.json", TargetFormat::Json),
];

/// エクスポート処理のファサード
///
/// ペイロードを指定フォーマットのバイト列に変換し、ファイル名とMIMEタイプを添えて返します。
/// 構築後は不変であり、スレッド間で共有できます。
///
/// # 使用例
///
/// ```rust
/// use exportzero::{ExporterBuilder, ExportRequest, TargetFormat, Timestamp};
///
/// # fn main() -> Result<(), exportzero::ExportError> {
/// let exporter = ExporterBuilder::new()
///     .with_timestamp(Timestamp::parse("20250101-120000")?)
///     .build()?;
///
/// let result = exporter.export(ExportRequest::new("hello", TargetFormat::Txt))?;
/// assert_eq!(result.bytes, b"hello");
/// assert_eq!(result.filename, "file_20250101-120000.txt");
/// assert_eq!(result.mime_type, "text/plain");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Exporter {
    /// エクスポート設定
    config: ExportConfig,

    /// セッションのタイムスタンプ
    timestamp: Timestamp,
}

impl Exporter {
    /// ペイロードをエクスポートする
    ///
    /// ファイル名には構築時に取得したタイムスタンプが使われます。
    ///
    /// # 発生し得るエラー
    ///
    /// * `ExportError::InvalidPayloadType`: ペイロードとフォーマットの組み合わせが不正
    /// * `ExportError::Encoding`: 指定エンコーディングで表現できない文字がある
    /// * `ExportError::ExportUnavailable`: XLSXエンジンまたは画像コーデックが使えない
    /// * `ExportError::UnsupportedImageFormat`: 画像をデコードできない
    /// * `ExportError::ArchiveWrite`: ZIPの組み立てに失敗した
    /// * `ExportError::Config`: オプションや列指定が不正
    pub fn export(&self, request: ExportRequest) -> Result<ExportResult, ExportError> {
        self.export_at(request, &self.timestamp)
    }

    /// 明示的なタイムスタンプでペイロードをエクスポートする
    pub fn export_at(
        &self,
        request: ExportRequest,
        timestamp: &Timestamp,
    ) -> Result<ExportResult, ExportError> {
        request.options.validate()?;
        self.config
            .security
            .check_input_size(request.payload.approximate_size())?;

        let encoder = OutputEncoder::from_format(request.format);
        let bytes = encoder.encode(&request.payload, &request.options, &self.config)?;
        debug!(
            "exported {} payload as {} ({} bytes)",
            request.payload.kind(),
            request.format,
            bytes.len()
        );

        Ok(ExportResult {
            bytes,
            filename: file_name(&request.filename_prefix, timestamp, request.format),
            mime_type: request.format.mime_type(),
            format: request.format,
        })
    }

    /// テキストを`data.txt`・`data.csv`・`data.json`の3形式に変換したマニフェストを返す
    ///
    /// CSVは各行を空白で分割した表として出力します。3つのエントリは並列に生成されますが、
    /// マニフェスト内の順序は常に同じです。
    pub fn bundle_manifest(&self, text: &str) -> Result<ArchiveManifest, ExportError> {
        self.config.security.check_input_size(text.len() as u64)?;
        let options = FormatOptions::default();

        let rendered = BUNDLE_ENTRIES
            .par_iter()
            .map(|&(name, format)| {
                let payload = match format {
                    TargetFormat::Csv => Payload::Table(Dataset::from_whitespace_text(text)),
                    _ => Payload::Text(text.to_string()),
                };
                OutputEncoder::from_format(format)
                    .encode(&payload, &options, &self.config)
                    .map(|bytes| (name, bytes))
            })
            .collect::<Result<Vec<_>, ExportError>>()?;

        Ok(rendered.into_iter().collect())
    }

    /// テキストを3形式に変換し、ZIPアーカイブとしてエクスポートする
    ///
    /// ファイル名は`{prefix}_{timestamp}.zip`です。
    pub fn export_bundle(&self, text: &str, prefix: &str) -> Result<ExportResult, ExportError> {
        let manifest = self.bundle_manifest(text)?;
        self.export(ExportRequest::new(manifest, TargetFormat::Zip).with_prefix(prefix))
    }

    /// CSVを読み込む（このExporterのサイズ制限を適用）
    ///
    /// 型推論の規則は`Dataset::from_csv`と同じです。
    pub fn import_csv(
        &self,
        bytes: &[u8],
        delimiter: Delimiter,
        encoding: TextEncoding,
    ) -> Result<Dataset, ExportError> {
        Dataset::read_csv(bytes, delimiter, encoding, &self.config.security)
    }

    /// XLSXの先頭シートを読み込む（このExporterのサイズ制限を適用）
    pub fn import_xlsx(&self, bytes: &[u8]) -> Result<Dataset, ExportError> {
        Dataset::read_workbook(bytes, None, &self.config.security)
    }

    /// ZIPアーカイブを読み込む（このExporterのエントリ数・サイズ制限を適用）
    pub fn import_archive(&self, bytes: &[u8]) -> Result<ArchiveManifest, ExportError> {
        self.config.security.check_input_size(bytes.len() as u64)?;
        read_archive_with(bytes, &self.config.security)
    }

    /// セッションのタイムスタンプ
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// 利用可能なエンジン・コーデックを報告する
    pub fn capabilities(&self) -> CapabilityReport {
        CapabilityReport {
            spreadsheet_engines: self
                .config
                .engines
                .iter()
                .filter(|engine| engine.is_available())
                .map(|engine| engine.name())
                .collect(),
            image_codec: self.config.image_codec.as_ref().map(|codec| codec.name()),
        }
    }

    /// 現在の構成では出力できないフォーマット
    pub fn missing_capabilities(&self) -> Vec<TargetFormat> {
        let report = self.capabilities();
        TargetFormat::ALL
            .into_iter()
            .filter(|format| !report.supports(*format))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::XmlSheetEngine;
    use crate::types::CellValue;

    fn fixed_timestamp() -> Timestamp {
        Timestamp::from_ymd_hms(2025, 3, 4, 5, 6, 7).unwrap()
    }

    #[derive(Debug)]
    struct Unavailable;

    impl SpreadsheetEngine for Unavailable {
        fn name(&self) -> &'static str {
            "unavailable"
        }

        fn is_available(&self) -> bool {
            false
        }

        fn write(&self, _dataset: &Dataset, _sheet_name: &str) -> Result<Vec<u8>, ExportError> {
            Err(ExportError::ExportUnavailable("not installed".to_string()))
        }
    }

    #[test]
    fn test_exporter_builder_new() {
        let builder = ExporterBuilder::new();
        assert!(builder
            .config
            .engines
            .iter()
            .any(|engine| engine.name() == "xml"));
        assert_eq!(builder.config.security, SecurityConfig::default());
        assert!(builder.config.timestamp.is_none());
    }

    #[test]
    fn test_build_success() {
        assert!(ExporterBuilder::new().build().is_ok());
    }

    #[test]
    fn test_build_with_zero_limits() {
        assert!(matches!(
            ExporterBuilder::new().with_max_input_size(0).build(),
            Err(ExportError::Config(_))
        ));
        assert!(matches!(
            ExporterBuilder::new().with_max_archive_entries(0).build(),
            Err(ExportError::Config(_))
        ));
        assert!(matches!(
            ExporterBuilder::new().with_max_entry_size(0).build(),
            Err(ExportError::Config(_))
        ));
    }

    #[test]
    fn test_build_with_duplicate_engine() {
        let result = ExporterBuilder::new()
            .with_engines(vec![
                Box::new(XmlSheetEngine::new()),
                Box::new(XmlSheetEngine::new()),
            ])
            .build();
        match result {
            Err(ExportError::Config(msg)) => assert!(msg.contains("xml")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_is_fixed_for_session() {
        let exporter = ExporterBuilder::new()
            .with_timestamp(fixed_timestamp())
            .build()
            .unwrap();

        let first = exporter
            .export(ExportRequest::new("a", TargetFormat::Txt).with_prefix("note"))
            .unwrap();
        let second = exporter
            .export(ExportRequest::new("b", TargetFormat::Json).with_prefix("note"))
            .unwrap();

        assert_eq!(first.filename, "note_20250304-050607.txt");
        assert_eq!(second.filename, "note_20250304-050607.json");
        assert_eq!(exporter.timestamp(), fixed_timestamp());
    }

    #[test]
    fn test_export_at_overrides_timestamp() {
        let exporter = ExporterBuilder::new().build().unwrap();
        let timestamp = Timestamp::parse("19991231-235959").unwrap();
        let result = exporter
            .export_at(ExportRequest::new("x", TargetFormat::Txt), &timestamp)
            .unwrap();
        assert_eq!(result.filename, "file_19991231-235959.txt");
    }

    #[test]
    fn test_export_validates_options() {
        let exporter = ExporterBuilder::new().build().unwrap();
        let request = ExportRequest::new("x", TargetFormat::Txt)
            .with_options(FormatOptions::new().with_jpeg_quality(0));
        assert!(matches!(
            exporter.export(request),
            Err(ExportError::Config(_))
        ));
    }

    #[test]
    fn test_export_input_size_limit() {
        let exporter = ExporterBuilder::new()
            .with_max_input_size(4)
            .build()
            .unwrap();
        assert!(matches!(
            exporter.export(ExportRequest::new("hello", TargetFormat::Txt)),
            Err(ExportError::SecurityViolation(_))
        ));
    }

    #[test]
    fn test_export_result_metadata() {
        let exporter = ExporterBuilder::new()
            .with_timestamp(fixed_timestamp())
            .build()
            .unwrap();
        let dataset = Dataset::from_rows(["a"], vec![vec![CellValue::Int(1)]]).unwrap();
        let result = exporter
            .export(ExportRequest::new(dataset, TargetFormat::Csv).with_prefix("table"))
            .unwrap();

        assert_eq!(result.bytes, b"a\n1\n");
        assert_eq!(result.filename, "table_20250304-050607.csv");
        assert_eq!(result.mime_type, "text/csv");
        assert_eq!(result.format, TargetFormat::Csv);
    }

    #[test]
    fn test_capabilities() {
        let exporter = ExporterBuilder::new()
            .with_engines(vec![Box::new(Unavailable), Box::new(XmlSheetEngine::new())])
            .without_image_codec()
            .build()
            .unwrap();

        let report = exporter.capabilities();
        assert_eq!(report.spreadsheet_engines, vec!["xml"]);
        assert_eq!(report.image_codec, None);
        assert_eq!(
            exporter.missing_capabilities(),
            vec![TargetFormat::Png, TargetFormat::Jpg]
        );
    }

    #[test]
    fn test_missing_xlsx_capability() {
        let exporter = ExporterBuilder::new()
            .with_engines(vec![Box::new(Unavailable)])
            .build()
            .unwrap();
        assert!(exporter.missing_capabilities().contains(&TargetFormat::Xlsx));
    }

    #[test]
    fn test_bundle_manifest_order() {
        let exporter = ExporterBuilder::new().build().unwrap();
        let manifest = exporter.bundle_manifest("a b\n1 2").unwrap();

        let names: Vec<&str> = manifest.names().collect();
        assert_eq!(names, vec!["data.txt", "data.csv", "data.json"]);
        assert_eq!(manifest.get("data.txt"), Some(&b"a b\n1 2"[..]));
        assert_eq!(manifest.get("data.csv"), Some(&b"0,1\na,b\n1,2\n"[..]));

        let json: serde_json::Value =
            serde_json::from_slice(manifest.get("data.json").unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "content": ["a b", "1 2"] }));
    }

    #[test]
    fn test_import_uses_configured_limits() {
        let exporter = ExporterBuilder::new()
            .with_max_input_size(8)
            .build()
            .unwrap();
        let csv = b"a,b\n1,2\n3,4\n";

        assert!(matches!(
            exporter.import_csv(csv, Delimiter::Comma, TextEncoding::Utf8),
            Err(ExportError::SecurityViolation(_))
        ));
        assert!(matches!(
            exporter.import_xlsx(&[0u8; 9]),
            Err(ExportError::SecurityViolation(_))
        ));
        // デフォルト上限のfrom_csvでは読める
        assert_eq!(
            Dataset::from_csv(csv, Delimiter::Comma, TextEncoding::Utf8)
                .unwrap()
                .height(),
            2
        );

        let roomy = ExporterBuilder::new().build().unwrap();
        let dataset = roomy
            .import_csv(csv, Delimiter::Comma, TextEncoding::Utf8)
            .unwrap();
        assert_eq!(dataset.rows()[1], vec![CellValue::Int(3), CellValue::Int(4)]);
    }

    #[test]
    fn test_import_archive_entry_limit() {
        let exporter = ExporterBuilder::new()
            .with_max_archive_entries(1)
            .build()
            .unwrap();
        let bytes = two_entry_zip();

        assert!(matches!(
            exporter.import_archive(&bytes),
            Err(ExportError::SecurityViolation(_))
        ));
        let manifest = ExporterBuilder::new()
            .build()
            .unwrap()
            .import_archive(&bytes)
            .unwrap();
        assert_eq!(manifest.len(), 2);
    }

    fn two_entry_zip() -> Vec<u8> {
        let manifest = ArchiveManifest::new()
            .with_entry("a.txt", "a")
            .with_entry("b.txt", "b");
        ExporterBuilder::new()
            .build()
            .unwrap()
            .export(ExportRequest::new(manifest, TargetFormat::Zip))
            .unwrap()
            .bytes
    }

    #[test]
    fn test_exporter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Exporter>();
    }
}
