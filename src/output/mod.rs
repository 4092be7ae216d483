//! Output Format Module
//!
//! Strategy Patternによる出力フォーマットの抽象化を提供するモジュール。

mod formatters;

use crate::api::{ImageTarget, TargetFormat};
use crate::archive::write_archive;
use crate::builder::ExportConfig;
use crate::engine::write_with_fallback;
use crate::error::ExportError;
use crate::options::FormatOptions;
use crate::types::{Dataset, Payload};
use std::borrow::Cow;

pub use formatters::*;

/// 出力エンコーダー（Strategy Pattern）
///
/// 各出力フォーマット（txt, json, csv, xlsx, png/jpg, zip）をenumとして表現します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputEncoder {
    Text,
    Json,
    Csv,
    Xlsx,
    Image(ImageTarget),
    Zip,
}

impl OutputEncoder {
    /// 出力フォーマットからエンコーダーを生成
    pub fn from_format(format: TargetFormat) -> Self {
        match format {
            TargetFormat::Txt => OutputEncoder::Text,
            TargetFormat::Json => OutputEncoder::Json,
            TargetFormat::Csv => OutputEncoder::Csv,
            TargetFormat::Xlsx => OutputEncoder::Xlsx,
            TargetFormat::Png => OutputEncoder::Image(ImageTarget::Png),
            TargetFormat::Jpg => OutputEncoder::Image(ImageTarget::Jpeg),
            TargetFormat::Zip => OutputEncoder::Zip,
        }
    }

    pub fn format(&self) -> TargetFormat {
        match self {
            OutputEncoder::Text => TargetFormat::Txt,
            OutputEncoder::Json => TargetFormat::Json,
            OutputEncoder::Csv => TargetFormat::Csv,
            OutputEncoder::Xlsx => TargetFormat::Xlsx,
            OutputEncoder::Image(ImageTarget::Png) => TargetFormat::Png,
            OutputEncoder::Image(ImageTarget::Jpeg) => TargetFormat::Jpg,
            OutputEncoder::Zip => TargetFormat::Zip,
        }
    }

    /// ペイロードを指定されたフォーマットのバイト列に変換する
    ///
    /// # 引数
    ///
    /// * `payload` - 変換するペイロード
    /// * `options` - フォーマット固有のオプション
    /// * `config` - エンジン・コーデック・サイズ制限
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<u8>)` - 変換に成功した場合
    /// * `Err(ExportError)` - ペイロードの種類が合わない場合や変換に失敗した場合
    pub fn encode(
        &self,
        payload: &Payload,
        options: &FormatOptions,
        config: &ExportConfig,
    ) -> Result<Vec<u8>, ExportError> {
        match (self, payload) {
            (OutputEncoder::Text, Payload::Text(text)) => TextFormatter.render(text, options),
            (OutputEncoder::Text, Payload::Table(dataset)) => {
                let dataset = project(dataset, options)?;
                TableTextFormatter.render(&dataset, options)
            }
            (OutputEncoder::Json, Payload::Text(text)) => JsonFormatter.render_lines(text, options),
            (OutputEncoder::Json, Payload::Table(dataset)) => {
                let dataset = project(dataset, options)?;
                JsonFormatter.render_table(&dataset, options)
            }
            (OutputEncoder::Csv, Payload::Table(dataset)) => {
                let dataset = project(dataset, options)?;
                CsvFormatter.render(&dataset, options)
            }
            (OutputEncoder::Xlsx, Payload::Table(dataset)) => {
                let dataset = project(dataset, options)?;
                write_with_fallback(&config.engines, &dataset, options.sheet_name())
            }
            (OutputEncoder::Image(target), Payload::Image(bytes)) => match &config.image_codec {
                Some(codec) => codec.transcode(bytes, *target, options.jpeg_quality()),
                None => Err(ExportError::ExportUnavailable(format!(
                    "{} export requires an image codec, but none is configured",
                    self.format()
                ))),
            },
            (OutputEncoder::Zip, Payload::Archive(manifest)) => {
                write_archive(manifest, &config.security)
            }
            (_, payload) => Err(ExportError::InvalidPayloadType {
                payload: payload.kind(),
                format: self.format(),
            }),
        }
    }
}

/// 列の絞り込みが指定されている場合は、その列だけを持つ表に変換する
fn project<'a>(
    dataset: &'a Dataset,
    options: &FormatOptions,
) -> Result<Cow<'a, Dataset>, ExportError> {
    match options.columns() {
        Some(columns) => Ok(Cow::Owned(dataset.select(columns)?)),
        None => Ok(Cow::Borrowed(dataset)),
    }
}
