//! Public API Types
//!
//! 公開APIで使用する列挙型と、出力形式から拡張子・MIMEタイプを導出する
//! 固定のルックアップテーブルを定義するモジュール。

use crate::error::ExportError;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 未知の拡張子に対するMIMEタイプ
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// 出力形式
///
/// 拡張子とMIMEタイプはこの列挙型から一意に決まります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// プレーンテキスト（`text/plain`）
    Txt,
    /// JSON（`application/json`）
    Json,
    /// CSV（`text/csv`）
    Csv,
    /// Excelブック（OOXML）
    Xlsx,
    /// PNG画像
    Png,
    /// JPEG画像
    Jpg,
    /// ZIPアーカイブ
    Zip,
}

impl TargetFormat {
    /// すべての出力形式
    pub const ALL: [TargetFormat; 7] = [
        TargetFormat::Txt,
        TargetFormat::Json,
        TargetFormat::Csv,
        TargetFormat::Xlsx,
        TargetFormat::Png,
        TargetFormat::Jpg,
        TargetFormat::Zip,
    ];

    /// ファイル拡張子（ドットなし）
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Txt => "txt",
            TargetFormat::Json => "json",
            TargetFormat::Csv => "csv",
            TargetFormat::Xlsx => "xlsx",
            TargetFormat::Png => "png",
            TargetFormat::Jpg => "jpg",
            TargetFormat::Zip => "zip",
        }
    }

    /// MIMEタイプ
    pub fn mime_type(self) -> &'static str {
        match self {
            TargetFormat::Txt => "text/plain",
            TargetFormat::Json => "application/json",
            TargetFormat::Csv => "text/csv",
            TargetFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            TargetFormat::Png => "image/png",
            TargetFormat::Jpg => "image/jpeg",
            TargetFormat::Zip => "application/zip",
        }
    }

    /// 拡張子から出力形式を取得する（大文字小文字は区別しない）
    ///
    /// `jpeg`は`jpg`の別名として扱います。
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(TargetFormat::Txt),
            "json" => Some(TargetFormat::Json),
            "csv" => Some(TargetFormat::Csv),
            "xlsx" => Some(TargetFormat::Xlsx),
            "png" => Some(TargetFormat::Png),
            "jpg" | "jpeg" => Some(TargetFormat::Jpg),
            "zip" => Some(TargetFormat::Zip),
            _ => None,
        }
    }

    /// 画像形式の場合、対応する`ImageTarget`を返す
    pub fn image_target(self) -> Option<ImageTarget> {
        match self {
            TargetFormat::Png => Some(ImageTarget::Png),
            TargetFormat::Jpg => Some(ImageTarget::Jpeg),
            _ => None,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetFormat::from_extension(s)
            .ok_or_else(|| ExportError::Config(format!("Unknown target format: '{}'", s)))
    }
}

/// 拡張子からMIMEタイプを取得する
///
/// 拡張子は小文字・ドットなしで完全一致したものだけを対象とし、
/// それ以外（`jpeg`や`CSV`を含む）は`application/octet-stream`を返します。
///
/// # 使用例
///
/// ```rust
/// use exportzero::mime_type_for_extension;
///
/// assert_eq!(mime_type_for_extension("csv"), "text/csv");
/// assert_eq!(mime_type_for_extension("exe"), "application/octet-stream");
/// assert_eq!(mime_type_for_extension("jpeg"), "application/octet-stream");
/// ```
pub fn mime_type_for_extension(ext: &str) -> &'static str {
    TargetFormat::ALL
        .into_iter()
        .find(|format| format.extension() == ext)
        .map(TargetFormat::mime_type)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// ダウンロード用ファイル名を生成する
///
/// 形式は常に`{prefix}_{timestamp}.{ext}`です。
///
/// # 使用例
///
/// ```rust
/// use exportzero::{file_name, TargetFormat, Timestamp};
///
/// let ts = Timestamp::from_ymd_hms(2025, 1, 2, 3, 4, 5).unwrap();
/// assert_eq!(file_name("report", &ts, TargetFormat::Csv), "report_20250102-030405.csv");
/// ```
pub fn file_name(prefix: &str, timestamp: &Timestamp, format: TargetFormat) -> String {
    format!("{}_{}.{}", prefix, timestamp, format.extension())
}

/// 画像の出力コンテナ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    /// PNG（可逆、アルファチャンネル保持）
    Png,
    /// JPEG（非可逆、アルファチャンネルは破棄）
    Jpeg,
}

/// CSVの区切り文字
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// `,`（デフォルト）
    #[default]
    Comma,
    /// `;`
    Semicolon,
    /// タブ文字
    Tab,
    /// `|`
    Pipe,
}

impl Delimiter {
    /// すべての区切り文字
    pub const ALL: [Delimiter; 4] = [
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Tab,
        Delimiter::Pipe,
    ];

    /// 区切り文字のバイト値
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }
}

impl FromStr for Delimiter {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "\t"そのものはtrim()で消えるため、先に判定する
        if s == "\t" {
            return Ok(Delimiter::Tab);
        }
        match s.trim().to_ascii_lowercase().as_str() {
            "," | "comma" => Ok(Delimiter::Comma),
            ";" | "semicolon" => Ok(Delimiter::Semicolon),
            "\\t" | "tab" => Ok(Delimiter::Tab),
            "|" | "pipe" => Ok(Delimiter::Pipe),
            _ => Err(ExportError::Config(format!("Unsupported delimiter: '{}'", s))),
        }
    }
}

/// テキストの文字エンコーディング
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8（デフォルト）
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    /// 7ビットASCII
    #[serde(rename = "ascii")]
    Ascii,
    /// ISO-8859-1（Latin-1）
    #[serde(rename = "iso-8859-1")]
    Iso8859_1,
}

impl TextEncoding {
    /// すべてのエンコーディング
    pub const ALL: [TextEncoding; 3] = [
        TextEncoding::Utf8,
        TextEncoding::Ascii,
        TextEncoding::Iso8859_1,
    ];

    /// エンコーディングのラベル
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Iso8859_1 => "iso-8859-1",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" => Ok(TextEncoding::Iso8859_1),
            _ => Err(ExportError::Config(format!("Unsupported encoding: '{}'", s))),
        }
    }
}
