//! Format Options Module
//!
//! 出力形式ごとの設定（区切り文字、エンコーディング、列選択など）を保持する。

use crate::api::{Delimiter, TextEncoding};
use crate::error::ExportError;
use log::debug;

/// デフォルトのシート名
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// デフォルトのJPEG品質
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// 形式ごとのオプション
///
/// 各オプションは対応する出力形式でのみ参照され、それ以外の形式では無視されます。
///
/// # 使用例
///
/// ```rust
/// use exportzero::{Delimiter, FormatOptions, TextEncoding};
///
/// let options = FormatOptions::new()
///     .with_delimiter(Delimiter::Semicolon)
///     .with_encoding(TextEncoding::Iso8859_1)
///     .with_columns(["name", "price"]);
/// assert_eq!(options.delimiter(), Delimiter::Semicolon);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    delimiter: Delimiter,
    encoding: TextEncoding,
    columns: Option<Vec<String>>,
    jpeg_quality: u8,
    sheet_name: String,
    json_indent: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            encoding: TextEncoding::Utf8,
            columns: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            json_indent: 2,
        }
    }
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 文字列のキーと値の組からオプションを生成する
    ///
    /// 認識するキー: `delimiter`（`sep`）, `encoding`, `columns`（カンマ区切り）,
    /// `quality`, `sheet_name`, `indent`。
    /// 未知のキーは無視されます。認識したキーの値が不正な場合は`ExportError::Config`を返します。
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ExportError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = FormatOptions::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "delimiter" | "sep" => options.delimiter = value.parse()?,
                "encoding" => options.encoding = value.parse()?,
                "columns" => {
                    options.columns = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|c| !c.is_empty())
                            .map(str::to_string)
                            .collect(),
                    )
                }
                "quality" => {
                    options.jpeg_quality = value.trim().parse().map_err(|_| {
                        ExportError::Config(format!("Invalid JPEG quality: '{}'", value))
                    })?
                }
                "sheet_name" => options.sheet_name = value.to_string(),
                "indent" => {
                    options.json_indent = value.trim().parse().map_err(|_| {
                        ExportError::Config(format!("Invalid JSON indent: '{}'", value))
                    })?
                }
                other => debug!("ignoring unrecognized format option '{}'", other),
            }
        }
        options.validate()?;
        Ok(options)
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// エクスポートする列を選択する（表データのみ）
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// JPEG品質（1〜100）
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// XLSX出力時のシート名
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// JSON出力のインデント幅（0で改行なしのコンパクト出力）
    pub fn with_json_indent(mut self, indent: usize) -> Self {
        self.json_indent = indent;
        self
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn json_indent(&self) -> usize {
        self.json_indent
    }

    /// オプションの整合性を検証する
    ///
    /// # 発生し得るエラー
    ///
    /// * `ExportError::Config(String)`:
    ///   * JPEG品質が1〜100の範囲外
    ///   * シート名が空、31文字超、または`[]:*?/\`を含む
    ///   * JSONインデントが16を超える
    pub fn validate(&self) -> Result<(), ExportError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ExportError::Config(format!(
                "Invalid JPEG quality: {} (expected 1-100)",
                self.jpeg_quality
            )));
        }

        // Excelのシート名規則
        if self.sheet_name.is_empty() {
            return Err(ExportError::Config("Sheet name must not be empty".to_string()));
        }
        if self.sheet_name.chars().count() > 31 {
            return Err(ExportError::Config(format!(
                "Sheet name '{}' exceeds 31 characters",
                self.sheet_name
            )));
        }
        if let Some(ch) = self
            .sheet_name
            .chars()
            .find(|c| matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        {
            return Err(ExportError::Config(format!(
                "Sheet name '{}' contains invalid character '{}'",
                self.sheet_name, ch
            )));
        }

        if self.json_indent > 16 {
            return Err(ExportError::Config(format!(
                "Invalid JSON indent: {} (max: 16)",
                self.json_indent
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FormatOptions::new();
        assert_eq!(options.delimiter(), Delimiter::Comma);
        assert_eq!(options.encoding(), TextEncoding::Utf8);
        assert!(options.columns().is_none());
        assert_eq!(options.jpeg_quality(), 90);
        assert_eq!(options.sheet_name(), "Sheet1");
        assert_eq!(options.json_indent(), 2);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_pairs() {
        let options = FormatOptions::from_pairs([
            ("delimiter", ";"),
            ("encoding", "iso-8859-1"),
            ("columns", "a, c"),
            ("quality", "75"),
        ])
        .unwrap();

        assert_eq!(options.delimiter(), Delimiter::Semicolon);
        assert_eq!(options.encoding(), TextEncoding::Iso8859_1);
        assert_eq!(
            options.columns(),
            Some(&["a".to_string(), "c".to_string()][..])
        );
        assert_eq!(options.jpeg_quality(), 75);
    }

    #[test]
    fn test_from_pairs_ignores_unknown_keys() {
        let options =
            FormatOptions::from_pairs([("index", "false"), ("compression", "gzip")]).unwrap();
        assert_eq!(options, FormatOptions::default());
    }

    #[test]
    fn test_from_pairs_invalid_value() {
        assert!(matches!(
            FormatOptions::from_pairs([("delimiter", ":")]),
            Err(ExportError::Config(_))
        ));
        assert!(matches!(
            FormatOptions::from_pairs([("quality", "high")]),
            Err(ExportError::Config(_))
        ));
        assert!(matches!(
            FormatOptions::from_pairs([("quality", "0")]),
            Err(ExportError::Config(_))
        ));
    }

    #[test]
    fn test_validate_sheet_name() {
        assert!(FormatOptions::new().with_sheet_name("").validate().is_err());
        assert!(FormatOptions::new()
            .with_sheet_name("a".repeat(32))
            .validate()
            .is_err());
        assert!(FormatOptions::new()
            .with_sheet_name("Q1/Q2")
            .validate()
            .is_err());
        assert!(FormatOptions::new()
            .with_sheet_name("売上データ")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_json_indent() {
        assert!(FormatOptions::new().with_json_indent(17).validate().is_err());
        assert!(FormatOptions::new().with_json_indent(0).validate().is_ok());
    }
}
