//! Types Module
//!
//! リクエスト・レスポンスおよび表データなど、クレート全体で使用する共通データ型。

use crate::api::TargetFormat;
use crate::archive::ArchiveManifest;
use crate::error::ExportError;
use crate::options::FormatOptions;
use std::fmt;

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 整数
    Int(i64),

    /// 浮動小数点数
    Float(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// テキストフィールドから型を推論してセル値を生成する
    ///
    /// 整数 → 浮動小数点数 → 論理値（`true`/`false`、大文字小文字は無視）の順に試し、
    /// いずれにも該当しなければ文字列として扱います。空文字列は`Empty`になります。
    pub fn infer(field: &str) -> CellValue {
        if field.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(n) = field.parse::<i64>() {
            return CellValue::Int(n);
        }
        // "inf"や"nan"を数値として拾わないよう、数字を含むものに限定する
        if field.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(n) = field.parse::<f64>() {
                return CellValue::Float(n);
            }
        }
        if field.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if field.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }
        CellValue::String(field.to_string())
    }

    /// JSON値に変換する（有限でない浮動小数点数は`null`）
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Int(n) => serde_json::Value::from(*n),
            CellValue::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::String(s) => serde_json::Value::String(s.clone()),
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Empty => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(n) => write!(f, "{}", n),
            // 整数値の浮動小数点数にも小数点を付け、再読み込み時に整数と区別できるようにする
            CellValue::Float(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{:.1}", n),
            CellValue::Float(n) => write!(f, "{}", n),
            CellValue::String(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Float(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// 名前付き列を持つ表データ
///
/// すべての行は列数と同じ長さを持ちます。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// 列名を指定して空の表を生成する
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// 列名と行から表を生成する
    ///
    /// 行の長さが列数と一致しない場合は`ExportError::Config`を返します。
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<CellValue>>) -> Result<Self, ExportError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dataset = Dataset::new(columns);
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// 行を追加する
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<(), ExportError> {
        if row.len() != self.columns.len() {
            return Err(ExportError::Config(format!(
                "Row {} has {} cells, expected {}",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// 列数
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// 行数（ヘッダー行を除く）
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// 指定した列のみを含む表を返す
    ///
    /// 出力される列の順序は、選択の順序ではなく元の表の列順です。
    /// 存在しない列名が含まれる場合、または選択が空の場合は`ExportError::Config`を返します。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use exportzero::Dataset;
    ///
    /// let dataset = Dataset::new(["a", "b", "c"]);
    /// let selected = dataset.select(&["c", "a"]).unwrap();
    /// assert_eq!(selected.columns(), ["a", "c"]);
    /// ```
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Dataset, ExportError> {
        if names.is_empty() {
            return Err(ExportError::Config(
                "Column selection must not be empty".to_string(),
            ));
        }
        for name in names {
            if !self.columns.iter().any(|c| c == name.as_ref()) {
                return Err(ExportError::Config(format!(
                    "Column '{}' not found",
                    name.as_ref()
                )));
            }
        }

        let indices: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| names.iter().any(|n| n.as_ref() == c.as_str()))
            .map(|(idx, _)| idx)
            .collect();

        Ok(Dataset {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }
}

/// エクスポート対象のデータ
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// 生テキスト
    Text(String),
    /// 表データ
    Table(Dataset),
    /// 画像ファイルのバイト列（PNG, JPEGなど）
    Image(Vec<u8>),
    /// ZIPにまとめる名前付きバイト列
    Archive(ArchiveManifest),
}

impl Payload {
    /// ペイロードの種類名
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Table(_) => "table",
            Payload::Image(_) => "image",
            Payload::Archive(_) => "archive",
        }
    }

    /// ペイロードの概算バイト数
    pub(crate) fn approximate_size(&self) -> u64 {
        match self {
            Payload::Text(text) => text.len() as u64,
            Payload::Table(dataset) => dataset
                .rows()
                .iter()
                .flatten()
                .map(|cell| match cell {
                    CellValue::String(s) => s.len() as u64,
                    _ => 8,
                })
                .sum(),
            Payload::Image(bytes) => bytes.len() as u64,
            Payload::Archive(manifest) => manifest.total_size(),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Dataset> for Payload {
    fn from(dataset: Dataset) -> Self {
        Payload::Table(dataset)
    }
}

impl From<ArchiveManifest> for Payload {
    fn from(manifest: ArchiveManifest) -> Self {
        Payload::Archive(manifest)
    }
}

/// エクスポート要求
///
/// ユーザー操作ごとに生成され、`Exporter::export`に渡されて消費されます。
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub payload: Payload,
    pub format: TargetFormat,
    pub filename_prefix: String,
    pub options: FormatOptions,
}

impl ExportRequest {
    /// ファイル名接頭辞のデフォルト値
    pub const DEFAULT_PREFIX: &'static str = "file";

    pub fn new(payload: impl Into<Payload>, format: TargetFormat) -> Self {
        Self {
            payload: payload.into(),
            format,
            filename_prefix: Self::DEFAULT_PREFIX.to_string(),
            options: FormatOptions::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    pub fn with_options(mut self, options: FormatOptions) -> Self {
        self.options = options;
        self
    }
}

/// エクスポート結果
///
/// ダウンロードに必要なバイト列・ファイル名・MIMEタイプの組です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: &'static str,
    pub format: TargetFormat,
}
