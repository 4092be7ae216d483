//! Timestamp Module
//!
//! ファイル名に埋め込むセッションタイムスタンプ。

use crate::error::ExportError;
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::fmt;

/// ファイル名に使用する書式（例: `20250102-030405`）
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// ファイル名用のタイムスタンプ
///
/// `Exporter`の構築時に一度だけ取得され、以後のすべてのエクスポートで
/// 共有されます。テストなどで決定的なファイル名が必要な場合は、
/// `ExporterBuilder::with_timestamp`または`Exporter::export_at`で明示的に渡します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// ローカル時刻の現在時刻
    pub fn now() -> Self {
        Self(Local::now().naive_local())
    }

    pub fn new(datetime: NaiveDateTime) -> Self {
        Self(datetime)
    }

    /// 年月日時分秒から生成する（不正な値の場合は`None`）
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        min: u32,
        sec: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, min, sec)
            .map(Self)
    }

    /// `%Y%m%d-%H%M%S`形式の文字列を解析する
    pub fn parse(s: &str) -> Result<Self, ExportError> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|e| ExportError::Config(format!("Invalid timestamp '{}': {}", s, e)))
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}
