//! Parser Module
//!
//! アップロードされたCSV/Excelファイル、および空白区切りテキストから
//! `Dataset`を読み込む。

mod delimited;
mod workbook;

pub(crate) use delimited::split_lines;
