//! Archive Module
//!
//! 名前付きバイト列をdeflate圧縮のZIPアーカイブにまとめる。

use crate::error::ExportError;
use crate::security::{validate_zip_path, SecurityConfig};
use log::debug;
use std::io::{Cursor, Read, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

/// アーカイブに格納するエントリの集合
///
/// エントリ名はアーカイブ内で一意です。既存の名前で`insert`すると、
/// 警告なしに内容が置き換わります（後勝ち）。エントリの位置は最初に
/// 挿入された位置のまま維持されます。
///
/// # 使用例
///
/// ```rust
/// use exportzero::ArchiveManifest;
///
/// let mut manifest = ArchiveManifest::new();
/// manifest.insert("data.txt", "first");
/// let previous = manifest.insert("data.txt", "second");
///
/// assert_eq!(previous.as_deref(), Some(&b"first"[..]));
/// assert_eq!(manifest.get("data.txt"), Some(&b"second"[..]));
/// assert_eq!(manifest.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveManifest {
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// エントリを追加する
    ///
    /// 同名のエントリが既に存在する場合は内容を置き換え、以前の内容を返します。
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Option<Vec<u8>> {
        let name = name.into();
        let content = content.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => {
                debug!("archive entry '{}' overwritten", name);
                Some(std::mem::replace(existing, content))
            }
            None => {
                self.entries.push((name, content));
                None
            }
        }
    }

    /// エントリを追加した新しいマニフェストを返す（ビルダー形式）
    pub fn with_entry(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(name, content);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, content)| content.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 挿入順にエントリ名を返す
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// 挿入順にエントリを返す
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .map(|(n, content)| (n.as_str(), content.as_slice()))
    }

    /// 全エントリの合計バイト数
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c.len() as u64).sum()
    }
}

impl<K, V> FromIterator<(K, V)> for ArchiveManifest
where
    K: Into<String>,
    V: Into<Vec<u8>>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut manifest = ArchiveManifest::new();
        for (name, content) in iter {
            manifest.insert(name, content);
        }
        manifest
    }
}

/// マニフェストをZIPアーカイブに書き出す
///
/// 各エントリはdeflate圧縮されます。エントリ名が不正な場合や
/// ZIPの組み立てに失敗した場合は`ExportError::ArchiveWrite`を返し、
/// 途中までのバイト列は返しません。
pub(crate) fn write_archive(
    manifest: &ArchiveManifest,
    security: &SecurityConfig,
) -> Result<Vec<u8>, ExportError> {
    security.check_entry_count(manifest.len())?;
    for (name, content) in manifest.iter() {
        validate_zip_path(name)
            .map_err(|e| ExportError::ArchiveWrite(format!("Invalid entry name: {}", e)))?;
        security.check_entry_size(name, content.len() as u64)?;
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, content) in manifest.iter() {
        zip.start_file(name, options)
            .map_err(|e| ExportError::ArchiveWrite(format!("{}: {}", name, e)))?;
        zip.write_all(content)
            .map_err(|e| ExportError::ArchiveWrite(format!("{}: {}", name, e)))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| ExportError::ArchiveWrite(format!("{}", e)))?;
    let bytes = cursor.into_inner();
    debug!(
        "archive written: {} entries, {} -> {} bytes",
        manifest.len(),
        manifest.total_size(),
        bytes.len()
    );
    Ok(bytes)
}

/// ZIPアーカイブを読み込み、マニフェストに戻す
///
/// エントリ数・エントリサイズ・展開後の合計サイズの上限と、
/// エントリ名の安全性を検証します。ディレクトリエントリは無視されます。
pub fn read_archive(bytes: &[u8]) -> Result<ArchiveManifest, ExportError> {
    read_archive_with(bytes, &SecurityConfig::default())
}

pub(crate) fn read_archive_with(
    bytes: &[u8],
    security: &SecurityConfig,
) -> Result<ArchiveManifest, ExportError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExportError::Import(format!("ZIP archive error: {}", e)))?;
    security.check_entry_count(archive.len())?;

    let mut manifest = ArchiveManifest::new();
    let mut total_decompressed_size = 0u64;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExportError::Import(format!("ZIP archive error: {}", e)))?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        validate_zip_path(&name).map_err(|e| {
            ExportError::SecurityViolation(format!("Invalid ZIP path: {}", e))
        })?;
        security.check_entry_size(&name, file.size())?;

        // 申告サイズではなく実際に展開したバイト数で数える
        let content = read_entry(&mut file, &name, security)?;
        total_decompressed_size += content.len() as u64;
        if total_decompressed_size > security.max_decompressed_size {
            return Err(ExportError::SecurityViolation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                total_decompressed_size, security.max_decompressed_size
            )));
        }
        manifest.insert(name, content);
    }
    Ok(manifest)
}

/// エントリを上限+1バイトまで読み込み、上限を超えていればエラーを返す
fn read_entry<R: Read>(
    reader: R,
    name: &str,
    security: &SecurityConfig,
) -> Result<Vec<u8>, ExportError> {
    let mut content = Vec::new();
    reader
        .take(security.max_entry_size.saturating_add(1))
        .read_to_end(&mut content)?;
    security.check_entry_size(name, content.len() as u64)?;
    Ok(content)
}
