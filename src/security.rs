//! Security Module
//!
//! 入力サイズの上限と、アーカイブのエントリ名検証を提供するモジュール。
//! 巨大な入力やZIP bomb、パストラバーサルを含むエントリ名への対策です。

use crate::error::ExportError;

/// セキュリティ設定
///
/// エクスポート処理時のサイズ制限を定義します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SecurityConfig {
    /// 入力ペイロードの最大サイズ（バイト）
    /// デフォルト: 512MB (536_870_912 bytes)
    pub max_input_size: u64,
    /// ZIPアーカイブ内の最大エントリ数
    /// デフォルト: 10000
    pub max_archive_entries: usize,
    /// 単一エントリの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_entry_size: u64,
    /// 読み込むアーカイブの展開後の最大合計サイズ（バイト）
    /// デフォルト: 1GB (1_073_741_824 bytes)
    pub max_decompressed_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_input_size: 536_870_912, // 512MB
            max_archive_entries: 10_000,
            max_entry_size: 104_857_600,          // 100MB
            max_decompressed_size: 1_073_741_824, // 1GB
        }
    }
}

impl SecurityConfig {
    /// 入力サイズを検証する
    pub fn check_input_size(&self, size: u64) -> Result<(), ExportError> {
        if size > self.max_input_size {
            return Err(ExportError::SecurityViolation(format!(
                "Input size exceeds maximum: {} bytes (max: {} bytes)",
                size, self.max_input_size
            )));
        }
        Ok(())
    }

    /// アーカイブのエントリ数を検証する
    pub fn check_entry_count(&self, count: usize) -> Result<(), ExportError> {
        if count > self.max_archive_entries {
            return Err(ExportError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                count, self.max_archive_entries
            )));
        }
        Ok(())
    }

    /// 単一エントリのサイズを検証する
    pub fn check_entry_size(&self, name: &str, size: u64) -> Result<(), ExportError> {
        if size > self.max_entry_size {
            return Err(ExportError::SecurityViolation(format!(
                "Entry '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                name, size, self.max_entry_size
            )));
        }
        Ok(())
    }
}

/// アーカイブのエントリ名の検証
///
/// パストラバーサルを防ぐため、エントリ名を検証します。
///
/// # 戻り値
///
/// * `Ok(())` - エントリ名が安全な場合
/// * `Err(String)` - 危険な場合（空、絶対パス、`..`、バックスラッシュを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // Unix形式の`/`で始まるパスと、Windowsのドライブレター付きパスを拒否
    let bytes = path.as_bytes();
    let has_drive_letter =
        bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if path.starts_with('/') || has_drive_letter {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}
