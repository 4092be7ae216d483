//! Text Encoding Module
//!
//! 文字列とバイト列の相互変換（UTF-8 / ASCII / ISO-8859-1）。

use crate::api::TextEncoding;
use crate::error::ExportError;

/// 文字列を指定エンコーディングのバイト列に変換する
///
/// 表現できない文字が含まれる場合は、最初に見つかった文字とその位置を
/// 含む`ExportError::Encoding`を返します。
pub fn encode_text(text: &str, encoding: TextEncoding) -> Result<Vec<u8>, ExportError> {
    let limit = match encoding {
        TextEncoding::Utf8 => return Ok(text.as_bytes().to_vec()),
        TextEncoding::Ascii => 0x7F,
        TextEncoding::Iso8859_1 => 0xFF,
    };

    let mut bytes = Vec::with_capacity(text.len());
    for (position, ch) in text.chars().enumerate() {
        let code = ch as u32;
        if code > limit {
            return Err(unrepresentable(ch, position, encoding));
        }
        bytes.push(code as u8);
    }
    Ok(bytes)
}

/// バイト列を指定エンコーディングの文字列として復元する
pub fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Result<String, ExportError> {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
            .map_err(|e| ExportError::Encoding(format!("input is not valid utf-8: {}", e))),
        TextEncoding::Ascii => {
            if let Some(position) = bytes.iter().position(|b| !b.is_ascii()) {
                return Err(ExportError::Encoding(format!(
                    "byte 0x{:02X} at offset {} is not valid ascii",
                    bytes[position], position
                )));
            }
            Ok(bytes.iter().map(|&b| b as char).collect())
        }
        // Latin-1は全256バイトがU+0000..U+00FFに一対一で対応する
        TextEncoding::Iso8859_1 => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}

fn unrepresentable(ch: char, position: usize, encoding: TextEncoding) -> ExportError {
    ExportError::Encoding(format!(
        "character {:?} (U+{:04X}) at position {} cannot be encoded as {}",
        ch, ch as u32, position, encoding
    ))
}
