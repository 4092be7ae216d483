//! Image Codec Module
//!
//! 画像バイト列のデコードと、PNG/JPEGへの再エンコード。
//! 実際のコーデック処理は`image`クレートに委譲します。

use crate::api::ImageTarget;
use crate::error::ExportError;
use std::fmt;

/// 画像の再エンコードを行うコーデック
///
/// `Exporter`には任意で1つだけ注入されます。注入されていない場合、
/// 画像のエクスポートは`ExportError::ExportUnavailable`になります。
pub trait ImageCodec: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// 入力バイト列をデコードし、指定コンテナで再エンコードする
    ///
    /// デコードに失敗した場合は`ExportError::UnsupportedImageFormat`を返します。
    /// `quality`はJPEGの場合のみ使用されます（1〜100）。
    fn transcode(
        &self,
        input: &[u8],
        target: ImageTarget,
        quality: u8,
    ) -> Result<Vec<u8>, ExportError>;
}

/// デフォルトの画像コーデック
///
/// `image`フィーチャーが無効な場合は`None`です。
pub fn default_image_codec() -> Option<Box<dyn ImageCodec>> {
    #[cfg(feature = "image")]
    {
        Some(Box::new(RasterCodec::new()))
    }
    #[cfg(not(feature = "image"))]
    {
        None
    }
}

/// マジックバイトから画像コンテナを判定する
///
/// 判定できない場合は`None`を返します。
///
/// # 使用例
///
/// ```rust
/// use exportzero::detect_image_format;
///
/// assert_eq!(detect_image_format(b"\x89PNG\r\n\x1a\n...."), Some("png"));
/// assert_eq!(detect_image_format(b"hello"), None);
/// ```
pub fn detect_image_format(bytes: &[u8]) -> Option<&'static str> {
    const SIGNATURES: [(&[u8], &str); 7] = [
        (b"\x89PNG\r\n\x1a\n", "png"),
        (b"\xFF\xD8\xFF", "jpeg"),
        (b"GIF87a", "gif"),
        (b"GIF89a", "gif"),
        (b"BM", "bmp"),
        (b"II*\x00", "tiff"),
        (b"MM\x00*", "tiff"),
    ];

    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("webp");
    }
    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, name)| *name)
}

#[cfg(feature = "image")]
pub use self::raster_codec::RasterCodec;

#[cfg(feature = "image")]
mod raster_codec {
    use super::*;
    use ::image::codecs::jpeg::JpegEncoder;
    use ::image::ImageFormat;
    use log::debug;
    use std::io::Cursor;

    /// `image`クレートによるコーデック
    ///
    /// PNGとJPEGのデコード・エンコードに対応します。JPEGへの変換時は
    /// アルファチャンネルを破棄してRGB8に変換します。
    #[derive(Debug, Default, Clone, Copy)]
    pub struct RasterCodec;

    impl RasterCodec {
        pub fn new() -> Self {
            Self
        }
    }

    impl ImageCodec for RasterCodec {
        fn name(&self) -> &'static str {
            "image"
        }

        fn transcode(
            &self,
            input: &[u8],
            target: ImageTarget,
            quality: u8,
        ) -> Result<Vec<u8>, ExportError> {
            if input.is_empty() {
                return Err(ExportError::UnsupportedImageFormat(
                    "image payload is empty".to_string(),
                ));
            }

            let detected = detect_image_format(input).unwrap_or("unknown");
            let image = ::image::load_from_memory(input).map_err(|e| {
                ExportError::UnsupportedImageFormat(format!(
                    "cannot decode {} image: {}",
                    detected, e
                ))
            })?;
            debug!(
                "decoded {} image {}x{}",
                detected,
                image.width(),
                image.height()
            );

            let mut output = Vec::new();
            match target {
                ImageTarget::Png => {
                    image
                        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
                        .map_err(|e| {
                            ExportError::UnsupportedImageFormat(format!("cannot encode png: {}", e))
                        })?;
                }
                ImageTarget::Jpeg => {
                    let rgb = image.to_rgb8();
                    let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
                    encoder.encode_image(&rgb).map_err(|e| {
                        ExportError::UnsupportedImageFormat(format!("cannot encode jpeg: {}", e))
                    })?;
                }
            }
            Ok(output)
        }
    }
}
