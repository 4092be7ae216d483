//! exportzero - Pure-Rust export dispatcher for text, tables, images and archives
//!
//! This crate turns an in-memory payload (plain text, a tabular dataset, raw image
//! bytes or a set of named files) into a downloadable artifact: TXT, JSON, CSV,
//! XLSX, PNG, JPG or ZIP. Every export returns the encoded bytes together with a
//! timestamped filename and the MIME type of the chosen format.
//!
//! # Quick Start
//!
//! ```rust
//! use exportzero::{ExporterBuilder, ExportRequest, TargetFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create an exporter with default settings
//!     let exporter = ExporterBuilder::new().build()?;
//!
//!     // Export plain text as JSON lines
//!     let result = exporter.export(ExportRequest::new("hello\nworld", TargetFormat::Json))?;
//!
//!     assert_eq!(result.mime_type, "application/json");
//!     assert!(result.filename.starts_with("file_"));
//!     assert!(result.filename.ends_with(".json"));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Tabular Exports
//!
//! ```rust
//! use exportzero::{
//!     Delimiter, Dataset, ExporterBuilder, ExportRequest, FormatOptions, TargetFormat,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let exporter = ExporterBuilder::new().build()?;
//!     let dataset = Dataset::from_csv(
//!         b"a,b,c\n1,2,3\n",
//!         Delimiter::Comma,
//!         Default::default(),
//!     )?;
//!
//!     // Keep only two columns and switch to semicolons
//!     let options = FormatOptions::new()
//!         .with_columns(["c", "a"])
//!         .with_delimiter(Delimiter::Semicolon);
//!     let result = exporter.export(
//!         ExportRequest::new(dataset, TargetFormat::Csv)
//!             .with_prefix("report")
//!             .with_options(options),
//!     )?;
//!
//!     assert_eq!(result.bytes, b"a;c\n1;3\n");
//!     Ok(())
//! }
//! ```
//!
//! # Multi-format Bundle
//!
//! ```rust
//! use exportzero::{read_archive, ExporterBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let exporter = ExporterBuilder::new().build()?;
//!     let result = exporter.export_bundle("x y\n1 2", "bundle")?;
//!
//!     let manifest = read_archive(&result.bytes)?;
//!     let names: Vec<&str> = manifest.names().collect();
//!     assert_eq!(names, ["data.txt", "data.csv", "data.json"]);
//!     Ok(())
//! }
//! ```
//!
//! # Optional Features
//!
//! - `xlsxwriter` (default): XLSX output through `rust_xlsxwriter`. Without it the
//!   built-in OOXML writer is used.
//! - `image` (default): PNG/JPEG re-encoding through the `image` crate. Without it
//!   image exports fail with `ExportError::ExportUnavailable`.

mod api;
mod archive;
mod builder;
mod encoding;
mod engine;
mod error;
mod options;
mod output;
mod parser;
mod raster;
mod security;
mod timestamp;
mod types;

// 公開API
pub use api::{
    file_name, mime_type_for_extension, Delimiter, ImageTarget, TargetFormat, TextEncoding,
    DEFAULT_MIME_TYPE,
};
pub use archive::{read_archive, ArchiveManifest};
pub use builder::{CapabilityReport, Exporter, ExporterBuilder};
pub use encoding::{decode_text, encode_text};
#[cfg(feature = "xlsxwriter")]
pub use engine::XlsxWriterEngine;
pub use engine::{default_engines, SpreadsheetEngine, XmlSheetEngine};
pub use error::ExportError;
pub use options::{FormatOptions, DEFAULT_JPEG_QUALITY, DEFAULT_SHEET_NAME};
#[cfg(feature = "image")]
pub use raster::RasterCodec;
pub use raster::{default_image_codec, detect_image_format, ImageCodec};
pub use timestamp::{Timestamp, TIMESTAMP_FORMAT};
pub use types::{CellValue, Dataset, ExportRequest, ExportResult, Payload};
