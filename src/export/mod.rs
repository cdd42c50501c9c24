pub mod csv_export;
pub mod image_export;

use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::DrawingInfo;

pub use csv_export::CsvExporter;
pub use image_export::DrawingWriter;

/// Sink for the tabular record of one drawing.
pub trait Exporter {
    /// Writes the record for the image named `stem`, returning the file written.
    fn export(&self, stem: &str, info: &DrawingInfo) -> Result<PathBuf>;
}
