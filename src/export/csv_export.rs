use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::model::DrawingInfo;
use crate::export::Exporter;

/// Writes `<stem>_drawingInfo.csv`: one row per field, then one per amendment row.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    out_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.out_dir.join(format!("{stem}_drawingInfo.csv"))
    }
}

/// Rows have different widths, so the writer runs in flexible mode.
pub fn render_csv(info: &DrawingInfo) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in info.rows() {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv buffer: {}", err.error()))
}

impl Exporter for CsvExporter {
    fn export(&self, stem: &str, info: &DrawingInfo) -> Result<PathBuf> {
        let data = render_csv(info)?;
        let path = self.path_for(stem);
        fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}
