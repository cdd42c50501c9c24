use std::path::PathBuf;

use anyhow::{Context, Result};
use image::GrayImage;

/// Saves cropped drawings as `<stem>_drawing.png`.
#[derive(Debug, Clone)]
pub struct DrawingWriter {
    out_dir: PathBuf,
}

impl DrawingWriter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.out_dir.join(format!("{stem}_drawing.png"))
    }

    pub fn write(&self, stem: &str, drawing: &GrayImage) -> Result<PathBuf> {
        let path = self.path_for(stem);
        drawing
            .save(&path)
            .with_context(|| format!("failed to save drawing {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn writes_png_next_to_stem() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let writer = DrawingWriter::new(dir.path().to_path_buf());
        let drawing = GrayImage::from_pixel(8, 6, Luma([255]));
        let path = writer.write("plan", &drawing)?;
        assert_eq!(path, dir.path().join("plan_drawing.png"));
        let reloaded = image::open(&path)?.to_luma8();
        assert_eq!(reloaded.dimensions(), (8, 6));
        Ok(())
    }
}
