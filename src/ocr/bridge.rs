use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use image::{GrayImage, ImageFormat};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::core::geometry::BBox;
use crate::core::model::Token;
use crate::ocr::{PageSegMode, TokenDetector};

/// Tesseract TSV level of word rows.
const WORD_LEVEL: u32 = 5;

/// Runs the `tesseract` binary on images staged in a work directory.
#[derive(Debug, Clone)]
pub struct TesseractBridge {
    work_dir: PathBuf,
    binary: PathBuf,
    lang: String,
}

impl TesseractBridge {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            binary: PathBuf::from("tesseract"),
            lang: "eng".to_string(),
        }
    }

    pub fn with_binary(mut self, binary: PathBuf) -> Self {
        self.binary = binary;
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }
}

impl TokenDetector for TesseractBridge {
    fn detect_tokens(&self, image: &GrayImage, mode: PageSegMode) -> Result<Vec<Token>> {
        fs::create_dir_all(&self.work_dir)?;
        let staged = tempfile::Builder::new()
            .prefix("ocr-")
            .suffix(".png")
            .tempfile_in(&self.work_dir)
            .with_context(|| format!("failed to stage image in {}", self.work_dir.display()))?;
        image
            .save_with_format(staged.path(), ImageFormat::Png)
            .with_context(|| "failed to write staged OCR image")?;

        let output = Command::new(&self.binary)
            .arg(staged.path())
            .arg("stdout")
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(mode.psm().to_string())
            .arg("-l")
            .arg(&self.lang)
            .arg("tsv")
            .output()
            .with_context(|| "failed to invoke tesseract; is it installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract failed: {stderr}");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let tokens = parse_tsv(&stdout)?;
        debug!(count = tokens.len(), psm = mode.psm(), "tesseract returned tokens");
        Ok(tokens)
    }
}

/// Parses Tesseract TSV output into word tokens, in the order Tesseract emitted them.
pub fn parse_tsv(data: &str) -> Result<Vec<Token>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(data.as_bytes());

    let mut tokens = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("malformed TSV record {}", line + 1))?;
        let level: u32 = parse_field(&record, 0, "level")?;
        if level != WORD_LEVEL {
            continue;
        }
        let text = record.get(11).unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        let bbox = BBox::from_ltwh(
            parse_field(&record, 6, "left")?,
            parse_field(&record, 7, "top")?,
            parse_field(&record, 8, "width")?,
            parse_field(&record, 9, "height")?,
        );
        let confidence = parse_field(&record, 10, "conf")?;
        tokens.push(Token::new(text, confidence, bbox));
    }
    Ok(tokens)
}

fn parse_field<T: std::str::FromStr>(record: &StringRecord, idx: usize, name: &str) -> Result<T> {
    let raw = record
        .get(idx)
        .ok_or_else(|| anyhow::anyhow!("TSV record is missing the '{name}' column"))?;
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid '{name}' value in TSV: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t
4\t1\t1\t1\t1\t0\t100\t100\t160\t14\t-1\t
5\t1\t1\t1\t1\t1\t100\t100\t54\t14\t96.417\tTITLE:
5\t1\t1\t1\t1\t2\t180\t102\t81\t13\t91\tBRACKET-A
5\t1\t1\t1\t1\t3\t270\t102\t5\t13\t95\t
";

    #[test]
    fn keeps_word_rows_in_order() {
        let tokens = parse_tsv(SAMPLE).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "TITLE:");
        assert_eq!(tokens[0].bbox, BBox::from_ltwh(100.0, 100.0, 54.0, 14.0));
        assert!((tokens[0].confidence - 96.417).abs() < 1e-3);
        assert_eq!(tokens[1].text, "BRACKET-A");
        assert_eq!(tokens[1].confidence, 91.0);
    }

    #[test]
    fn rejects_non_numeric_geometry() {
        let data = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
5\t1\t1\t1\t1\t1\tx\t100\t54\t14\t96\tTITLE:
";
        let err = parse_tsv(data).unwrap_err();
        assert!(err.to_string().contains("'left'"));
    }

    #[test]
    fn missing_binary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = TesseractBridge::new(dir.path().to_path_buf())
            .with_binary(dir.path().join("no-such-tesseract"))
            .with_lang("deu".to_string());
        let blank = GrayImage::from_pixel(20, 20, image::Luma([255]));
        let err = bridge.detect_tokens(&blank, PageSegMode::UniformBlock).unwrap_err();
        assert!(format!("{err:#}").contains("failed to invoke tesseract"));
    }

    #[test]
    #[ignore] // needs a local tesseract install
    fn reads_rendered_text() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = TesseractBridge::new(dir.path().to_path_buf());
        let blank = GrayImage::from_pixel(200, 80, image::Luma([255]));
        let tokens = bridge.detect_tokens(&blank, PageSegMode::UniformBlock).unwrap();
        assert!(tokens.is_empty());
    }
}
