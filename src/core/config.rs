use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Order of cells inside a reconstructed amendment row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RowOrder {
    /// Cells keep the order OCR returned them in.
    #[default]
    Encounter,
    /// Cells are sorted by their left edge.
    Horizontal,
}

/// Which token a candidate is compared with when deciding if it joins the current row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RowGrouping {
    /// The token added last, so rows may follow a gently sloping line.
    #[default]
    Chain,
    /// The row's first token; no cell strays more than the tolerance from it.
    Anchor,
}

/// Known labels of an engineering drawing's title block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleVocabulary {
    /// Key-value labels, tried in this order.
    pub fields: Vec<String>,
    /// Column headers of the amendments table.
    pub amendment_headers: Vec<String>,
}

impl Default for TitleVocabulary {
    fn default() -> Self {
        Self {
            fields: to_strings(&[
                "TITLE:",
                "DRAWING TITLE:",
                "DRAWING NUMBER:",
                "DRAWING NO:",
                "CONTRACTOR:",
                "COMPANY:",
                "COMPANY NAME:",
                "DRAWN:",
                "DRAWN BY:",
                "CHECKED:",
                "CHECKED BY:",
                "APPROVED:",
                "APPROVED BY:",
                "UNIT:",
                "PAGE:",
                "STATUS:",
                "STS:",
                "LANG:",
                "PROJECT NO:",
                "FONT:",
                "CAD NO:",
            ]),
            amendment_headers: to_strings(&[
                "AMENDMENTS",
                "REV",
                "ISSUE",
                "CHANGE(S)",
                "CKD",
                "DATE",
                "BY",
            ]),
        }
    }
}

/// Tuning constants for segmentation and table reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Tokens of the full-image pass must score above this to anchor the table mask.
    pub drawing_min_confidence: f32,
    /// Tokens of the table-only pass must score above this.
    pub table_min_confidence: f32,
    /// Callout words printed on the drawing itself.
    pub disallowed_words: Vec<String>,
    /// `chrono` format of dates that always pass the content filter.
    pub date_format: String,
    /// Half-size of the adaptive threshold window.
    pub adaptive_block_radius: u32,
    /// Grey levels a pixel must sit below its local mean to count as ink.
    pub adaptive_offset: u8,
    /// Image width divided by this gives the ruling-line kernel of the full image.
    pub line_kernel_divisor: u32,
    /// Image width divided by this gives the ruling-line kernel of the table image.
    pub table_line_kernel_divisor: u32,
    pub line_open_iterations: u32,
    pub line_dilate_iterations: u32,
    pub close_iterations: u32,
    /// Contours covering more than this share of the page are page borders.
    pub page_border_area_ratio: f32,
    pub border_dilate_iterations: u32,
    /// Size of the square the final mask is dilated with before whitening the drawing.
    pub mask_margin: u32,
    /// White border added around the cropped drawing.
    pub border_padding: u32,
    /// Maximum vertical center difference of tokens on one line.
    pub row_tolerance: f32,
    /// Slack allowed when a value sits slightly above or left of its title.
    pub position_tolerance: f32,
    /// Added to the per-glyph width estimate.
    pub letter_margin: f32,
    /// Index of the filtered table token the glyph width is estimated from.
    pub reference_token_index: usize,
    pub similarity_threshold: f32,
    /// Titles scoring above this against an identifier label get multi-fragment values.
    pub identifier_threshold: f32,
    /// Maximum gap between identifier fragments, in letter widths.
    pub identifier_gap_factor: f32,
    pub identifier_labels: Vec<String>,
    pub row_order: RowOrder,
    pub row_grouping: RowGrouping,
    pub vocabulary: TitleVocabulary,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            drawing_min_confidence: 70.0,
            table_min_confidence: 10.0,
            disallowed_words: to_strings(&["SIDE", "FRONT", "TOP", "VIEW"]),
            date_format: "%d/%m/%y".to_string(),
            adaptive_block_radius: 5,
            adaptive_offset: 2,
            line_kernel_divisor: 100,
            table_line_kernel_divisor: 160,
            line_open_iterations: 3,
            line_dilate_iterations: 2,
            close_iterations: 3,
            page_border_area_ratio: 0.5,
            border_dilate_iterations: 4,
            mask_margin: 20,
            border_padding: 30,
            row_tolerance: 5.0,
            position_tolerance: 5.0,
            letter_margin: 30.0,
            reference_token_index: 1,
            similarity_threshold: 0.8,
            identifier_threshold: 0.8,
            identifier_gap_factor: 3.0,
            identifier_labels: to_strings(&[
                "DRAWING NO.:",
                "DRAWING NUMBER:",
                "PROJECT NO:",
                "CAD NO:",
            ]),
            row_order: RowOrder::Encounter,
            row_grouping: RowGrouping::Chain,
            vocabulary: TitleVocabulary::default(),
        }
    }
}

impl ExtractionConfig {
    /// Reads overrides from a JSON file; fields missing from the file keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.adaptive_block_radius == 0 {
            anyhow::bail!("adaptive_block_radius must be at least 1");
        }
        Ok(())
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
