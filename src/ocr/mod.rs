pub mod bridge;
pub mod filter;

use anyhow::Result;
use image::GrayImage;

use crate::core::model::Token;

pub use bridge::TesseractBridge;

/// Layout assumption handed to the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegMode {
    /// The image is a single uniform block of text.
    UniformBlock,
}

impl PageSegMode {
    /// Tesseract `--psm` number.
    pub fn psm(self) -> u8 {
        match self {
            PageSegMode::UniformBlock => 6,
        }
    }
}

/// Source of OCR tokens for an image.
pub trait TokenDetector: Send + Sync {
    fn detect_tokens(&self, image: &GrayImage, mode: PageSegMode) -> Result<Vec<Token>>;
}
