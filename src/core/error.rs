use thiserror::Error;

/// Failures of the table-extraction stages for a single image.
///
/// None of these abort a batch; the caller skips the image's tabular export.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("need at least {needed} table tokens to estimate letter width, found {found}")]
    MissingReferenceToken { needed: usize, found: usize },

    #[error("reference token for letter width has no text")]
    EmptyReferenceToken,

    #[error("no tokens left to use as a value for title '{title}'")]
    EmptyTokenPool { title: String },

    #[error("OCR failed: {0}")]
    Ocr(#[from] anyhow::Error),
}
