//! Undoing OCR over-segmentation of words that belong together.

use crate::core::config::ExtractionConfig;
use crate::core::error::ExtractionError;
use crate::core::model::{MergedToken, Token};

/// Estimated glyph width plus margin, from the configured reference token.
pub fn letter_width(tokens: &[Token], config: &ExtractionConfig) -> Result<f32, ExtractionError> {
    let index = config.reference_token_index;
    let reference = tokens
        .get(index)
        .ok_or(ExtractionError::MissingReferenceToken {
            needed: index + 1,
            found: tokens.len(),
        })?;
    let chars = reference.char_count();
    if chars == 0 {
        return Err(ExtractionError::EmptyReferenceToken);
    }
    Ok(reference.bbox.width() / chars as f32 + config.letter_margin)
}

/// Whether `next` continues `prev` on the same line within `max_gap`.
pub fn adjacent(prev: &MergedToken, next: &MergedToken, max_gap: f32, line_tolerance: f32) -> bool {
    prev.last.same_line(&next.bbox, line_tolerance) && prev.bbox.gap_to(&next.bbox) <= max_gap
}

/// Greedy left-to-right merge: each token joins the word built so far when
/// adjacent to it, otherwise starts a new word.
pub fn merge_adjacent(
    entries: Vec<MergedToken>,
    letter_width: f32,
    line_tolerance: f32,
) -> Vec<MergedToken> {
    let mut merged: Vec<MergedToken> = Vec::with_capacity(entries.len());
    for entry in entries {
        match merged.last_mut() {
            Some(prev) if adjacent(prev, &entry, letter_width, line_tolerance) => prev.absorb(entry),
            _ => merged.push(entry),
        }
    }
    merged
}
