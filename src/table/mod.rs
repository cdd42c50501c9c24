//! Reading a title block and amendments table out of table-pass OCR tokens.
//!
//! Every stage takes entries out of an owned pool and hands on what it left,
//! so a token ends up in at most one field or row.

pub mod associate;
pub mod merge;
pub mod pool;
pub mod rows;
pub mod titles;

use tracing::debug;

use crate::core::config::ExtractionConfig;
use crate::core::error::ExtractionError;
use crate::core::model::{DrawingInfo, Token};
use associate::associate_values;
use merge::{letter_width, merge_adjacent};
use pool::TokenPool;
use rows::reconstruct_rows;
use titles::match_titles;

pub struct TableExtractor<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> TableExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// `tokens` must already have passed the table filter policy.
    pub fn extract(&self, tokens: &[Token]) -> Result<DrawingInfo, ExtractionError> {
        let config = self.config;
        let letter_width = letter_width(tokens, config)?;

        let scan = match_titles(
            TokenPool::from_tokens(tokens).into_entries(),
            letter_width,
            config,
        );
        let merged = merge_adjacent(scan.rest, letter_width, config.row_tolerance);
        debug!(
            tokens = tokens.len(),
            titles = scan.titles.len(),
            merged = merged.len(),
            letter_width,
            "table tokens grouped"
        );

        let mut pool = TokenPool::new(merged);
        let fields = associate_values(&scan.titles, &mut pool, letter_width, config)?;
        let amendments = reconstruct_rows(pool.into_entries(), config);

        Ok(DrawingInfo { fields, amendments })
    }
}
