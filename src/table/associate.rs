use tracing::debug;

use crate::core::config::ExtractionConfig;
use crate::core::error::ExtractionError;
use crate::core::geometry::BBox;
use crate::core::model::{MatchedField, TitleMatch};
use crate::core::similarity::ratio;
use crate::table::pool::TokenPool;

/// Resolves a value for every title, in title order, claiming value tokens from `pool`.
pub fn associate_values(
    titles: &[TitleMatch],
    pool: &mut TokenPool,
    letter_width: f32,
    config: &ExtractionConfig,
) -> Result<Vec<MatchedField>, ExtractionError> {
    let mut fields = Vec::with_capacity(titles.len());

    for title in titles {
        if pool.is_empty() {
            return Err(ExtractionError::EmptyTokenPool {
                title: title.token.text.clone(),
            });
        }

        let mut token_ids = title.token.sources.clone();
        let value = match nearest_value(&title.token.bbox, pool, config.position_tolerance) {
            Some(start) => {
                let count = if is_identifier(&title.token.text, config) {
                    1 + continuation_len(pool, start, letter_width * config.identifier_gap_factor, config)
                } else {
                    1
                };
                let parts = pool.take_run(start, count);
                token_ids.extend(parts.iter().flat_map(|part| part.sources.iter().copied()));
                parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            None => {
                debug!(title = %title.token.text, "no value below or right of title");
                String::new()
            }
        };

        debug!(title = %title.token.text, value = %value, "resolved field");
        fields.push(MatchedField {
            title: title.token.text.clone(),
            value,
            token_ids,
        });
    }

    Ok(fields)
}

/// Closest entry whose top-left corner is right of and below the title's, within tolerance.
/// Ties go to the earlier entry.
fn nearest_value(title: &BBox, pool: &TokenPool, tolerance: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, candidate) in pool.iter().enumerate() {
        let bbox = &candidate.bbox;
        if bbox.left() < title.left() - tolerance || bbox.top() < title.top() - tolerance {
            continue;
        }
        let distance = title.top_left_distance(bbox);
        if best.map_or(true, |(_, nearest)| distance < nearest) {
            best = Some((idx, distance));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Labels of identifier fields, whose values tend to be split into fragments.
fn is_identifier(title: &str, config: &ExtractionConfig) -> bool {
    let title = title.to_uppercase();
    config
        .identifier_labels
        .iter()
        .any(|label| ratio(&title, label) > config.identifier_threshold)
}

/// Number of entries after `start` that continue its line, each within `max_gap` of the one before.
fn continuation_len(pool: &TokenPool, start: usize, max_gap: f32, config: &ExtractionConfig) -> usize {
    let mut count = 0;
    while let (Some(current), Some(next)) = (pool.get(start + count), pool.get(start + count + 1)) {
        let continues = current.bbox.same_line(&next.bbox, config.row_tolerance)
            && current.bbox.gap_to(&next.bbox) <= max_gap;
        if !continues {
            break;
        }
        count += 1;
    }
    count
}
