use tracing::debug;

use crate::core::config::{ExtractionConfig, RowGrouping, RowOrder};
use crate::core::model::{AmendmentRow, MergedToken};
use crate::table::titles::TitleMatcher;

/// Groups leftover tokens into amendment rows.
///
/// A token stays in the current row while its vertical center is within
/// `row_tolerance` of the row's reference token, the one added last by default;
/// otherwise it opens a new row.
pub fn reconstruct_rows(entries: Vec<MergedToken>, config: &ExtractionConfig) -> Vec<AmendmentRow> {
    let mut groups: Vec<Vec<MergedToken>> = Vec::new();
    for entry in entries {
        let joins = groups
            .last()
            .and_then(|row| reference(row, config.row_grouping))
            .map_or(false, |prev| prev.bbox.same_line(&entry.bbox, config.row_tolerance));
        match groups.last_mut() {
            Some(row) if joins => row.push(entry),
            _ => groups.push(vec![entry]),
        }
    }

    let mut headers = TitleMatcher::new(
        &config.vocabulary.amendment_headers,
        config.similarity_threshold,
    );
    groups
        .into_iter()
        .map(|mut group| {
            if config.row_order == RowOrder::Horizontal {
                group.sort_by(|a, b| a.bbox.left().total_cmp(&b.bbox.left()));
            }
            let header = is_header(&group, &mut headers);
            AmendmentRow {
                cells: group.iter().map(|cell| cell.text.clone()).collect(),
                header,
                token_ids: group.iter().flat_map(|cell| cell.sources.iter().copied()).collect(),
            }
        })
        .inspect(|row| debug!(cells = row.cells.len(), header = row.header, "amendment row"))
        .collect()
}

fn reference(row: &[MergedToken], grouping: RowGrouping) -> Option<&MergedToken> {
    match grouping {
        RowGrouping::Chain => row.last(),
        RowGrouping::Anchor => row.first(),
    }
}

/// At least half the cells name an unclaimed header. Headers are only claimed
/// when the row qualifies.
fn is_header(group: &[MergedToken], headers: &mut TitleMatcher<'_>) -> bool {
    let mut trial = headers.clone();
    let hits = group
        .iter()
        .filter(|cell| trial.claim(&cell.text).is_some())
        .count();
    let header = hits * 2 >= group.len();
    if header {
        *headers = trial;
    }
    header
}
