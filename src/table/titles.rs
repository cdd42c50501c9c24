use tracing::debug;

use crate::core::config::ExtractionConfig;
use crate::core::model::{MergedToken, TitleMatch};
use crate::core::similarity::ratio;
use crate::table::merge::adjacent;

/// Fuzzy lookup into a fixed vocabulary where every entry matches at most once.
///
/// Entries are tried in vocabulary order and the first one reaching the
/// threshold wins, even when a later entry would score higher.
#[derive(Debug, Clone)]
pub struct TitleMatcher<'a> {
    vocabulary: &'a [String],
    consumed: Vec<bool>,
    threshold: f32,
}

impl<'a> TitleMatcher<'a> {
    pub fn new(vocabulary: &'a [String], threshold: f32) -> Self {
        Self {
            vocabulary,
            consumed: vec![false; vocabulary.len()],
            threshold,
        }
    }

    /// First unconsumed entry similar enough to `text`, with its ratio.
    pub fn first_fit(&self, text: &str) -> Option<(usize, f32)> {
        let text = text.to_uppercase();
        self.vocabulary
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.consumed[*idx])
            .map(|(idx, entry)| (idx, ratio(&text, entry)))
            .find(|(_, score)| *score >= self.threshold)
    }

    pub fn consume(&mut self, idx: usize) -> &'a str {
        self.consumed[idx] = true;
        &self.vocabulary[idx]
    }

    /// Finds and consumes in one step.
    pub fn claim(&mut self, text: &str) -> Option<&'a str> {
        self.first_fit(text).map(|(idx, _)| self.consume(idx))
    }
}

/// Titles found in a token stream, and the tokens left over.
#[derive(Debug, Clone, Default)]
pub struct TitleScan {
    pub titles: Vec<TitleMatch>,
    pub rest: Vec<MergedToken>,
}

/// Scans tokens in OCR order for title-block labels.
///
/// A token whose successor sits on the same line within `letter_width` is tried
/// alone and joined with the successor. The span with the higher ratio wins,
/// ties going to the joined span, which then consumes the successor.
pub fn match_titles(
    tokens: Vec<MergedToken>,
    letter_width: f32,
    config: &ExtractionConfig,
) -> TitleScan {
    let mut matcher = TitleMatcher::new(&config.vocabulary.fields, config.similarity_threshold);
    let mut scan = TitleScan::default();
    let mut iter = tokens.into_iter().peekable();

    while let Some(lead) = iter.next() {
        if lead.text.chars().count() <= 1 {
            scan.rest.push(lead);
            continue;
        }

        let joined = iter
            .peek()
            .filter(|next| adjacent(&lead, next, letter_width, config.row_tolerance))
            .map(|next| lead.clone().joined(next.clone()));

        let alone = matcher.first_fit(&lead.text);
        let together = joined
            .as_ref()
            .and_then(|span| matcher.first_fit(&span.text));

        let (token, (idx, score)) = match (alone, together, joined) {
            (alone, Some(hit), Some(span)) if alone.map_or(true, |(_, a)| hit.1 >= a) => {
                iter.next();
                (span, hit)
            }
            (Some(hit), _, _) => (lead, hit),
            _ => {
                scan.rest.push(lead);
                continue;
            }
        };

        let entry = matcher.consume(idx).to_string();
        debug!(text = %token.text, entry = %entry, ratio = score, "matched title");
        scan.titles.push(TitleMatch {
            token,
            entry,
            ratio: score,
        });
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use crate::core::model::Token;
    use crate::table::pool::TokenPool;
    use pretty_assertions::assert_eq;

    fn scan(tokens: &[(&str, f32, f32, f32)]) -> TitleScan {
        let tokens: Vec<Token> = tokens
            .iter()
            .map(|(text, left, top, width)| {
                Token::new(*text, 90.0, BBox::from_ltwh(*left, *top, *width, 12.0))
            })
            .collect();
        let config = ExtractionConfig::default();
        match_titles(TokenPool::from_tokens(&tokens).into_entries(), 40.0, &config)
    }

    fn titles(scan: &TitleScan) -> Vec<(&str, &str)> {
        scan.titles
            .iter()
            .map(|t| (t.token.text.as_str(), t.entry.as_str()))
            .collect()
    }

    fn rest(scan: &TitleScan) -> Vec<&str> {
        scan.rest.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn first_fit_respects_vocabulary_order() {
        let vocabulary = vec!["DRAWN:".to_string(), "DRAWN BY:".to_string()];
        let matcher = TitleMatcher::new(&vocabulary, 0.8);
        // Scores exactly 0.8 against "DRAWN:" and 1.0 against "DRAWN BY:".
        assert_eq!(matcher.first_fit("drawn by:"), Some((0, 0.8)));
    }

    #[test]
    fn entries_match_once() {
        let vocabulary = vec!["TITLE:".to_string()];
        let mut matcher = TitleMatcher::new(&vocabulary, 0.8);
        assert_eq!(matcher.claim("TITLE:"), Some("TITLE:"));
        assert_eq!(matcher.claim("TITLE:"), None);
        assert_eq!(matcher.first_fit("TITLE:"), None);
    }

    #[test]
    fn split_label_is_joined() {
        let result = scan(&[("DRAWING", 50.0, 50.0, 70.0), ("NUMBER:", 130.0, 50.0, 70.0)]);
        assert_eq!(titles(&result), vec![("DRAWING NUMBER:", "DRAWING NUMBER:")]);
        assert_eq!(result.titles[0].token.sources, vec![0, 1]);
        assert!(result.rest.is_empty());
    }

    #[test]
    fn exact_label_does_not_swallow_its_value() {
        let result = scan(&[("DRAWING NO:", 50.0, 50.0, 88.0), ("DWG", 150.0, 52.0, 30.0)]);
        assert_eq!(titles(&result), vec![("DRAWING NO:", "DRAWING NO:")]);
        assert_eq!(rest(&result), vec!["DWG"]);
    }

    #[test]
    fn value_next_to_label_stays_in_pool() {
        let result = scan(&[("TITLE:", 100.0, 100.0, 54.0), ("BRACKET-A", 180.0, 102.0, 81.0)]);
        assert_eq!(titles(&result), vec![("TITLE:", "TITLE:")]);
        assert_eq!(rest(&result), vec!["BRACKET-A"]);
    }

    #[test]
    fn each_label_is_matched_once_per_image() {
        let result = scan(&[
            ("TITLE:", 10.0, 10.0, 50.0),
            ("PUMP", 200.0, 10.0, 40.0),
            ("TITLE:", 10.0, 60.0, 50.0),
            ("COVER", 200.0, 60.0, 50.0),
        ]);
        assert_eq!(result.titles.len(), 1);
        assert_eq!(rest(&result), vec!["PUMP", "TITLE:", "COVER"]);
    }

    #[test]
    fn single_characters_are_never_titles() {
        let result = scan(&[("A", 10.0, 10.0, 10.0), ("B", 100.0, 10.0, 10.0)]);
        assert!(result.titles.is_empty());
        assert_eq!(rest(&result), vec!["A", "B"]);
    }
}
