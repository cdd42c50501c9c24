use chrono::NaiveDate;

use crate::core::config::ExtractionConfig;
use crate::core::model::Token;

/// Which OCR pass a token list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPolicy {
    /// Full-image pass. Tokens anchor the table mask, so drawing callouts are rejected.
    Drawing,
    /// Second pass over the isolated table. Only confidence is checked.
    Table,
}

pub fn filter_tokens(
    tokens: Vec<Token>,
    policy: FilterPolicy,
    config: &ExtractionConfig,
) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|token| accepts(token, policy, config))
        .collect()
}

pub fn accepts(token: &Token, policy: FilterPolicy, config: &ExtractionConfig) -> bool {
    match policy {
        FilterPolicy::Table => token.confidence > config.table_min_confidence,
        FilterPolicy::Drawing => {
            token.confidence > config.drawing_min_confidence
                && token.char_count() > 1
                && (is_label_text(&token.text, &config.disallowed_words)
                    || is_date(&token.text, &config.date_format))
        }
    }
}

/// Disallowed words match case-sensitively, as substrings.
fn is_label_text(text: &str, disallowed: &[String]) -> bool {
    text.chars().any(char::is_alphabetic)
        && !disallowed.iter().any(|word| text.contains(word.as_str()))
}

/// Whether `text` parses as a date in `format`. Parse failures simply mean "no".
pub fn is_date(text: &str, format: &str) -> bool {
    NaiveDate::parse_from_str(text, format).is_ok()
}
