use crate::core::model::{MergedToken, Token};

/// Tokens not yet claimed by a title, value or amendment row.
///
/// Claiming a token removes it, so nothing can be emitted twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenPool {
    entries: Vec<MergedToken>,
}

impl TokenPool {
    pub fn new(entries: Vec<MergedToken>) -> Self {
        Self { entries }
    }

    /// One entry per token, ids taken from the token positions.
    pub fn from_tokens(tokens: &[Token]) -> Self {
        Self::new(
            tokens
                .iter()
                .enumerate()
                .map(|(id, token)| MergedToken::single(id, token))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MergedToken> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergedToken> {
        self.entries.iter()
    }

    pub fn take(&mut self, index: usize) -> Option<MergedToken> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Removes `count` consecutive entries starting at `start`, clamped to the pool.
    pub fn take_run(&mut self, start: usize, count: usize) -> Vec<MergedToken> {
        let start = start.min(self.entries.len());
        let end = start.saturating_add(count).min(self.entries.len());
        self.entries.drain(start..end).collect()
    }

    pub fn into_entries(self) -> Vec<MergedToken> {
        self.entries
    }
}
