use crate::core::geometry::BBox;

/// Position of a token in the list one OCR call returned.
pub type TokenId = usize;

/// A text fragment as recognised by OCR.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    /// Engine confidence on a 0-100 scale.
    pub confidence: f32,
    pub bbox: BBox,
}

impl Token {
    pub fn new(text: impl Into<String>, confidence: f32, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// One or more OCR tokens read as a single word or phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedToken {
    pub text: String,
    pub bbox: BBox,
    /// Ids of the OCR tokens absorbed into this one, in reading order.
    pub sources: Vec<TokenId>,
    /// Box of the most recently absorbed token; line checks are made against it.
    pub last: BBox,
}

impl MergedToken {
    pub fn single(id: TokenId, token: &Token) -> Self {
        Self {
            text: token.text.clone(),
            bbox: token.bbox,
            sources: vec![id],
            last: token.bbox,
        }
    }

    /// Appends `other` after `self`: texts are space-joined, boxes unioned.
    pub fn absorb(&mut self, other: MergedToken) {
        self.text.push(' ');
        self.text.push_str(&other.text);
        self.bbox = self.bbox.union(&other.bbox);
        self.sources.extend(other.sources);
        self.last = other.last;
    }

    pub fn joined(mut self, other: MergedToken) -> Self {
        self.absorb(other);
        self
    }
}

/// A token recognised as a label from the title vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleMatch {
    pub token: MergedToken,
    /// Vocabulary entry the token was matched to.
    pub entry: String,
    pub ratio: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedField {
    pub title: String,
    pub value: String,
    pub token_ids: Vec<TokenId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmendmentRow {
    pub cells: Vec<String>,
    /// Set when the row reads as the amendments table header.
    pub header: bool,
    pub token_ids: Vec<TokenId>,
}

/// Everything recovered from the title block and amendments table of one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingInfo {
    pub fields: Vec<MatchedField>,
    pub amendments: Vec<AmendmentRow>,
}

impl DrawingInfo {
    /// Output rows in emission order: fields first, then amendment rows.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let fields = self
            .fields
            .iter()
            .map(|field| vec![field.title.clone(), field.value.clone()]);
        let amendments = self.amendments.iter().map(|row| row.cells.clone());
        fields.chain(amendments).collect()
    }

    pub fn field(&self, title: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.title == title)
            .map(|field| field.value.as_str())
    }
}
