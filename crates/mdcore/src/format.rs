use serde::{Deserialize, Serialize};

/// Structural style of a whole line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockType {
    #[default]
    Plain,
    Heading1,
    Heading2,
    Heading3,
    UnorderedItem,
    OrderedItem,
}

impl BlockType {
    /// Marker written in front of the line when serializing.
    /// Ordered items are numbered by the caller.
    pub fn prefix(self) -> &'static str {
        match self {
            BlockType::Plain | BlockType::OrderedItem => "",
            BlockType::Heading1 => "# ",
            BlockType::Heading2 => "## ",
            BlockType::Heading3 => "### ",
            BlockType::UnorderedItem => "- ",
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, BlockType::UnorderedItem | BlockType::OrderedItem)
    }

    pub fn heading_level(self) -> Option<u8> {
        match self {
            BlockType::Heading1 => Some(1),
            BlockType::Heading2 => Some(2),
            BlockType::Heading3 => Some(3),
            _ => None,
        }
    }
}

/// Character-range style inside a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InlineKind {
    Bold,
    Italic,
}

impl InlineKind {
    pub const ALL: [InlineKind; 2] = [InlineKind::Bold, InlineKind::Italic];

    pub fn marker(self) -> &'static str {
        match self {
            InlineKind::Bold => "**",
            InlineKind::Italic => "*",
        }
    }
}

/// A half-open `[start, end)` range of characters carrying one inline style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineSpan {
    pub start: usize,
    pub end: usize,
    pub kind: InlineKind,
}

impl InlineSpan {
    pub fn new(start: usize, end: usize, kind: InlineKind) -> Self {
        Self { start, end, kind }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One physical line of the composing buffer.
///
/// `text` never contains the block marker or inline markers; those live in
/// `block_type` and `spans`. Span offsets count characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineRecord {
    pub block_type: BlockType,
    pub text: String,
    pub spans: Vec<InlineSpan>,
}

impl LineRecord {
    pub fn new(block_type: BlockType, text: impl Into<String>) -> Self {
        Self {
            block_type,
            text: text.into(),
            spans: Vec::new(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(BlockType::Plain, text)
    }

    pub fn with_span(mut self, start: usize, end: usize, kind: InlineKind) -> Self {
        self.add_span(InlineSpan::new(start, end, kind));
        self
    }

    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Adds a span, clamping it to the text and merging it with overlapping
    /// or touching spans of the same kind.
    pub fn add_span(&mut self, span: InlineSpan) {
        let len = self.char_len();
        let mut span = InlineSpan::new(span.start.min(len), span.end.min(len), span.kind);
        if span.is_empty() {
            return;
        }

        self.spans.retain(|other| {
            if other.kind != span.kind || other.end < span.start || other.start > span.end {
                return true;
            }
            span.start = span.start.min(other.start);
            span.end = span.end.max(other.end);
            false
        });
        self.spans.push(span);
        self.sort_spans();
    }

    /// Re-establishes the span invariant after the text was replaced.
    pub fn normalize_spans(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        for span in spans {
            self.add_span(span);
        }
    }

    fn sort_spans(&mut self) {
        self.spans
            .sort_by(|a, b| a.start.cmp(&b.start).then(a.kind.cmp(&b.kind)));
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `char_idx`-th character, clamped to the end of `text`.
pub fn byte_index(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Substring by character range, clamped to the text.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let start = byte_index(text, start);
    let end = byte_index(text, end).max(start);
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_span_merges_same_kind() {
        let mut line = LineRecord::plain("hello world");
        line.add_span(InlineSpan::new(0, 3, InlineKind::Bold));
        line.add_span(InlineSpan::new(3, 5, InlineKind::Bold));
        line.add_span(InlineSpan::new(2, 8, InlineKind::Italic));

        assert_eq!(
            line.spans,
            vec![
                InlineSpan::new(0, 5, InlineKind::Bold),
                InlineSpan::new(2, 8, InlineKind::Italic),
            ]
        );
    }

    #[test]
    fn test_add_span_clamps_and_drops_empty() {
        let mut line = LineRecord::plain("abc");
        line.add_span(InlineSpan::new(1, 40, InlineKind::Italic));
        line.add_span(InlineSpan::new(7, 9, InlineKind::Bold));

        assert_eq!(line.spans, vec![InlineSpan::new(1, 3, InlineKind::Italic)]);
    }

    #[test]
    fn test_char_helpers_respect_multibyte_text() {
        let text = "héllo世界";
        assert_eq!(char_len(text), 7);
        assert_eq!(byte_index(text, 2), 3);
        assert_eq!(char_slice(text, 5, 7), "世界");
        assert_eq!(char_slice(text, 6, 99), "界");
        assert_eq!(byte_index(text, 99), text.len());
    }

    #[test]
    fn test_line_record_serde_round_trip() {
        let line =
            LineRecord::new(BlockType::OrderedItem, "milk").with_span(0, 4, InlineKind::Bold);
        let json = serde_json::to_string(&line).unwrap();
        let back: LineRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(line, back);
    }
}
