use lazy_static::lazy_static;
use regex::Regex;

use crate::format::BlockType;

lazy_static! {
    static ref TASK_ITEM: Regex =
        Regex::new(r"^[-*]\s\[([ xX])\](?:\s|$)").expect("Invalid TASK_ITEM regex pattern");
    static ref NUMERIC_ITEM: Regex =
        Regex::new(r"^\d+\.(?:\s|$)").expect("Invalid NUMERIC_ITEM regex pattern");
    static ref ROMAN_ITEM: Regex =
        Regex::new(r"^[ivxlcdm]+\.\s").expect("Invalid ROMAN_ITEM regex pattern");
    static ref ALPHA_ITEM: Regex =
        Regex::new(r"^[a-z]+\.\s").expect("Invalid ALPHA_ITEM regex pattern");
    static ref HORIZONTAL_RULE: Regex =
        Regex::new(r"^[-*_]{3,}$").expect("Invalid HORIZONTAL_RULE regex pattern");
    static ref INLINE_CODE_LINE: Regex =
        Regex::new(r"^`[^`]+`$").expect("Invalid INLINE_CODE_LINE regex pattern");
}

const QUOTE_CHARS: [char; 4] = ['"', '\u{201C}', '\u{201D}', '\u{300C}'];

/// How an ordered item was enumerated on input. Serialization always
/// writes numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumeratorStyle {
    Numeric,
    Roman,
    Alphabetic,
}

/// The markdown construct a line was recognized as. Constructs that have no
/// block type of their own still classify as `Plain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSyntax {
    None,
    Heading,
    Bullet,
    Task { checked: bool },
    Enumerated(EnumeratorStyle),
    CodeFence,
    InlineCode,
    Quote,
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub block_type: BlockType,
    pub content: String,
    pub syntax: LineSyntax,
}

impl Classification {
    fn new(block_type: BlockType, content: &str, syntax: LineSyntax) -> Self {
        Self {
            block_type,
            content: content.to_string(),
            syntax,
        }
    }

    /// Whether a block marker was found and stripped.
    pub fn has_marker(&self) -> bool {
        self.block_type != BlockType::Plain
    }
}

/// Classifies a raw line into a block type and its marker-free content.
///
/// Matching runs against the line without its indentation and the first rule
/// that matches wins. A marker with nothing after it still counts, so `- `
/// and `#` classify with empty content. Content keeps trailing whitespace.
/// Lines without a block-level construct come back unchanged.
pub fn classify_line(raw: &str) -> Classification {
    let line = raw.trim_start();
    let trimmed = line.trim_end();

    for (marker, block_type) in [
        ("### ", BlockType::Heading3),
        ("## ", BlockType::Heading2),
        ("# ", BlockType::Heading1),
    ] {
        if let Some(content) = after_marker(line, marker) {
            return Classification::new(block_type, content, LineSyntax::Heading);
        }
    }

    if let Some(caps) = TASK_ITEM.captures(line) {
        let checked = caps.get(1).is_some_and(|m| m.as_str() != " ");
        let rest = &line[caps.get(0).map_or(0, |m| m.end())..];
        return Classification::new(
            BlockType::UnorderedItem,
            rest,
            LineSyntax::Task { checked },
        );
    }

    for bullet in ["- ", "* ", "\u{2022} "] {
        if let Some(content) = after_marker(line, bullet) {
            return Classification::new(BlockType::UnorderedItem, content, LineSyntax::Bullet);
        }
    }

    for (pattern, style) in [
        (&*NUMERIC_ITEM, EnumeratorStyle::Numeric),
        (&*ROMAN_ITEM, EnumeratorStyle::Roman),
        (&*ALPHA_ITEM, EnumeratorStyle::Alphabetic),
    ] {
        if let Some(m) = pattern.find(line) {
            return Classification::new(
                BlockType::OrderedItem,
                &line[m.end()..],
                LineSyntax::Enumerated(style),
            );
        }
    }

    if line.starts_with("```") {
        return Classification::new(BlockType::Plain, raw, LineSyntax::CodeFence);
    }
    if INLINE_CODE_LINE.is_match(trimmed) {
        return Classification::new(BlockType::Plain, raw, LineSyntax::InlineCode);
    }
    if let Some(content) = line.strip_prefix("> ") {
        return Classification::new(BlockType::Plain, content, LineSyntax::Quote);
    }
    if trimmed == ">" || line.starts_with(&QUOTE_CHARS[..]) {
        return Classification::new(BlockType::Plain, raw, LineSyntax::Quote);
    }
    if HORIZONTAL_RULE.is_match(trimmed) {
        return Classification::new(BlockType::Plain, raw, LineSyntax::Rule);
    }

    Classification::new(BlockType::Plain, raw, LineSyntax::None)
}

/// The text after `marker`, or empty when the line is the bare marker.
fn after_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.strip_prefix(marker)
        .or_else(|| (line.trim_end() == marker.trim_end()).then_some(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::LineRecord;
    use crate::serialize::serialize_line;

    fn kind(raw: &str) -> (BlockType, String) {
        let c = classify_line(raw);
        (c.block_type, c.content)
    }

    #[test]
    fn test_headings_prefer_the_longest_marker() {
        assert_eq!(kind("### Minor"), (BlockType::Heading3, "Minor".into()));
        assert_eq!(kind("## Sub"), (BlockType::Heading2, "Sub".into()));
        assert_eq!(kind("# Title"), (BlockType::Heading1, "Title".into()));
        assert_eq!(kind("#hashtag"), (BlockType::Plain, "#hashtag".into()));
    }

    #[test]
    fn test_bullets_and_tasks() {
        assert_eq!(kind("- milk"), (BlockType::UnorderedItem, "milk".into()));
        assert_eq!(kind("* eggs"), (BlockType::UnorderedItem, "eggs".into()));
        assert_eq!(kind("• tea"), (BlockType::UnorderedItem, "tea".into()));

        let task = classify_line("- [X] ship it");
        assert_eq!(task.block_type, BlockType::UnorderedItem);
        assert_eq!(task.content, "ship it");
        assert_eq!(task.syntax, LineSyntax::Task { checked: true });

        let open = classify_line("- [ ] later");
        assert_eq!(open.content, "later");
        assert_eq!(open.syntax, LineSyntax::Task { checked: false });
    }

    #[test]
    fn test_enumerators_of_every_style() {
        assert_eq!(kind("12. twelve"), (BlockType::OrderedItem, "twelve".into()));
        assert_eq!(kind("b. second"), (BlockType::OrderedItem, "second".into()));

        let roman = classify_line("iv. fourth");
        assert_eq!(roman.content, "fourth");
        assert_eq!(roman.syntax, LineSyntax::Enumerated(EnumeratorStyle::Roman));

        assert_eq!(kind("3.14 is pi"), (BlockType::Plain, "3.14 is pi".into()));
    }

    #[test]
    fn test_recognized_constructs_render_plain() {
        assert_eq!(classify_line("```rust").syntax, LineSyntax::CodeFence);
        assert_eq!(classify_line("`cargo test`").syntax, LineSyntax::InlineCode);
        assert_eq!(classify_line("---").syntax, LineSyntax::Rule);
        assert_eq!(classify_line("___").block_type, BlockType::Plain);

        let quote = classify_line("> wise words");
        assert_eq!(quote.block_type, BlockType::Plain);
        assert_eq!(quote.content, "wise words");
        assert_eq!(quote.syntax, LineSyntax::Quote);
    }

    #[test]
    fn test_plain_lines_are_returned_unchanged() {
        let c = classify_line("  just text  ");
        assert_eq!(c.block_type, BlockType::Plain);
        assert_eq!(c.content, "  just text  ");
        assert!(!c.has_marker());
    }

    #[test]
    fn test_indented_markers_are_found_on_the_trimmed_line() {
        assert_eq!(kind("   - nested"), (BlockType::UnorderedItem, "nested".into()));
    }

    #[test]
    fn test_block_only_lines_round_trip() {
        let types = [
            BlockType::Plain,
            BlockType::Heading1,
            BlockType::Heading2,
            BlockType::Heading3,
            BlockType::UnorderedItem,
            BlockType::OrderedItem,
        ];
        for block_type in types {
            for text in ["buy more coffee", "", "trailing  "] {
                let line = LineRecord::new(block_type, text);
                let c = classify_line(&serialize_line(&line, 1));
                assert_eq!(
                    LineRecord::new(c.block_type, c.content),
                    line,
                    "{:?} {:?}",
                    block_type,
                    text
                );
            }
        }
    }

    #[test]
    fn test_bare_markers_classify_with_empty_content() {
        assert_eq!(kind("#"), (BlockType::Heading1, String::new()));
        assert_eq!(kind("## "), (BlockType::Heading2, String::new()));
        assert_eq!(kind("###"), (BlockType::Heading3, String::new()));
        assert_eq!(kind("-"), (BlockType::UnorderedItem, String::new()));
        assert_eq!(kind("* "), (BlockType::UnorderedItem, String::new()));
        assert_eq!(kind("\u{2022}"), (BlockType::UnorderedItem, String::new()));
        assert_eq!(kind("1."), (BlockType::OrderedItem, String::new()));
        assert_eq!(kind("  2. "), (BlockType::OrderedItem, String::new()));
        assert_eq!(kind("#!"), (BlockType::Plain, "#!".into()));
        assert_eq!(kind("1.5"), (BlockType::Plain, "1.5".into()));
    }
}
