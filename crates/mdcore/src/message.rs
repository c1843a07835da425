//! Read path: turns a stored message back into renderable blocks.

use crate::classify::{classify_line, LineSyntax};
use crate::format::{BlockType, LineRecord};
use crate::inline::recover_spans;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Display number for ordered items, renumbered from 1 per list.
    pub number: Option<usize>,
    /// Task checkbox state, when the item was written as `- [ ]`/`- [x]`.
    pub checked: Option<bool>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    UnorderedList(Vec<ListItem>),
    OrderedList(Vec<ListItem>),
    Quote(String),
    CodeBlock { language: Option<String>, lines: Vec<String> },
    Rule,
    Blank,
}

/// A stored message split into blocks, with adjacent list lines grouped.
/// Inline markup is left in the block text for [`crate::inline`] to scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageDocument {
    pub blocks: Vec<Block>,
}

impl MessageDocument {
    pub fn parse(content: &str) -> Self {
        Self::parse_with_format(content, None)
    }

    /// Parses with a legacy whole-message format tag. The tag only applies
    /// to single-line content that carries no marker of its own.
    pub fn parse_with_format(content: &str, legacy: Option<BlockType>) -> Self {
        let mut doc = MessageDocument::default();
        let lines: Vec<&str> = content.split('\n').collect();
        let single_line = lines.len() == 1;
        let mut fence: Option<(Option<String>, Vec<String>)> = None;

        for raw in lines {
            let raw = raw.trim_end_matches('\r');
            let classified = classify_line(raw);

            if let Some((language, mut body)) = fence.take() {
                if classified.syntax == LineSyntax::CodeFence {
                    doc.blocks.push(Block::CodeBlock { language, lines: body });
                } else {
                    body.push(raw.to_string());
                    fence = Some((language, body));
                }
                continue;
            }

            if raw.trim().is_empty() {
                doc.blocks.push(Block::Blank);
                continue;
            }

            let (block_type, text) = match legacy {
                Some(format)
                    if single_line
                        && classified.syntax == LineSyntax::None
                        && format != BlockType::Plain =>
                {
                    (format, raw.trim().to_string())
                }
                _ => (classified.block_type, classified.content),
            };

            match (block_type, classified.syntax) {
                (BlockType::Plain, LineSyntax::CodeFence) => {
                    let language = raw.trim().trim_start_matches('`').trim();
                    let language = (!language.is_empty()).then(|| language.to_string());
                    fence = Some((language, Vec::new()));
                }
                (BlockType::Plain, LineSyntax::Quote) => doc.blocks.push(Block::Quote(text)),
                (BlockType::Plain, LineSyntax::Rule) => doc.blocks.push(Block::Rule),
                (BlockType::Plain, _) => doc.blocks.push(Block::Paragraph(text)),
                (BlockType::UnorderedItem, syntax) => {
                    let checked = match syntax {
                        LineSyntax::Task { checked } => Some(checked),
                        _ => None,
                    };
                    doc.push_item(false, ListItem { number: None, checked, text });
                }
                (BlockType::OrderedItem, _) => {
                    doc.push_item(true, ListItem { number: None, checked: None, text });
                }
                (heading, _) => doc.blocks.push(Block::Heading {
                    level: heading.heading_level().unwrap_or(1),
                    text,
                }),
            }
        }

        // An unclosed fence keeps whatever it collected.
        if let Some((language, lines)) = fence {
            doc.blocks.push(Block::CodeBlock { language, lines });
        }

        doc
    }

    fn push_item(&mut self, ordered: bool, mut item: ListItem) {
        match (self.blocks.last_mut(), ordered) {
            (Some(Block::OrderedList(items)), true) => {
                item.number = Some(items.len() + 1);
                items.push(item);
            }
            (Some(Block::UnorderedList(items)), false) => items.push(item),
            (_, true) => {
                item.number = Some(1);
                self.blocks.push(Block::OrderedList(vec![item]));
            }
            (_, false) => self.blocks.push(Block::UnorderedList(vec![item])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| matches!(b, Block::Blank))
    }
}

/// Rebuilds line records from stored content for edit-in-place: every line
/// is classified, then its inline markers are recovered into spans.
pub fn parse_records(content: &str) -> Vec<LineRecord> {
    let records: Vec<LineRecord> = content
        .split('\n')
        .map(|raw| {
            let classified = classify_line(raw.trim_end_matches('\r'));
            let (text, spans) = recover_spans(&classified.content);
            LineRecord {
                block_type: classified.block_type,
                text,
                spans,
            }
        })
        .collect();

    log::trace!("recovered {} line records from stored content", records.len());
    records
}
