//! Overlay drawn on top of the raw input: a gutter of block badges and a
//! styled preview of each line. Both layers are built from the same line
//! slice in one call so they can never disagree with each other.

use mdcore::{BlockType, InlineKind, LineRecord};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

/// Styles the overlay paints with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayStyle {
    pub text: Style,
    pub heading: Style,
    pub badge: Style,
    pub active_badge: Style,
}

/// Badge for every line: `N`, `H1`..`H3`, `•`, or the ordinal of an
/// ordered item. The ordinal follows the serializer's counter rule.
pub fn gutter_badges(lines: &[LineRecord]) -> Vec<String> {
    let mut ordinal = 0;
    lines
        .iter()
        .map(|line| {
            if line.block_type == BlockType::OrderedItem {
                ordinal += 1;
            } else {
                ordinal = 0;
            }
            match line.block_type {
                BlockType::Plain => "N".to_string(),
                BlockType::Heading1 => "H1".to_string(),
                BlockType::Heading2 => "H2".to_string(),
                BlockType::Heading3 => "H3".to_string(),
                BlockType::UnorderedItem => "\u{2022}".to_string(),
                BlockType::OrderedItem => format!("{}.", ordinal),
            }
        })
        .collect()
}

/// Preview of one line. The text is cut at span boundaries only and each
/// piece takes the modifiers of the spans covering it.
pub fn preview_line(line: &LineRecord, style: &OverlayStyle) -> Line<'static> {
    let base = if line.block_type.heading_level().is_some() {
        style.heading
    } else {
        style.text
    };

    let chars: Vec<char> = line.text.chars().collect();
    let len = chars.len();
    let mut cuts: Vec<usize> = line
        .spans
        .iter()
        .flat_map(|span| [span.start.min(len), span.end.min(len)])
        .chain([0, len])
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut pieces = Vec::with_capacity(cuts.len());
    for window in cuts.windows(2) {
        let (start, end) = (window[0], window[1]);
        let mut piece_style = base;
        for span in line.spans.iter().filter(|s| s.start <= start && start < s.end) {
            piece_style = piece_style.add_modifier(match span.kind {
                InlineKind::Bold => Modifier::BOLD,
                InlineKind::Italic => Modifier::ITALIC,
            });
        }
        pieces.push(Span::styled(
            chars[start..end].iter().collect::<String>(),
            piece_style,
        ));
    }

    Line::from(pieces)
}

pub fn preview_lines(lines: &[LineRecord], style: &OverlayStyle) -> Vec<Line<'static>> {
    lines.iter().map(|line| preview_line(line, style)).collect()
}

/// Vertical window of the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub offset: usize,
    pub height: usize,
    pub active_line: usize,
}

/// Mirrors the input's scroll position onto the overlay, both the first
/// visible line and the first visible display column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollSync {
    offset: usize,
    column: usize,
}

impl ScrollSync {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Takes the input's offset, then corrects it so `caret_line` stays
    /// inside a window of `height` lines. Repeating the call with the same
    /// arguments changes nothing.
    pub fn sync(&mut self, input_offset: usize, caret_line: usize, height: usize) -> usize {
        let offset = follow(input_offset, caret_line, height);
        if offset != self.offset {
            log::trace!("overlay scroll {} -> {}", self.offset, offset);
        }
        self.offset = offset;
        offset
    }

    /// Horizontal counterpart of [`sync`](Self::sync): keeps display column
    /// `caret_col` inside a window `width` columns wide.
    pub fn sync_column(&mut self, input_column: usize, caret_col: usize, width: usize) -> usize {
        let column = follow(input_column, caret_col, width);
        if column != self.column {
            log::trace!("overlay column {} -> {}", self.column, column);
        }
        self.column = column;
        column
    }
}

/// Moves `start` the least needed for `target` to fall in `[start, start + span)`.
fn follow(start: usize, target: usize, span: usize) -> usize {
    let span = span.max(1);
    if target < start {
        target
    } else if target >= start + span {
        target + 1 - span
    } else {
        start
    }
}

/// Both overlay layers for the visible window.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub gutter: Vec<Line<'static>>,
    pub preview: Vec<Line<'static>>,
    pub offset: usize,
}

impl Overlay {
    pub fn build(lines: &[LineRecord], style: &OverlayStyle, viewport: Viewport) -> Self {
        let badges = gutter_badges(lines);
        let end = (viewport.offset + viewport.height).min(lines.len());
        let start = viewport.offset.min(end);
        let width = badges.iter().map(|b| b.chars().count()).max().unwrap_or(1);

        let gutter = badges[start..end]
            .iter()
            .enumerate()
            .map(|(i, badge)| {
                let badge_style = if start + i == viewport.active_line {
                    style.active_badge
                } else {
                    style.badge
                };
                Line::from(Span::styled(format!("{:>width$} ", badge, width = width), badge_style))
            })
            .collect();

        Self {
            gutter,
            preview: preview_lines(&lines[start..end], style),
            offset: start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> Vec<(String, Modifier)> {
        line.spans
            .iter()
            .map(|span| (span.content.to_string(), span.style.add_modifier))
            .collect()
    }

    #[test]
    fn test_badges_follow_the_ordinal_counter() {
        let lines = vec![
            LineRecord::new(BlockType::Heading2, "Plan"),
            LineRecord::new(BlockType::OrderedItem, "a"),
            LineRecord::new(BlockType::OrderedItem, "b"),
            LineRecord::plain("pause"),
            LineRecord::new(BlockType::OrderedItem, "c"),
            LineRecord::new(BlockType::UnorderedItem, "d"),
        ];
        assert_eq!(gutter_badges(&lines), vec!["H2", "1.", "2.", "N", "1.", "\u{2022}"]);
    }

    #[test]
    fn test_preview_splits_only_at_span_boundaries() {
        let line = LineRecord::plain("abcdef")
            .with_span(0, 3, InlineKind::Bold)
            .with_span(2, 5, InlineKind::Italic);
        let preview = preview_line(&line, &OverlayStyle::default());

        assert_eq!(
            text_of(&preview),
            vec![
                ("ab".to_string(), Modifier::BOLD),
                ("c".to_string(), Modifier::BOLD | Modifier::ITALIC),
                ("de".to_string(), Modifier::ITALIC),
                ("f".to_string(), Modifier::empty()),
            ]
        );
    }

    #[test]
    fn test_preview_of_plain_and_empty_lines() {
        let style = OverlayStyle::default();
        assert_eq!(text_of(&preview_line(&LineRecord::plain("hi"), &style)).len(), 1);
        assert!(preview_line(&LineRecord::default(), &style).spans.is_empty());
    }

    #[test]
    fn test_preview_handles_multibyte_spans() {
        let line = LineRecord::plain("日本語です").with_span(2, 3, InlineKind::Bold);
        let preview = preview_line(&line, &OverlayStyle::default());
        assert_eq!(preview.spans[1].content, "語");
    }

    #[test]
    fn test_scroll_sync_keeps_caret_visible_and_is_idempotent() {
        let mut sync = ScrollSync::default();
        assert_eq!(sync.sync(0, 7, 3), 5);
        assert_eq!(sync.sync(0, 7, 3), 5);
        assert_eq!(sync.sync(4, 4, 3), 4);
        assert_eq!(sync.sync(6, 2, 3), 2);
        assert_eq!(sync.offset(), 2);
    }

    #[test]
    fn test_scroll_sync_follows_the_caret_column() {
        let mut sync = ScrollSync::default();
        assert_eq!(sync.sync_column(0, 10, 10), 1);
        assert_eq!(sync.sync_column(0, 10, 10), 1);
        assert_eq!(sync.sync_column(5, 9, 10), 5);
        assert_eq!(sync.sync_column(5, 2, 10), 2);
        assert_eq!(sync.column(), 2);
        // vertical state is independent
        assert_eq!(sync.offset(), 0);
    }

    #[test]
    fn test_overlay_layers_cover_the_same_window() {
        let lines: Vec<LineRecord> = (0..6)
            .map(|i| LineRecord::new(BlockType::OrderedItem, format!("item {}", i)))
            .collect();
        let overlay = Overlay::build(
            &lines,
            &OverlayStyle::default(),
            Viewport { offset: 2, height: 3, active_line: 3 },
        );

        assert_eq!(overlay.gutter.len(), 3);
        assert_eq!(overlay.preview.len(), 3);
        assert_eq!(overlay.gutter[0].spans[0].content, "3. ");
        assert_eq!(overlay.preview[0].spans[0].content, "item 2");
    }

    #[test]
    fn test_overlay_clamps_a_stale_viewport() {
        let lines = vec![LineRecord::plain("only")];
        let overlay = Overlay::build(
            &lines,
            &OverlayStyle::default(),
            Viewport { offset: 9, height: 4, active_line: 0 },
        );
        assert!(overlay.preview.is_empty());
        assert_eq!(overlay.offset, 1);
    }
}
