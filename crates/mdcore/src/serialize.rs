use crate::format::{char_len, BlockType, InlineSpan, LineRecord};

/// Flattens the line model into the stored message format.
///
/// Each line gets its inline markers spliced in, then its block prefix.
/// Ordered items are numbered per contiguous run, so the enumerator style a
/// line was typed or pasted with is always normalized to `1.`, `2.`, ...
pub fn serialize(lines: &[LineRecord]) -> String {
    let mut out = String::new();
    let mut ordinal = 0usize;

    for (i, line) in lines.iter().enumerate() {
        if line.block_type == BlockType::OrderedItem {
            ordinal += 1;
        } else {
            ordinal = 0;
        }

        if i > 0 {
            out.push('\n');
        }
        out.push_str(&serialize_line(line, ordinal));
    }

    out
}

/// Serializes a single line. `ordinal` is only read for ordered items.
pub fn serialize_line(line: &LineRecord, ordinal: usize) -> String {
    let body = wrap_inline(&line.text, &line.spans);
    match line.block_type {
        BlockType::OrderedItem => format!("{}. {}", ordinal.max(1), body),
        other => format!("{}{}", other.prefix(), body),
    }
}

/// Wraps each span of `text` in its marker.
///
/// Markers are placed at boundaries computed on the original offsets, so
/// splicing never invalidates a later span. Spans that overlap are emitted
/// well-nested: the longer one opens first, and a span that crosses the end
/// of another is closed and re-opened around that boundary.
pub fn wrap_inline(text: &str, spans: &[InlineSpan]) -> String {
    let len = char_len(text);
    let mut spans: Vec<InlineSpan> = spans
        .iter()
        .map(|s| InlineSpan::new(s.start.min(len), s.end.min(len), s.kind))
        .filter(|s| !s.is_empty())
        .collect();
    if spans.is_empty() {
        return text.to_string();
    }
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.end.cmp(&a.end))
            .then(a.kind.cmp(&b.kind))
    });

    let mut out = String::with_capacity(text.len() + spans.len() * 4);
    let mut open: Vec<InlineSpan> = Vec::new();
    let mut next = 0;
    let mut chars = text.chars();

    for pos in 0..=len {
        if open.iter().any(|s| s.end == pos) {
            // Close everything down to the deepest span that ends here,
            // then re-open the survivors in their original order.
            let depth = open.iter().position(|s| s.end == pos).unwrap_or(0);
            let unwound: Vec<InlineSpan> = open.drain(depth..).collect();
            for span in unwound.iter().rev() {
                out.push_str(span.kind.marker());
            }
            for span in unwound.into_iter().filter(|s| s.end != pos) {
                out.push_str(span.kind.marker());
                open.push(span);
            }
        }

        while next < spans.len() && spans[next].start == pos {
            out.push_str(spans[next].kind.marker());
            open.push(spans[next]);
            next += 1;
        }

        if let Some(c) = chars.next() {
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::InlineKind;
    use crate::message::parse_records;
    use insta::assert_snapshot;

    #[test]
    fn test_ordered_list_counter_resets_after_interruption() {
        let lines = vec![
            LineRecord::new(BlockType::OrderedItem, "one"),
            LineRecord::new(BlockType::OrderedItem, "two"),
            LineRecord::plain("break"),
            LineRecord::new(BlockType::OrderedItem, "again"),
        ];

        assert_eq!(serialize(&lines), "1. one\n2. two\nbreak\n1. again");
    }

    #[test]
    fn test_block_prefixes() {
        let lines = vec![
            LineRecord::new(BlockType::Heading1, "Title"),
            LineRecord::new(BlockType::Heading2, "Sub"),
            LineRecord::new(BlockType::Heading3, "Minor"),
            LineRecord::new(BlockType::UnorderedItem, "milk"),
            LineRecord::plain("done"),
        ];

        assert_snapshot!(
            serialize(&lines).replace('\n', "|"),
            @"# Title|## Sub|### Minor|- milk|done"
        );
    }

    #[test]
    fn test_wraps_single_span() {
        let line = LineRecord::plain("abcd").with_span(0, 4, InlineKind::Bold);
        assert_eq!(serialize(&[line]), "**abcd**");
    }

    #[test]
    fn test_wraps_multiple_spans_without_offset_drift() {
        let line = LineRecord::plain("say hi to all")
            .with_span(4, 6, InlineKind::Bold)
            .with_span(10, 13, InlineKind::Italic);
        assert_snapshot!(serialize(&[line]), @"say **hi** to *all*");
    }

    #[test]
    fn test_identical_ranges_emit_bold_italic() {
        let line = LineRecord::plain("x")
            .with_span(0, 1, InlineKind::Italic)
            .with_span(0, 1, InlineKind::Bold);
        assert_eq!(wrap_inline(&line.text, &line.spans), "***x***");
    }

    #[test]
    fn test_nested_spans_stay_well_formed() {
        let line = LineRecord::plain("abcdef")
            .with_span(0, 6, InlineKind::Italic)
            .with_span(2, 4, InlineKind::Bold);
        assert_eq!(wrap_inline(&line.text, &line.spans), "*ab**cd**ef*");
    }

    #[test]
    fn test_crossing_spans_are_split_and_read_back() {
        let line = LineRecord::plain("abcde")
            .with_span(0, 3, InlineKind::Bold)
            .with_span(2, 5, InlineKind::Italic);
        let flat = wrap_inline(&line.text, &line.spans);
        assert_eq!(flat, "**ab*c****de*");

        let records = parse_records(&flat);
        assert_eq!(records, vec![line]);
    }

    #[test]
    fn test_spans_beyond_text_are_clamped() {
        let spans = [InlineSpan::new(2, 99, InlineKind::Bold)];
        assert_eq!(wrap_inline("abcd", &spans), "ab**cd**");
    }

    #[test]
    fn test_multibyte_offsets_are_characters() {
        let line = LineRecord::plain("héllo wörld").with_span(6, 11, InlineKind::Italic);
        assert_eq!(serialize(&[line]), "héllo *wörld*");
    }

    #[test]
    fn test_serialize_is_idempotent() {
        let lines = vec![
            LineRecord::new(BlockType::OrderedItem, "a").with_span(0, 1, InlineKind::Bold),
            LineRecord::new(BlockType::UnorderedItem, "b"),
        ];
        assert_eq!(serialize(&lines), serialize(&lines));
    }
}
