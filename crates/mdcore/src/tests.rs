#[cfg(test)]
mod unit_tests {
    use super::super::*;

    #[test]
    fn test_block_round_trip_for_every_type() {
        for block_type in [
            BlockType::Plain,
            BlockType::Heading1,
            BlockType::Heading2,
            BlockType::Heading3,
            BlockType::UnorderedItem,
            BlockType::OrderedItem,
        ] {
            let line = LineRecord::new(block_type, "status update");
            let flat = serialize(std::slice::from_ref(&line));
            let back = classify_line(&flat);
            assert_eq!(back.block_type, line.block_type);
            assert_eq!(back.content, line.text);
        }
    }

    #[test]
    fn test_ordered_numbering_resets() {
        let lines = vec![
            LineRecord::new(BlockType::OrderedItem, "a"),
            LineRecord::new(BlockType::OrderedItem, "b"),
            LineRecord::plain("c"),
            LineRecord::new(BlockType::OrderedItem, "d"),
        ];
        let flat = serialize(&lines);
        let prefixes: Vec<&str> = flat.lines().map(|l| l.split(' ').next().unwrap_or("")).collect();
        assert_eq!(prefixes, vec!["1.", "2.", "c", "1."]);
    }

    #[test]
    fn test_inline_wrap_is_stable_across_recovery() {
        let line = LineRecord::plain("abcd").with_span(0, 4, InlineKind::Bold);
        let flat = serialize(std::slice::from_ref(&line));
        assert_eq!(flat, "**abcd**");

        let (text, spans) = inline::recover_spans(&classify_line(&flat).content);
        let rewrapped = serialize::wrap_inline(&text, &spans);
        assert_eq!(rewrapped, flat);
    }

    #[test]
    fn test_unterminated_marker_renders_plain() {
        let tokens: Vec<InlineToken> = render_inline("a *b").collect();
        assert_eq!(tokens, vec![InlineToken::Plain("a *b")]);
    }

    #[test]
    fn test_triple_star_is_one_span() {
        let tokens: Vec<InlineToken> = render_inline("***x***").collect();
        assert_eq!(
            tokens,
            vec![InlineToken::Styled {
                style: SpanStyle::BoldItalic,
                content: "x"
            }]
        );
    }

    #[test]
    fn test_enumerator_styles_normalize_to_numbers() {
        let records = parse_records("a. first\nii. second\n3. third");
        assert!(records.iter().all(|r| r.block_type == BlockType::OrderedItem));
        assert_eq!(serialize(&records), "1. first\n2. second\n3. third");
    }

    #[test]
    fn test_stored_message_renders_through_read_path() {
        let doc = MessageDocument::parse("# Hi\n- **one**\n- two");
        match &doc.blocks[1] {
            Block::UnorderedList(items) => {
                let runs = styled_runs(&items[0].text);
                assert_eq!(runs.len(), 1);
                assert!(runs[0].style.bold);
                assert_eq!(runs[0].text, "one");
            }
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_every_bold_italic_overlap_reads_back() {
        let ranges: Vec<(usize, usize)> = (0..5)
            .flat_map(|start| (start + 1..=5).map(move |end| (start, end)))
            .collect();
        for &(b0, b1) in &ranges {
            for &(i0, i1) in &ranges {
                let line = LineRecord::new(BlockType::UnorderedItem, "abcde")
                    .with_span(b0, b1, InlineKind::Bold)
                    .with_span(i0, i1, InlineKind::Italic);
                let flat = serialize(std::slice::from_ref(&line));
                assert_eq!(parse_records(&flat), vec![line], "{}", flat);
            }
        }
    }
}
