//! Display width of composer text.
//!
//! The composer counts characters; the terminal counts columns. This module
//! converts between the two so the caret, the gutter and the preview line up
//! for East Asian text and emoji.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextWidthCalculator;

impl TextWidthCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Columns taken by one grapheme cluster. Control characters take none.
    pub fn grapheme_width(&self, grapheme: &str) -> usize {
        if grapheme.is_empty() || grapheme.chars().all(|c| c.is_control()) {
            return 0;
        }

        if is_emoji(grapheme) {
            // joined or modified emoji render as one wide glyph
            if grapheme.chars().count() > 1 {
                return 2;
            }
            return grapheme
                .chars()
                .next()
                .and_then(|c| c.width())
                .unwrap_or(1);
        }

        grapheme.chars().map(|c| c.width().unwrap_or(0)).sum()
    }

    /// Display column of the `char_index`-th character of `text`.
    pub fn char_index_to_col(&self, text: &str, char_index: usize) -> usize {
        let mut width = 0;
        let mut seen = 0;

        for grapheme in text.graphemes(true) {
            if seen >= char_index {
                break;
            }
            width += self.grapheme_width(grapheme);
            seen += grapheme.chars().count();
        }

        width
    }

    /// Character index of the grapheme that covers display column `col`,
    /// clamped to the end of `text`.
    pub fn col_to_char_index(&self, text: &str, col: usize) -> usize {
        let mut width = 0;
        let mut index = 0;

        for grapheme in text.graphemes(true) {
            let grapheme_width = self.grapheme_width(grapheme);
            if width + grapheme_width > col {
                break;
            }
            width += grapheme_width;
            index += grapheme.chars().count();
        }

        index
    }
}

fn is_emoji(text: &str) -> bool {
    text.chars().any(|c| {
        let code = c as u32;
        (0x1F600..=0x1F64F).contains(&code) // Emoticons
            || (0x1F300..=0x1F5FF).contains(&code) // Misc Symbols and Pictographs
            || (0x1F680..=0x1F6FF).contains(&code) // Transport and Map
            || (0x1F900..=0x1F9FF).contains(&code) // Supplemental Symbols
            || (0x1F1E0..=0x1F1FF).contains(&code) // Regional Indicator Symbols
            || matches!(c, '\u{FE00}'..='\u{FE0F}' | '\u{200D}')
    })
}
