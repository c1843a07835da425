//! Line-model reconciler.
//!
//! The composer keeps the raw text of the input and the per-line format
//! records as one value: the raw text is always the record texts joined with
//! `\n`, and every event hands back the canonical text, caret and serialized
//! content computed in the same call.

use mdcore::format::{char_len, char_slice};
use mdcore::{
    classify_line, parse_records, serialize, BlockType, InlineKind, InlineSpan, LineRecord,
};

/// Inline formats armed from the toolbar. Newly inserted characters on the
/// edited line receive these spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineToggles {
    bold: bool,
    italic: bool,
}

impl InlineToggles {
    pub fn is_armed(&self, kind: InlineKind) -> bool {
        match kind {
            InlineKind::Bold => self.bold,
            InlineKind::Italic => self.italic,
        }
    }

    /// Flips `kind` and returns whether it is now armed.
    pub fn toggle(&mut self, kind: InlineKind) -> bool {
        let slot = match kind {
            InlineKind::Bold => &mut self.bold,
            InlineKind::Italic => &mut self.italic,
        };
        *slot = !*slot;
        *slot
    }

    pub fn any(&self) -> bool {
        self.bold || self.italic
    }

    pub fn armed(&self) -> impl Iterator<Item = InlineKind> + '_ {
        InlineKind::ALL.into_iter().filter(|kind| self.is_armed(*kind))
    }
}

/// Composing-time state. `lines` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSession {
    lines: Vec<LineRecord>,
    active_line: usize,
    active_block: BlockType,
    armed: InlineToggles,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self {
            lines: vec![LineRecord::default()],
            active_line: 0,
            active_block: BlockType::Plain,
            armed: InlineToggles::default(),
        }
    }
}

impl EditorSession {
    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    pub fn active_line(&self) -> usize {
        self.active_line
    }

    pub fn active_block(&self) -> BlockType {
        self.active_block
    }

    pub fn armed(&self) -> InlineToggles {
        self.armed
    }

    /// Raw text as the input shows it: marker-free lines joined by `\n`.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            text.push_str(&line.text);
        }
        text
    }

    pub fn char_count(&self) -> usize {
        self.lines.iter().map(LineRecord::char_len).sum::<usize>() + self.lines.len() - 1
    }

    /// Character offset where line `index` starts.
    pub fn line_start(&self, index: usize) -> usize {
        self.lines
            .iter()
            .take(index)
            .map(|line| line.char_len() + 1)
            .sum()
    }

    /// Resolves a character offset into `(line, column)`. The first line
    /// whose end reaches the offset wins; anything past the buffer lands at
    /// the end of the last line.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        locate_in(self.lines.iter().map(LineRecord::char_len), offset)
    }

    fn sync_active(&mut self, cursor: usize) {
        self.active_line = self.locate(cursor).0;
        self.active_block = self.lines[self.active_line].block_type;
    }
}

fn locate_in(lengths: impl Iterator<Item = usize>, offset: usize) -> (usize, usize) {
    let mut start = 0;
    let mut last = (0, 0);
    for (index, len) in lengths.enumerate() {
        if start + len >= offset {
            return (index, offset.saturating_sub(start));
        }
        last = (index, len);
        start += len + 1;
    }
    last
}

/// Result of one composer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerUpdate {
    /// Canonical raw text the input should now hold.
    pub text: String,
    /// Caret as a character offset into `text`.
    pub cursor: usize,
    /// Serialized message content.
    pub content: String,
    /// The input's scroll position and caret visibility need re-syncing.
    pub scroll_sync: bool,
}

/// Receives serialized content from a composer.
pub trait ComposerSink {
    /// Called after every reconciliation with the freshly serialized content.
    fn on_content_change(&mut self, _content: &str) {}

    /// Called on hard Enter with the last serialized content, before reset.
    fn on_submit(&mut self, _content: &str) {}
}

pub struct Composer {
    session: EditorSession,
    cursor: usize,
    content: String,
    sink: Option<Box<dyn ComposerSink>>,
}

impl Composer {
    pub fn new() -> Self {
        Self {
            session: EditorSession::default(),
            cursor: 0,
            content: String::new(),
            sink: None,
        }
    }

    pub fn with_sink(sink: Box<dyn ComposerSink>) -> Self {
        let mut composer = Self::new();
        composer.sink = Some(sink);
        composer
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn ComposerSink>>) {
        self.sink = sink;
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn lines(&self) -> &[LineRecord] {
        self.session.lines()
    }

    pub fn text(&self) -> String {
        self.session.text()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Most recently emitted serialized content.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_blank(&self) -> bool {
        self.session
            .lines
            .iter()
            .all(|line| line.text.trim().is_empty())
    }

    /// Reconciles the line model with a new raw value from the input.
    ///
    /// The edit is located with a character diff anchored on the caret.
    /// Lines outside the edit keep their records untouched; the line where
    /// the edit starts keeps its block type; lines created by the edit are
    /// seeded (classified when they carry a marker, otherwise given the
    /// toolbar's block type if the caret is on them).
    pub fn apply_text_change(&mut self, new_raw: &str, cursor: usize) -> ComposerUpdate {
        let old: Vec<char> = self.session.text().chars().collect();
        let new: Vec<char> = new_raw.chars().collect();
        let cursor = cursor.min(new.len());

        let max_suffix = old.len().min(new.len()).min(new.len() - cursor);
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        let max_prefix = (old.len() - suffix).min(new.len() - suffix);
        let prefix = old
            .iter()
            .zip(new.iter())
            .take(max_prefix)
            .take_while(|(a, b)| a == b)
            .count();
        let old_end = old.len() - suffix;
        let new_end = new.len() - suffix;
        let inserted = new_end - prefix;

        log::trace!(
            "text change: replace {}..{} with {} chars, caret {}",
            prefix,
            old_end,
            inserted,
            cursor
        );

        let new_texts: Vec<&str> = new_raw.split('\n').collect();
        let lengths = || new_texts.iter().map(|t| char_len(t));
        let (first, first_col) = self.session.locate(prefix);
        let (last_old, last_old_col) = self.session.locate(old_end);
        let (last_new, last_new_col) = locate_in(lengths(), new_end);
        let (mut cursor_line, mut cursor_col) = locate_in(lengths(), cursor);

        let old_lines = std::mem::take(&mut self.session.lines);
        let mut lines: Vec<LineRecord> = old_lines[..first].to_vec();

        for (j, text) in new_texts[first..=last_new].iter().enumerate() {
            let index = first + j;
            let is_first = j == 0;
            let is_last = index == last_new;
            let len = char_len(text);

            let mut record = if is_first {
                let mut record = LineRecord::new(old_lines[first].block_type, *text);
                carry_spans(&old_lines[first], 0, first_col, 0, &mut record.spans);
                record
            } else {
                LineRecord::plain(*text)
            };
            if is_last {
                let tail = &old_lines[last_old];
                let shift = last_new_col as isize - last_old_col as isize;
                carry_spans(tail, last_old_col, tail.char_len(), shift, &mut record.spans);
            }

            let insert_from = if is_first { first_col } else { 0 };
            let insert_to = if is_last { last_new_col } else { len };
            if inserted > 0 && insert_from < insert_to {
                for kind in self.session.armed.armed() {
                    record.spans.push(InlineSpan::new(insert_from, insert_to, kind));
                }
            }
            record.normalize_spans();

            let caret_here = index == cursor_line;
            let stripped = if is_first {
                // An empty line filled in one go (a paste) is classified like
                // a new one, but keeps its type when nothing is recognized.
                if inserted > 0 && old_lines[first].text.is_empty() {
                    strip_marker(&mut record)
                } else {
                    None
                }
            } else {
                let stripped = strip_marker(&mut record);
                if stripped.is_none() {
                    record.block_type = if caret_here {
                        self.session.active_block
                    } else {
                        BlockType::Plain
                    };
                }
                stripped
            };
            if let (true, Some(stripped)) = (caret_here, stripped) {
                cursor_col = stripped.map_col(cursor_col, record.char_len());
            }
            lines.push(record);
        }

        lines.extend(old_lines.into_iter().skip(last_old + 1));
        self.session.lines = lines;

        cursor_line = cursor_line.min(self.session.lines.len() - 1);
        let cursor = self.session.line_start(cursor_line)
            + cursor_col.min(self.session.lines[cursor_line].char_len());
        self.cursor = cursor;
        self.session.sync_active(cursor);
        self.commit(false)
    }

    /// Shift+Enter: splits the caret's line. List types continue onto the new
    /// line, everything else (headings included) starts a Plain line.
    pub fn soft_newline(&mut self, cursor: usize) -> ComposerUpdate {
        let cursor = cursor.min(self.session.char_count());
        let (line, col) = self.session.locate(cursor);

        let current = &self.session.lines[line];
        let len = current.char_len();
        let block_type = if current.block_type.is_list() {
            current.block_type
        } else {
            BlockType::Plain
        };

        let mut before = LineRecord::new(current.block_type, char_slice(&current.text, 0, col));
        carry_spans(current, 0, col, 0, &mut before.spans);
        let mut after = LineRecord::new(block_type, char_slice(&current.text, col, len));
        carry_spans(current, col, len, -(col as isize), &mut after.spans);
        before.normalize_spans();
        after.normalize_spans();

        log::debug!("soft newline at line {} col {}, new line is {:?}", line, col, block_type);

        self.session.lines[line] = before;
        self.session.lines.insert(line + 1, after);
        self.session.active_line = line + 1;
        self.session.active_block = block_type;
        self.cursor = self.session.line_start(line + 1);
        self.commit(true)
    }

    /// Plain Enter: submits the composed message and resets the session.
    /// Returns the submitted content, or `None` for a blank composition.
    pub fn hard_newline(&mut self) -> Option<String> {
        if self.is_blank() {
            log::debug!("ignoring submit of a blank composition");
            return None;
        }

        let content = serialize(self.session.lines());
        log::info!("submitting message ({} lines)", self.session.lines.len());
        if let Some(sink) = self.sink.as_mut() {
            sink.on_submit(&content);
        }
        self.reset();
        Some(content)
    }

    /// Backspace at column 0 of an empty styled line resets the line to
    /// Plain and consumes the key. Any other backspace is left to the input.
    pub fn backspace(&mut self, cursor: usize) -> Option<ComposerUpdate> {
        let cursor = cursor.min(self.session.char_count());
        let (line, col) = self.session.locate(cursor);
        let record = &mut self.session.lines[line];
        if col != 0 || !record.text.is_empty() || record.block_type == BlockType::Plain {
            return None;
        }

        log::debug!("backspace resets line {} from {:?} to Plain", line, record.block_type);
        record.block_type = BlockType::Plain;
        self.cursor = cursor;
        self.session.sync_active(cursor);
        Some(self.commit(false))
    }

    /// Toolbar block button: retypes the active line.
    pub fn set_block_format(&mut self, block_type: BlockType) -> ComposerUpdate {
        let active = self.session.active_line;
        log::debug!("line {} set to {:?}", active, block_type);
        self.session.lines[active].block_type = block_type;
        self.session.active_block = block_type;
        self.commit(false)
    }

    /// Toolbar inline button: arms or disarms `kind` for future input.
    pub fn toggle_inline(&mut self, kind: InlineKind) -> bool {
        let armed = self.session.armed.toggle(kind);
        log::debug!("{:?} {}", kind, if armed { "armed" } else { "disarmed" });
        armed
    }

    /// Inserts pasted text verbatim at the caret; pasted lines are classified
    /// through the regular new-line seeding.
    pub fn paste(&mut self, pasted: &str, cursor: usize) -> ComposerUpdate {
        let pasted = pasted.replace("\r\n", "\n").replace('\r', "\n");
        let text = self.session.text();
        let cursor = cursor.min(char_len(&text));

        let mut raw = text.clone();
        raw.insert_str(mdcore::format::byte_index(&text, cursor), &pasted);

        let mut update = self.apply_text_change(&raw, cursor + char_len(&pasted));
        update.scroll_sync = true;
        update
    }

    /// Caret moved without editing.
    pub fn move_cursor(&mut self, cursor: usize) -> usize {
        let cursor = cursor.min(self.session.char_count());
        self.cursor = cursor;
        self.session.sync_active(cursor);
        self.session.active_line
    }

    pub fn reset(&mut self) -> ComposerUpdate {
        self.session = EditorSession::default();
        self.cursor = 0;
        self.commit(true)
    }

    /// Pre-populates the session from stored content for edit-in-place.
    pub fn load(&mut self, content: &str) -> ComposerUpdate {
        let mut lines = parse_records(content);
        if lines.is_empty() {
            lines.push(LineRecord::default());
        }
        self.session = EditorSession {
            lines,
            ..EditorSession::default()
        };
        let cursor = self.session.char_count();
        self.cursor = cursor;
        self.session.sync_active(cursor);
        self.commit(true)
    }

    fn commit(&mut self, scroll_sync: bool) -> ComposerUpdate {
        self.content = serialize(self.session.lines());
        if let Some(sink) = self.sink.as_mut() {
            sink.on_content_change(&self.content);
        }
        ComposerUpdate {
            text: self.session.text(),
            cursor: self.cursor,
            content: self.content.clone(),
            scroll_sync,
        }
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

/// Characters removed from the front of a line whose marker was stripped.
#[derive(Debug, Clone, Copy)]
struct Stripped {
    lead: usize,
}

impl Stripped {
    fn map_col(&self, col: usize, len: usize) -> usize {
        col.saturating_sub(self.lead).min(len)
    }
}

/// Classifies a line's raw text. When a block marker is found the record
/// takes that block type, the marker is cut from the text and the spans are
/// moved back accordingly.
fn strip_marker(record: &mut LineRecord) -> Option<Stripped> {
    if record.text.trim().is_empty() {
        return None;
    }
    let classified = classify_line(&record.text);
    // A bare marker stays literal until something follows it.
    if !classified.has_marker() || classified.content.trim().is_empty() {
        return None;
    }

    let raw = &record.text;
    let start = raw.len() - classified.content.len();
    let lead = char_len(&raw[..start]);
    log::debug!(
        "line classified as {:?}, stripping {} chars",
        classified.block_type,
        lead
    );

    record.block_type = classified.block_type;
    record.text = classified.content;
    let len = record.char_len();
    record.spans = record
        .spans
        .iter()
        .filter_map(|span| {
            let start = span.start.saturating_sub(lead);
            let end = span.end.saturating_sub(lead).min(len);
            (start < end).then(|| InlineSpan::new(start, end, span.kind))
        })
        .collect();
    record.normalize_spans();
    Some(Stripped { lead })
}

/// Copies the parts of `from`'s spans inside `[start, end)` into `into`,
/// moved by `shift` characters.
fn carry_spans(
    from: &LineRecord,
    start: usize,
    end: usize,
    shift: isize,
    into: &mut Vec<InlineSpan>,
) {
    for span in &from.spans {
        let s = span.start.max(start);
        let e = span.end.min(end);
        if s < e {
            into.push(InlineSpan::new(
                (s as isize + shift).max(0) as usize,
                (e as isize + shift).max(0) as usize,
                span.kind,
            ));
        }
    }
}
