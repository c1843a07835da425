//! Inline markdown scanning for the read path.
//!
//! [`render_inline`] resolves one line into plain runs and styled spans.
//! Runs of `*` are paired against a stack of earlier runs, so markers that
//! share a boundary (`**ab*cd***`, `***ab**cd*`) pair up the way they were
//! written. Markers that never close are left in the plain text, so a
//! half-typed `*` can never swallow the rest of a message.

use crate::format::{char_len, InlineKind, InlineSpan, LineRecord};

/// Style of a span as written in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStyle {
    BoldItalic,
    Code,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineToken<'a> {
    Plain(&'a str),
    Styled { style: SpanStyle, content: &'a str },
}

/// Outermost tokens of one line. Styled content still holds its nested
/// markers and is resolved when it is scanned in turn.
#[derive(Debug, Clone)]
pub struct InlineScanner<'a> {
    tokens: std::vec::IntoIter<InlineToken<'a>>,
}

pub fn render_inline(text: &str) -> InlineScanner<'_> {
    InlineScanner {
        tokens: tokenize(text).into_iter(),
    }
}

impl<'a> Iterator for InlineScanner<'a> {
    type Item = InlineToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.tokens.next()
    }
}

/// Unpaired stars of one `*` run, as a byte range. Closing takes stars from
/// the front, opening gives them up from the back, so the stars nearest the
/// enclosed text are always the ones paired first.
#[derive(Debug, Clone, Copy)]
struct StarRun {
    start: usize,
    end: usize,
}

impl StarRun {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

/// A styled region: `outer` includes the markers, `inner` is the content.
#[derive(Debug, Clone, Copy)]
struct Region {
    outer: (usize, usize),
    inner: (usize, usize),
    style: SpanStyle,
}

fn tokenize(text: &str) -> Vec<InlineToken<'_>> {
    let (mut runs, mut regions) = lex(text);
    regions.extend(pair_runs(text, &mut runs));
    regions.sort_by(|a, b| a.outer.0.cmp(&b.outer.0).then(b.outer.1.cmp(&a.outer.1)));

    let mut tokens = Vec::new();
    let mut pos = 0;
    for region in regions {
        // nested regions are left to the scan of their parent's content
        if region.outer.0 < pos {
            continue;
        }
        if region.outer.0 > pos {
            tokens.push(InlineToken::Plain(&text[pos..region.outer.0]));
        }
        tokens.push(InlineToken::Styled {
            style: region.style,
            content: &text[region.inner.0..region.inner.1],
        });
        pos = region.outer.1;
    }
    if pos < text.len() {
        tokens.push(InlineToken::Plain(&text[pos..]));
    }
    tokens
}

/// Splits out code spans and `*` runs. Stars inside code are not runs.
fn lex(text: &str) -> (Vec<StarRun>, Vec<Region>) {
    let bytes = text.as_bytes();
    let mut runs = Vec::new();
    let mut code = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'`' => match code_span_len(&text[i..]) {
                Some(len) => {
                    code.push(Region {
                        outer: (i, i + len),
                        inner: (i + 1, i + len - 1),
                        style: SpanStyle::Code,
                    });
                    i += len;
                }
                None => i += 1,
            },
            b'*' => {
                let start = i;
                while i < bytes.len() && bytes[i] == b'*' {
                    i += 1;
                }
                runs.push(StarRun { start, end: i });
            }
            _ => i += 1,
        }
    }

    (runs, code)
}

/// Byte length of the code span opening `rest`, backticks included.
fn code_span_len(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix('`')?;
    let close = body.find('`')?;
    if body[..close].trim().is_empty() {
        return None;
    }
    Some(close + 2)
}

/// Stars a closing run can take from an opening run. A lone `*` never
/// closes `**` and `**` never closes a lone `*`; an opening run of three or
/// more gives up its inner stars first.
fn take(open: usize, close: usize) -> Option<usize> {
    match (open, close) {
        (1, 2) | (2, 1) => None,
        (open, close) if open >= 3 => Some(close.min(3)),
        (open, close) => Some(open.min(close)),
    }
}

/// Pairs star runs left to right. Each run first closes what it can, then
/// whatever is left of it waits as an opener. When the nearest opener does
/// not fit, a deeper one may, and everything above it turns literal.
fn pair_runs(text: &str, runs: &mut [StarRun]) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut openers: Vec<usize> = Vec::new();

    for i in 0..runs.len() {
        while runs[i].len() > 0 {
            let found = openers.iter().enumerate().rev().find_map(|(depth, &o)| {
                let n = take(runs[o].len(), runs[i].len())?;
                let content = &text[runs[o].end..runs[i].start];
                (!content.trim().is_empty()).then_some((depth, o, n))
            });
            let Some((depth, o, n)) = found else {
                break;
            };

            openers.truncate(depth + 1);
            regions.push(Region {
                outer: (runs[o].end - n, runs[i].start + n),
                inner: (runs[o].end, runs[i].start),
                style: match n {
                    1 => SpanStyle::Italic,
                    2 => SpanStyle::Bold,
                    _ => SpanStyle::BoldItalic,
                },
            });
            runs[o].end -= n;
            runs[i].start += n;
            if runs[o].len() == 0 {
                openers.pop();
            }
        }

        if runs[i].len() > 0 {
            openers.push(i);
        }
    }

    regions
}

/// Effective style of a run once nesting has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

impl RunStyle {
    fn with(mut self, style: SpanStyle) -> Self {
        match style {
            SpanStyle::BoldItalic => {
                self.bold = true;
                self.italic = true;
            }
            SpanStyle::Bold => self.bold = true,
            SpanStyle::Italic => self.italic = true,
            SpanStyle::Code => self.code = true,
        }
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == RunStyle::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub style: RunStyle,
}

/// Flattens a line into runs with combined styles, descending into the
/// content of bold and italic spans. Code content is never re-scanned.
pub fn styled_runs(text: &str) -> Vec<StyledRun> {
    let mut runs = Vec::new();
    collect_runs(text, RunStyle::default(), &mut runs);
    runs
}

fn collect_runs(text: &str, inherited: RunStyle, runs: &mut Vec<StyledRun>) {
    for token in render_inline(text) {
        match token {
            InlineToken::Plain(plain) => push_run(runs, plain, inherited),
            InlineToken::Styled {
                style: SpanStyle::Code,
                content,
            } => push_run(runs, content, inherited.with(SpanStyle::Code)),
            InlineToken::Styled { style, content } => {
                collect_runs(content, inherited.with(style), runs)
            }
        }
    }
}

fn push_run(runs: &mut Vec<StyledRun>, text: &str, style: RunStyle) {
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => runs.push(StyledRun {
            text: text.to_string(),
            style,
        }),
    }
}

/// Best-effort inverse of inline wrapping: strips bold/italic markers and
/// returns the bare text with the spans they described. Code spans keep
/// their backticks since the line model has no code style.
pub fn recover_spans(text: &str) -> (String, Vec<InlineSpan>) {
    let runs = styled_runs(text);
    let mut bare = String::with_capacity(text.len());
    let mut marks = Vec::new();
    let mut offset = 0;

    for run in runs {
        let piece = if run.style.code {
            format!("`{}`", run.text)
        } else {
            run.text
        };
        let len = char_len(&piece);
        if run.style.bold {
            marks.push(InlineSpan::new(offset, offset + len, InlineKind::Bold));
        }
        if run.style.italic {
            marks.push(InlineSpan::new(offset, offset + len, InlineKind::Italic));
        }
        bare.push_str(&piece);
        offset += len;
    }

    let mut line = LineRecord::plain(bare);
    for span in marks {
        line.add_span(span);
    }
    (line.text, line.spans)
}
