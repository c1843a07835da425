pub mod classify;
pub mod format;
pub mod inline;
pub mod message;
pub mod serialize;

pub use classify::{classify_line, Classification, LineSyntax};
pub use format::{BlockType, InlineKind, InlineSpan, LineRecord};
pub use inline::{render_inline, styled_runs, InlineToken, SpanStyle};
pub use message::{parse_records, Block, MessageDocument};
pub use serialize::serialize;

#[cfg(test)]
mod tests;
