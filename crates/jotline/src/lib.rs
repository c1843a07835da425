// Jotline library exports

pub mod app;
pub mod composer;
pub mod config;
pub mod input;
pub mod overlay;
pub mod store;
pub mod text_width;
pub mod ui;
pub mod ui_state;

pub use app::App;
pub use composer::{Composer, ComposerSink, ComposerUpdate, EditorSession, InlineToggles};
pub use config::Config;
pub use overlay::{gutter_badges, preview_lines, Overlay, ScrollSync};
pub use store::{MessageStore, StoredMessage};
