use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mdcore::{BlockType, InlineKind};

use crate::composer::{Composer, ComposerSink, ComposerUpdate};
use crate::config::{Config, SoftNewlineKey};
use crate::input::InputBuffer;
use crate::overlay::ScrollSync;
use crate::store::MessageStore;
use crate::ui_state::UIState;

/// Logs what the composer hands off. The app reads results straight from
/// the returned updates.
struct LogSink;

impl ComposerSink for LogSink {
    fn on_content_change(&mut self, content: &str) {
        log::trace!("draft is now {} bytes", content.len());
    }

    fn on_submit(&mut self, content: &str) {
        log::debug!("submitted {} lines", content.lines().count());
    }
}

pub struct App {
    pub composer: Composer,
    pub input: InputBuffer,
    pub store: MessageStore,
    pub config: Config,
    pub ui_state: UIState,
    pub scroll_sync: ScrollSync,
}

impl App {
    pub async fn new() -> Result<Self> {
        let config = Config::load().await?;
        let mut ui_state = UIState::new();

        let store = match config.store_path() {
            Some(path) => match MessageStore::load(&path).await {
                Ok(store) => store,
                Err(e) => {
                    log::error!("Failed to load message history: {}", e);
                    ui_state.set_error_message(format!(
                        "History unavailable, messages will not be saved: {}",
                        e
                    ));
                    MessageStore::in_memory()
                }
            },
            None => {
                log::warn!("No data directory found, keeping messages in memory");
                MessageStore::in_memory()
            }
        };

        let mut app = Self::with_parts(config, store);
        app.ui_state = ui_state;
        Ok(app)
    }

    pub fn with_parts(config: Config, store: MessageStore) -> Self {
        let mut input = InputBuffer::new();
        input.set_viewport_height(config.composer.height as usize);

        Self {
            composer: Composer::with_sink(Box::new(LogSink)),
            input,
            store,
            config,
            ui_state: UIState::new(),
            scroll_sync: ScrollSync::default(),
        }
    }

    pub fn should_quit(&self) -> bool {
        self.ui_state.should_quit
    }

    pub fn quit(&mut self) {
        self.ui_state.should_quit = true;
    }

    pub fn update_status(&mut self) {
        self.ui_state.update_status();
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        if self.ui_state.show_help {
            self.ui_state.toggle_help();
            return Ok(());
        }

        match key.code {
            KeyCode::Char('c') if ctrl => self.quit(),
            KeyCode::Esc => {
                if self.ui_state.editing.take().is_some() {
                    let update = self.composer.reset();
                    self.apply_update(update);
                    self.ui_state.set_info_message("Edit cancelled".to_string());
                } else {
                    self.quit();
                }
            }
            KeyCode::F(1) => self.ui_state.toggle_help(),

            KeyCode::Enter if self.is_soft_newline(key.modifiers) => {
                let update = self.composer.soft_newline(self.input.cursor());
                self.apply_update(update);
            }
            KeyCode::Char('j') if ctrl => {
                let update = self.composer.soft_newline(self.input.cursor());
                self.apply_update(update);
            }
            KeyCode::Enter => self.submit().await?,

            KeyCode::Char('e') if ctrl => self.edit_last(),
            KeyCode::Char('d') if ctrl => self.delete_last().await?,

            KeyCode::Char(c) if alt => self.handle_format_key(c),

            KeyCode::Backspace => match self.composer.backspace(self.input.cursor()) {
                Some(update) => self.apply_update(update),
                None => {
                    if self.input.delete_backward() {
                        self.text_changed();
                    }
                }
            },
            KeyCode::Delete => {
                if self.input.delete_forward() {
                    self.text_changed();
                }
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.insert_char(c);
                self.text_changed();
            }

            KeyCode::Left => self.navigate(InputBuffer::move_cursor_left),
            KeyCode::Right => self.navigate(InputBuffer::move_cursor_right),
            KeyCode::Up => self.navigate(InputBuffer::move_cursor_up),
            KeyCode::Down => self.navigate(InputBuffer::move_cursor_down),
            KeyCode::Home => self.navigate(InputBuffer::move_to_line_start),
            KeyCode::End => self.navigate(InputBuffer::move_to_line_end),
            _ => {}
        }

        Ok(())
    }

    pub fn handle_paste(&mut self, text: &str) {
        let update = self.composer.paste(text, self.input.cursor());
        self.apply_update(update);
    }

    fn is_soft_newline(&self, modifiers: KeyModifiers) -> bool {
        match self.config.composer.soft_newline_key {
            SoftNewlineKey::ShiftEnter => modifiers.contains(KeyModifiers::SHIFT),
            SoftNewlineKey::AltEnter => modifiers.contains(KeyModifiers::ALT),
        }
    }

    fn handle_format_key(&mut self, c: char) {
        let block = match c {
            'b' => {
                self.toggle(InlineKind::Bold);
                return;
            }
            'i' => {
                self.toggle(InlineKind::Italic);
                return;
            }
            '0' => BlockType::Plain,
            '1' => BlockType::Heading1,
            '2' => BlockType::Heading2,
            '3' => BlockType::Heading3,
            '8' => BlockType::UnorderedItem,
            '9' => BlockType::OrderedItem,
            _ => return,
        };
        let update = self.composer.set_block_format(block);
        self.apply_update(update);
    }

    fn toggle(&mut self, kind: InlineKind) {
        let armed = self.composer.toggle_inline(kind);
        let name = match kind {
            InlineKind::Bold => "Bold",
            InlineKind::Italic => "Italic",
        };
        self.ui_state
            .set_info_message(format!("{} {}", name, if armed { "on" } else { "off" }));
    }

    fn text_changed(&mut self) {
        let text = self.input.text();
        let update = self.composer.apply_text_change(&text, self.input.cursor());
        self.apply_update(update);
    }

    fn navigate(&mut self, movement: fn(&mut InputBuffer)) {
        movement(&mut self.input);
        self.composer.move_cursor(self.input.cursor());
        self.input.adjust_viewport();
    }

    /// Writes the composer's canonical text and caret back into the input.
    fn apply_update(&mut self, update: ComposerUpdate) {
        self.input.set_text(&update.text, update.cursor);
        self.input.adjust_viewport();
        if update.scroll_sync {
            let (line, col) = self.input.cursor_screen_position();
            self.scroll_sync
                .sync(self.input.viewport_offset(), line, self.input.viewport_height());
            self.scroll_sync
                .sync_column(self.input.viewport_column(), col, self.input.viewport_width());
        }
    }

    async fn submit(&mut self) -> Result<()> {
        let Some(content) = self.composer.hard_newline() else {
            return Ok(());
        };
        self.input.clear();

        match self.ui_state.editing.take() {
            Some(id) => {
                self.store.update(id, &content)?;
                self.ui_state.set_info_message("Message updated".to_string());
            }
            None => {
                self.store.create(&content, None);
            }
        }
        self.persist().await;
        Ok(())
    }

    /// Loads the newest message into the composer for editing in place.
    fn edit_last(&mut self) {
        let Some(message) = self.store.last() else {
            self.ui_state.set_warning_message("No message to edit".to_string());
            return;
        };
        let id = message.id;
        let update = self.composer.load(&message.content);
        self.apply_update(update);
        self.ui_state.editing = Some(id);
        self.ui_state.set_info_message(format!("Editing message {} (Esc to cancel)", id));
    }

    async fn delete_last(&mut self) -> Result<()> {
        let Some(id) = self.store.last().map(|m| m.id) else {
            self.ui_state.set_warning_message("No message to delete".to_string());
            return Ok(());
        };
        if self.ui_state.editing == Some(id) {
            self.ui_state.editing = None;
            let update = self.composer.reset();
            self.apply_update(update);
        }
        self.store.delete(id)?;
        self.ui_state.set_info_message(format!("Deleted message {}", id));
        self.persist().await;
        Ok(())
    }

    async fn persist(&mut self) {
        if let Err(e) = self.store.save().await {
            log::error!("Failed to save message history: {}", e);
            self.ui_state
                .set_error_message(format!("Failed to save history: {}", e));
        }
    }
}
