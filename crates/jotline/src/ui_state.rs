use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub content: String,
    pub message_type: MessageType,
    pub created_at: Instant,
}

impl StatusMessage {
    pub fn new(content: String, message_type: MessageType) -> Self {
        Self {
            content,
            message_type,
            created_at: Instant::now(),
        }
    }

    fn lifetime(&self) -> Duration {
        match self.message_type {
            MessageType::Info => Duration::from_secs(3),
            MessageType::Warning => Duration::from_secs(5),
            MessageType::Error => Duration::from_secs(7),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.lifetime()
    }
}

/// Shell state that is not part of the composition itself.
#[derive(Debug, Clone, Default)]
pub struct UIState {
    pub status: Option<StatusMessage>,
    pub show_help: bool,
    pub should_quit: bool,
    /// Id of the stored message being edited in place, if any.
    pub editing: Option<u64>,
}

impl UIState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_info_message(&mut self, message: String) {
        self.status = Some(StatusMessage::new(message, MessageType::Info));
    }

    pub fn set_warning_message(&mut self, message: String) {
        self.status = Some(StatusMessage::new(message, MessageType::Warning));
    }

    pub fn set_error_message(&mut self, message: String) {
        self.status = Some(StatusMessage::new(message, MessageType::Error));
    }

    pub fn status_message(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Drops the status message once it has been shown long enough.
    pub fn update_status(&mut self) {
        if self.status.as_ref().is_some_and(StatusMessage::is_expired) {
            self.status = None;
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        let mut state = UIState::new();
        assert!(state.status_message().is_none());

        state.set_warning_message("careful".to_string());
        let status = state.status_message().unwrap();
        assert_eq!(status.content, "careful");
        assert_eq!(status.message_type, MessageType::Warning);

        state.update_status();
        assert!(state.status_message().is_some());
    }

    #[test]
    fn test_expired_status_is_cleared() {
        let mut state = UIState::new();
        state.set_info_message("saved".to_string());
        let Some(past) = Instant::now().checked_sub(Duration::from_secs(10)) else {
            return;
        };
        if let Some(status) = state.status.as_mut() {
            status.created_at = past;
        }
        state.update_status();
        assert!(state.status_message().is_none());
    }

    #[test]
    fn test_toggle_help() {
        let mut state = UIState::new();
        state.toggle_help();
        assert!(state.show_help);
        state.toggle_help();
        assert!(!state.show_help);
    }
}
