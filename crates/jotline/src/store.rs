//! Submitted messages, kept as serialized content in a JSON file.

use anyhow::Result;
use chrono::{DateTime, Utc};
use mdcore::{BlockType, MessageDocument};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::try_exists;

/// Opaque reference to an attached image. The store never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: u64,
    pub content: String,
    /// Whole-message format from before per-line prefixes existed.
    #[serde(default)]
    pub format: Option<BlockType>,
    #[serde(default)]
    pub attachment: Option<AttachmentRef>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub edited: bool,
}

impl StoredMessage {
    pub fn document(&self) -> MessageDocument {
        MessageDocument::parse_with_format(&self.content, self.format)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: u64,
    messages: Vec<StoredMessage>,
}

/// Keyed message records with create/update/delete.
#[derive(Debug, Default)]
pub struct MessageStore {
    path: Option<PathBuf>,
    next_id: u64,
    messages: Vec<StoredMessage>,
}

impl MessageStore {
    /// A store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !try_exists(&path).await? {
            log::info!("No message history at {}, starting empty", path.display());
            return Ok(Self {
                path: Some(path),
                ..Self::default()
            });
        }

        let json = fs::read_to_string(&path).await?;
        let file: StoreFile = serde_json::from_str(&json).map_err(|e| {
            anyhow::anyhow!("Failed to parse message history {}: {}", path.display(), e)
        })?;
        // Never hand out an id that is already taken, even if the file was
        // edited by hand.
        let max_id = file.messages.iter().map(|m| m.id).max().unwrap_or(0);
        log::info!(
            "Loaded {} messages from {}",
            file.messages.len(),
            path.display()
        );

        Ok(Self {
            path: Some(path),
            next_id: file.next_id.max(max_id + 1),
            messages: file.messages,
        })
    }

    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let file = StoreFile {
            next_id: self.next_id,
            messages: self.messages.clone(),
        };
        fs::write(path, serde_json::to_string_pretty(&file)?).await?;
        log::debug!("Saved {} messages to {}", self.messages.len(), path.display());
        Ok(())
    }

    pub fn create(&mut self, content: &str, attachment: Option<AttachmentRef>) -> &StoredMessage {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.messages.push(StoredMessage {
            id,
            content: content.to_string(),
            format: None,
            attachment,
            timestamp: Utc::now(),
            edited: false,
        });
        log::info!("Created message {}", id);
        &self.messages[self.messages.len() - 1]
    }

    /// Replaces a message's content, marking it edited and refreshing its
    /// timestamp.
    pub fn update(&mut self, id: u64, content: &str) -> Result<&StoredMessage> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| anyhow::anyhow!("Message {} not found", id))?;
        message.content = content.to_string();
        message.format = None;
        message.edited = true;
        message.timestamp = Utc::now();
        log::info!("Updated message {}", id);
        Ok(message)
    }

    pub fn delete(&mut self, id: u64) -> Result<StoredMessage> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| anyhow::anyhow!("Message {} not found", id))?;
        log::info!("Deleted message {}", id);
        Ok(self.messages.remove(index))
    }

    pub fn get(&self, id: u64) -> Option<&StoredMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Messages in submission order.
    pub fn list(&self) -> &[StoredMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&StoredMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdcore::Block;
    use tempfile::TempDir;

    #[test]
    fn test_create_update_delete() {
        let mut store = MessageStore::in_memory();
        let first = store.create("# hello", None).id;
        let second = store.create("- a\n- b", Some(AttachmentRef("img-1".into()))).id;
        assert!(second > first);
        assert_eq!(store.len(), 2);

        let updated = store.update(first, "## hi").unwrap();
        assert!(updated.edited);
        assert_eq!(updated.content, "## hi");

        let removed = store.delete(second).unwrap();
        assert_eq!(removed.attachment, Some(AttachmentRef("img-1".into())));
        assert!(store.get(second).is_none());
        assert!(store.delete(second).is_err());
        assert!(store.update(99, "x").is_err());
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let mut store = MessageStore::in_memory();
        let id = store.create("a", None).id;
        store.delete(id).unwrap();
        assert!(store.create("b", None).id > id);
    }

    #[test]
    fn test_legacy_format_rendering() {
        let message = StoredMessage {
            id: 1,
            content: "Old headline".to_string(),
            format: Some(BlockType::Heading2),
            attachment: None,
            timestamp: Utc::now(),
            edited: false,
        };
        assert_eq!(
            message.document().blocks,
            vec![Block::Heading { level: 2, text: "Old headline".into() }]
        );
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("messages.json");

        let mut store = MessageStore::load(&path).await.unwrap();
        assert!(store.is_empty());
        store.create("**bold** news", None);
        store.create("1. one\n2. two", None);
        store.save().await.unwrap();

        let mut reloaded = MessageStore::load(&path).await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.list()[1].content, "1. one\n2. two");
        assert_eq!(reloaded.create("third", None).id, 3);
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("messages.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(MessageStore::load(&path).await.is_err());
    }
}
