use anyhow::Result;
use directories::ProjectDirs;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs::try_exists;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub composer: ComposerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub foreground: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub badge_color: Option<String>,
    #[serde(default)]
    pub status_background: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    pub show_gutter: bool,
    /// Rows of the composer pane, toolbar excluded.
    pub height: u16,
    pub soft_newline_key: SoftNewlineKey,
}

/// Which modifier turns Enter into a soft newline. Ctrl+J always works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoftNewlineKey {
    ShiftEnter,
    AltEnter,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Message history file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme {
                name: String::from("dark"),
                foreground: Some(String::from("#D8DEE9")),
                background: Some(String::from("#1E1E1E")),
                accent_color: Some(String::from("#FFD166")),
                badge_color: Some(String::from("#6C7A89")),
                status_background: Some(String::from("#005F87")),
            },
            composer: ComposerConfig {
                show_gutter: true,
                height: 5,
                soft_newline_key: SoftNewlineKey::ShiftEnter,
            },
            store: StoreConfig::default(),
        }
    }
}

impl Theme {
    /// Parses a `#RRGGBB` color. Anything else yields `None`.
    pub fn parse_color(value: &str) -> Option<Color> {
        let hex = value.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn color(value: &Option<String>, fallback: Color) -> Color {
        value
            .as_deref()
            .and_then(Self::parse_color)
            .unwrap_or(fallback)
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        if let Some(config_path) = Self::config_path() {
            if try_exists(&config_path).await? {
                match tokio::fs::read_to_string(&config_path).await {
                    Ok(content) => {
                        if content.trim().is_empty() {
                            log::warn!("Config file is empty, creating new one");
                            let default_config = Self::default();
                            let _ = default_config.save().await;
                            return Ok(default_config);
                        }

                        match serde_json::from_str::<Self>(&content) {
                            Ok(mut config) => {
                                config.validate()?;
                                log::info!(
                                    "Successfully loaded config from: {}",
                                    config_path.display()
                                );
                                return Ok(config);
                            }
                            Err(json_err) => {
                                log::error!("Failed to parse config file: {}", json_err);

                                // Backup broken config
                                let backup_path = config_path.with_extension("bak");
                                if let Err(e) = tokio::fs::copy(&config_path, &backup_path).await {
                                    log::warn!("Failed to backup broken config: {}", e);
                                } else {
                                    log::info!(
                                        "Backed up broken config to: {}",
                                        backup_path.display()
                                    );
                                }

                                let default_config = Self::default();
                                let _ = default_config.save().await;
                                return Ok(default_config);
                            }
                        }
                    }
                    Err(io_err) => {
                        log::error!("Failed to read config file: {}", io_err);
                    }
                }
            } else {
                log::info!("Config file does not exist, creating default");
            }
        }

        let default_config = Self::default();
        let _ = default_config.save().await;
        Ok(default_config)
    }

    pub async fn save(&self) -> Result<()> {
        let Some(config_path) = Self::config_path() else {
            return Ok(());
        };

        let mut config_to_save = self.clone();
        config_to_save.validate()?;

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                )
            })?;
        }

        let content = serde_json::to_string_pretty(&config_to_save)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
        tokio::fs::write(&config_path, content).await.map_err(|e| {
            anyhow::anyhow!(
                "Failed to write config file {}: {}",
                config_path.display(),
                e
            )
        })?;

        log::info!("Successfully saved config to: {}", config_path.display());
        Ok(())
    }

    /// Validate configuration values and fix invalid ones
    pub fn validate(&mut self) -> Result<()> {
        let mut has_issues = false;

        if self.composer.height == 0 || self.composer.height > 20 {
            log::warn!("Invalid composer height: {}, using default", self.composer.height);
            self.composer.height = 5;
            has_issues = true;
        }

        if self.theme.name.is_empty() {
            log::warn!("Empty theme name, using default");
            self.theme.name = "dark".to_string();
            has_issues = true;
        }

        for (name, color) in [
            ("foreground", &mut self.theme.foreground),
            ("background", &mut self.theme.background),
            ("accent_color", &mut self.theme.accent_color),
            ("badge_color", &mut self.theme.badge_color),
            ("status_background", &mut self.theme.status_background),
        ] {
            if let Some(value) = color.as_deref() {
                if Theme::parse_color(value).is_none() {
                    log::warn!("Invalid {} color {:?}, ignoring it", name, value);
                    *color = None;
                    has_issues = true;
                }
            }
        }

        if has_issues {
            log::info!("Configuration validation completed with corrections");
        }

        Ok(())
    }

    /// Where submitted messages are kept.
    pub fn store_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.store.path {
            return Some(path.clone());
        }

        if let Ok(dir) = std::env::var("JOTLINE_DATA_DIR") {
            return Some(PathBuf::from(dir).join("messages.json"));
        }

        ProjectDirs::from("com", "jotline", "jotline")
            .map(|dirs| dirs.data_dir().join("messages.json"))
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("JOTLINE_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        if let Ok(dir) = std::env::var("JOTLINE_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.json"));
        }

        ProjectDirs::from("com", "jotline", "jotline")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn config_test_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn set_config_path(path: &std::path::Path) -> Option<String> {
        let previous = std::env::var("JOTLINE_CONFIG_PATH").ok();
        std::env::set_var("JOTLINE_CONFIG_PATH", path);
        previous
    }

    fn restore_config_env(previous: Option<String>) {
        match previous {
            Some(value) => std::env::set_var("JOTLINE_CONFIG_PATH", value),
            None => std::env::remove_var("JOTLINE_CONFIG_PATH"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.theme.name, "dark");
        assert!(config.composer.show_gutter);
        assert_eq!(config.composer.height, 5);
        assert_eq!(config.composer.soft_newline_key, SoftNewlineKey::ShiftEnter);
        assert!(config.store.path.is_none());
        assert_eq!(config.theme.accent_color.as_deref(), Some("#FFD166"));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(Theme::parse_color("#FF8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(Theme::parse_color("FF8000"), None);
        assert_eq!(Theme::parse_color("#FFF"), None);
        assert_eq!(Theme::parse_color("#GG0000"), None);
        assert_eq!(Theme::color(&None, Color::Reset), Color::Reset);
    }

    #[test]
    fn test_validate_corrects_values() {
        let mut config = Config::default();
        config.composer.height = 0;
        config.theme.name.clear();
        config.theme.badge_color = Some("blue".to_string());

        config.validate().unwrap();
        assert_eq!(config.composer.height, 5);
        assert_eq!(config.theme.name, "dark");
        assert!(config.theme.badge_color.is_none());
        assert!(config.theme.foreground.is_some());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"composer\""));
        assert!(json.contains("\"ShiftEnter\""));

        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.composer.height, config.composer.height);
        assert_eq!(back.theme.foreground, config.theme.foreground);
    }

    #[test]
    fn test_store_section_is_optional() {
        let json = r#"{
            "theme": { "name": "light" },
            "composer": { "show_gutter": false, "height": 3, "soft_newline_key": "AltEnter" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.store.path.is_none());
        assert!(config.theme.accent_color.is_none());
        assert_eq!(config.composer.soft_newline_key, SoftNewlineKey::AltEnter);
    }

    #[tokio::test]
    async fn test_config_load_and_broken_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let previous = {
            let _guard = config_test_lock().lock().unwrap();
            set_config_path(&path)
        }; // release lock before await

        // missing file: defaults are written out
        let config = Config::load().await.unwrap();
        assert_eq!(config.theme.name, "dark");
        assert!(path.exists());

        tokio::fs::write(&path, "{ not json").await.unwrap();
        let config = Config::load().await.unwrap();
        assert_eq!(config.composer.height, 5);
        assert!(path.with_extension("bak").exists());

        restore_config_env(previous);
    }
}
