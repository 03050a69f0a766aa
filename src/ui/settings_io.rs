use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::ui::settings::Settings;

pub const APP_DIR: &str = "manim_studio";

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push("settings.json");
    path
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings(settings: &Settings) -> anyhow::Result<()> {
    save_settings_to(&settings_path(), settings)
}

/// Missing or unreadable files fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn saved_settings_load_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.ui_scale = 1.5;
        settings.render.timeout_secs = 300;
        settings.generation.model = "some/other-model".into();
        save_settings_to(&path, &settings).unwrap();

        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn garbage_or_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(load_settings_from(&path), Settings::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn api_key_is_never_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        save_settings_to(&path, &Settings::default()).unwrap();

        let written = fs::read_to_string(path).unwrap();
        assert!(!written.to_lowercase().contains("key"));
    }
}
