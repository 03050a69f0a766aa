use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;

pub const DOWNLOAD_NAME: &str = "animation.mp4";

/// Where previews are written so the system player can open them.
pub fn preview_dir() -> PathBuf {
    let mut path = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
    path.push(crate::ui::settings_io::APP_DIR);
    path.push("previews");
    path
}

/// Writes `video` as `animation_<n>.mp4` under `dir`, replacing any older copy.
pub fn write_preview(dir: &Path, number: usize, video: &[u8]) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(format!("animation_{number}.mp4"));
    fs::write(&path, video).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

pub fn open_in_player(path: &Path) -> anyhow::Result<()> {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };

    cmd.arg(path)
        .spawn()
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(())
}

/// Save dialog pre-filled with the download name. `Ok(None)` if cancelled.
pub fn save_with_dialog(video: &[u8]) -> anyhow::Result<Option<PathBuf>> {
    let Some(path) = rfd::FileDialog::new()
        .set_file_name(DOWNLOAD_NAME)
        .add_filter("MP4 video", &["mp4"])
        .save_file()
    else {
        return Ok(None);
    };

    fs::write(&path, video).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "animation saved");
    Ok(Some(path))
}
