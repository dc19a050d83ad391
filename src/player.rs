use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::playback::PlaybackPlan;
use crate::error::PlayerError;
use crate::models::Theme;

fn player_page_path() -> PathBuf {
    std::env::temp_dir()
        .join("music-player")
        .join("now-playing.html")
}

/// 플레이어 페이지를 임시 파일로 쓴다.
pub fn write_player_page(plan: &PlaybackPlan, title: &str, theme: Theme) -> Result<PathBuf, PlayerError> {
    let path = player_page_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| PlayerError::UnsupportedPlayback(e.to_string()))?;
    }
    std::fs::write(&path, plan.page_html(title, theme))
        .map_err(|e| PlayerError::UnsupportedPlayback(e.to_string()))?;
    Ok(path)
}

/// 플레이어 페이지를 만들어 시스템 브라우저로 연다.
/// 여는 프로그램이 없거나 실패하면 이 환경에서는 재생할 방법이 없다고 본다.
pub fn open_in_browser(plan: &PlaybackPlan, title: &str, theme: Theme) -> Result<PathBuf, PlayerError> {
    let path = write_player_page(plan, title, theme)?;
    log::debug!("{} 재생 페이지: {}", plan.kind(), path.display());

    let status = opener(&path)
        .status()
        .map_err(|e| PlayerError::UnsupportedPlayback(format!("cannot launch browser: {e}")))?;

    if status.success() {
        Ok(path)
    } else {
        Err(PlayerError::UnsupportedPlayback(format!(
            "browser launcher exited with {status}"
        )))
    }
}

#[cfg(target_os = "macos")]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(target_os = "windows")]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}
