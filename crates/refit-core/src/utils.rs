//! Shared utility functions for Refit crates

use anyhow::anyhow;
use camino::Utf8PathBuf;
use std::path::PathBuf;

/// Get the user's home directory
///
/// Prefers the HOME environment variable over dirs::home_dir() so that
/// service units and containers that override HOME are respected.
pub fn get_home_dir() -> anyhow::Result<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }

    dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))
}

/// Get the directory Refit keeps its own state in
///
/// Uses the platform data directory (`~/.local/share/refit` on Linux),
/// falling back to `~/.refit` when the platform has none.
pub fn get_data_dir() -> anyhow::Result<Utf8PathBuf> {
    let base = match dirs::data_dir() {
        Some(dir) => dir.join("refit"),
        None => get_home_dir()?.join(".refit"),
    };

    Utf8PathBuf::from_path_buf(base)
        .map_err(|p| anyhow!("Data directory is not valid UTF-8: {}", p.display()))
}
