//! Platform-specific directories.
use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "conflict")
}

/// Log directory, e.g. `~/.cache/conflict/logs` on Linux.
pub fn log_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/conflict"))
        .join("logs")
}

/// Data directory, e.g. `~/.local/share/conflict` on Linux.
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./conflict_data"))
}
