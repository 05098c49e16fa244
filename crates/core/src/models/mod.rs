//! Shared domain models.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// An exported game detected under `src/Project Files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFolder {
    /// Absolute path to the game folder.
    pub game_dir: PathBuf,
    /// Folder name under `src/Project Files`.
    pub game_folder_name: String,
}

/// Snapshot of a project as shown by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    /// Logical project name.
    pub project_name: String,
    /// Root directory holding the project marker.
    pub project_root: PathBuf,
    /// Whether a game folder was detected.
    pub has_game: bool,
    /// Name of the detected game folder, if any.
    pub game_folder_name: Option<String>,
}

impl ProjectState {
    /// Combine a project identity with the result of a game-folder lookup.
    pub fn new(
        project_name: impl Into<String>,
        project_root: impl AsRef<Path>,
        game: Option<GameFolder>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            project_root: project_root.as_ref().to_path_buf(),
            has_game: game.is_some(),
            game_folder_name: game.map(|game| game.game_folder_name),
        }
    }
}

/// Outcome reported by the import workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    /// Game copied into the project.
    Success,
    /// Copy failed.
    Error,
}

/// Progress or outcome reported by the build workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    /// Standard output chunk from the build.
    Progress,
    /// Installer saved to the chosen destination.
    Success,
    /// Standard error chunk or terminal failure.
    Error,
}
