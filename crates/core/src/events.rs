//! Messages exchanged between the workflows and the presentation layer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{BuildStatus, ImportStatus, ProjectState};

/// One-way notifications emitted to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LauncherEvent {
    /// Ask the user whether to create or edit a project.
    ShowStartDialog,
    /// Free-text progress line.
    Progress {
        /// Message to display.
        message: String,
    },
    /// A project was created, opened or refreshed.
    OpenProject(ProjectState),
    /// Result of a game import.
    #[serde(rename_all = "camelCase")]
    ImportStatus {
        /// Project the import targeted.
        project_name: String,
        /// Outcome.
        status: ImportStatus,
        /// Human readable detail.
        message: String,
    },
    /// Progress or result of an installer build.
    #[serde(rename_all = "camelCase")]
    BuildStatus {
        /// Project being built.
        project_name: String,
        /// Chunk kind or outcome.
        status: BuildStatus,
        /// Output chunk or human readable detail.
        message: String,
    },
}

/// What the user picked on the start prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "camelCase")]
pub enum StartChoice {
    /// Create a new project with the given name.
    #[serde(rename_all = "camelCase")]
    New {
        /// Name typed by the user; validated by the create workflow.
        project_name: Option<String>,
    },
    /// Open an existing project.
    Edit,
}

/// Inbound requests from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LauncherCommand {
    /// Create or open a project.
    StartChoice(StartChoice),
    /// Import an exported game into a project.
    #[serde(rename_all = "camelCase")]
    ImportGame {
        /// Project display name.
        project_name: String,
        /// Project root directory.
        project_root: PathBuf,
    },
    /// Build an installer for a project.
    #[serde(rename_all = "camelCase")]
    BuildInstaller {
        /// Project display name.
        project_name: String,
        /// Project root directory.
        project_root: PathBuf,
        /// Game folder detected for the project, if any.
        game_folder_name: Option<String>,
    },
}
