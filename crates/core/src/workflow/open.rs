//! "Open project" as an explicit state machine.
//!
//! ```text
//! AwaitingSelection --pick--> Validating --marker ok--> Opened
//!        ^      \--cancel--> Cancelled    \--no/bad marker--> Retrying
//!        |                                                     |
//!        +------------------- select again --------------------+--cancel--> Cancelled
//! ```
//!
//! Retries are unbounded; only a cancel or a valid project ends the loop.

use std::path::PathBuf;

use tracing::{info, warn};

use super::Launcher;
use crate::{
    dialog::{Prompter, RetryChoice},
    error::LaunchError,
    marker::{MarkerError, ProjectMarker, MARKER_FILE_NAME},
    models::ProjectState,
    project::detect_game_folder,
    tools::Toolchain,
};

const PICK_TITLE: &str = "Select Project to Edit";
const INVALID_TITLE: &str = "Invalid Project Folder";

/// Where the open workflow currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenState {
    /// Waiting for the user to pick a directory.
    AwaitingSelection,
    /// Checking the picked directory for a marker.
    Validating(PathBuf),
    /// The pick was not a project; the user decides whether to try again.
    Retrying {
        /// Directory that failed validation.
        selected: PathBuf,
        /// Why it was rejected, for diagnostics.
        reason: String,
    },
    /// A project was opened.
    Opened(ProjectState),
    /// The user gave up.
    Cancelled,
}

impl OpenState {
    /// `Opened` and `Cancelled` end the workflow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Opened(_) | Self::Cancelled)
    }

    /// Advance by one transition, prompting the user where the state requires it.
    pub async fn step<P: Prompter>(self, prompter: &P) -> Self {
        match self {
            Self::AwaitingSelection => match prompter.pick_directory(PICK_TITLE).await {
                Some(dir) => Self::Validating(dir),
                None => Self::Cancelled,
            },
            Self::Validating(dir) => validate(dir),
            Self::Retrying { .. } => {
                match prompter.ask_retry(INVALID_TITLE, &invalid_message()).await {
                    RetryChoice::SelectAgain => Self::AwaitingSelection,
                    RetryChoice::Cancel => Self::Cancelled,
                }
            }
            terminal => terminal,
        }
    }
}

/// Check `dir` for a project marker and probe it for a game folder.
pub fn validate(dir: PathBuf) -> OpenState {
    match ProjectMarker::read(&dir) {
        Ok(marker) => {
            let project_name = marker.display_name(&dir);
            let game = detect_game_folder(&dir);
            info!(project = %project_name, root = %dir.display(), "opened project");
            OpenState::Opened(ProjectState::new(project_name, &dir, game))
        }
        Err(err) => {
            match &err {
                MarkerError::NotFound(_) => info!("{err}"),
                MarkerError::Corrupt { .. } => warn!("rejecting project with corrupt marker: {err}"),
                MarkerError::Io { .. } => warn!("rejecting unreadable project: {err}"),
            }
            OpenState::Retrying {
                selected: dir,
                reason: err.to_string(),
            }
        }
    }
}

/// Run the state machine from `AwaitingSelection` until it terminates.
pub async fn run<P: Prompter>(prompter: &P) -> Option<ProjectState> {
    let mut state = OpenState::AwaitingSelection;
    while !state.is_terminal() {
        state = state.step(prompter).await;
    }
    match state {
        OpenState::Opened(project) => Some(project),
        _ => None,
    }
}

fn invalid_message() -> String {
    format!(
        "The selected folder does not contain a {MARKER_FILE_NAME} file. \
         Please select a valid project folder."
    )
}

impl<T: Toolchain, P: Prompter> Launcher<T, P> {
    /// Let the user pick an existing project, retrying until valid or cancelled.
    pub async fn open_project(&self) -> Result<ProjectState, LaunchError> {
        run(self.prompter()).await.ok_or(LaunchError::Cancelled)
    }
}
