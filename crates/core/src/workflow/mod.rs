//! The create/open/import/build workflows and the command dispatcher.
//!
//! Each workflow returns a `Result` describing how it ended; [`Launcher::handle`]
//! turns that into the dialogs and events the presentation layer expects.
//! Partially completed steps are never rolled back: a failed install leaves
//! the cloned project in place and a failed copy leaves a partial tree.

mod build;
mod create;
mod guard;
mod import;
pub mod open;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

pub use guard::{ProjectGuard, ProjectLease};
pub use open::OpenState;

use crate::{
    config::AppConfig,
    dialog::Prompter,
    error::LaunchError,
    events::{LauncherCommand, LauncherEvent, StartChoice},
    models::{BuildStatus, ImportStatus},
    tools::Toolchain,
};

/// Drives the launcher workflows against a toolchain and a dialog front end.
pub struct Launcher<T, P> {
    inner: Arc<Inner<T, P>>,
}

struct Inner<T, P> {
    config: AppConfig,
    tools: T,
    prompter: P,
    events: mpsc::Sender<LauncherEvent>,
    guard: ProjectGuard,
}

impl<T, P> Clone for Launcher<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Toolchain, P: Prompter> Launcher<T, P> {
    /// Build a launcher that reports to `events`.
    pub fn new(
        config: AppConfig,
        tools: T,
        prompter: P,
        events: mpsc::Sender<LauncherEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                tools,
                prompter,
                events,
                guard: ProjectGuard::default(),
            }),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Ask the presentation layer to show the create/edit choice.
    pub async fn start(&self) {
        self.emit(LauncherEvent::ShowStartDialog).await;
    }

    /// Run the workflow for `command` to completion and report its outcome.
    pub async fn handle(&self, command: LauncherCommand) {
        debug!(?command, "handling launcher command");
        match command {
            LauncherCommand::StartChoice(StartChoice::New { project_name }) => {
                match self.create_project(project_name.as_deref()).await {
                    Ok(state) => self.emit(LauncherEvent::OpenProject(state)).await,
                    Err(err) => self.report_with_dialog(create_error_title(&err), err).await,
                }
            }
            LauncherCommand::StartChoice(StartChoice::Edit) => match self.open_project().await {
                Ok(state) => self.emit(LauncherEvent::OpenProject(state)).await,
                Err(err) => self.report_with_dialog("Error", err).await,
            },
            LauncherCommand::ImportGame {
                project_name,
                project_root,
            } => match self.import_game(&project_name, &project_root).await {
                Ok(state) => self.emit(LauncherEvent::OpenProject(state)).await,
                Err(err @ (LaunchError::Validation(_) | LaunchError::Busy(_))) => {
                    let title = if matches!(err, LaunchError::Busy(_)) {
                        "Project Busy"
                    } else {
                        "Invalid Game Folder"
                    };
                    self.report_with_dialog(title, err).await
                }
                Err(LaunchError::Cancelled) => {}
                Err(err) => {
                    error!(project = %project_name, "import failed: {err}");
                    self.emit(LauncherEvent::ImportStatus {
                        project_name,
                        status: ImportStatus::Error,
                        message: format!("Failed to import game: {err}"),
                    })
                    .await
                }
            },
            LauncherCommand::BuildInstaller {
                project_name,
                project_root,
                game_folder_name,
            } => {
                if game_folder_name.is_none() {
                    info!(project = %project_name, "building installer without an imported game");
                }
                match self.build_installer(&project_name, &project_root).await {
                    Ok(saved) => {
                        self.emit(LauncherEvent::BuildStatus {
                            project_name,
                            status: BuildStatus::Success,
                            message: format!("Installer built and saved to {}", saved.display()),
                        })
                        .await
                    }
                    Err(LaunchError::Cancelled) => {}
                    Err(err) => {
                        error!(project = %project_name, "build failed: {err}");
                        self.emit(LauncherEvent::BuildStatus {
                            project_name,
                            status: BuildStatus::Error,
                            message: err.to_string(),
                        })
                        .await
                    }
                }
            }
        }
    }

    async fn report_with_dialog(&self, title: &str, err: LaunchError) {
        if err.is_cancelled() {
            debug!("workflow cancelled by user");
            return;
        }
        error!("{title}: {err}");
        self.inner.prompter.show_error(title, &err.to_string()).await;
    }

    pub(crate) async fn emit(&self, event: LauncherEvent) {
        if self.inner.events.send(event).await.is_err() {
            debug!("event receiver dropped");
        }
    }

    pub(crate) async fn progress(&self, message: impl Into<String>) {
        self.emit(LauncherEvent::Progress {
            message: message.into(),
        })
        .await;
    }

    pub(crate) fn tools(&self) -> &T {
        &self.inner.tools
    }

    pub(crate) fn prompter(&self) -> &P {
        &self.inner.prompter
    }

    pub(crate) fn guard(&self) -> &ProjectGuard {
        &self.inner.guard
    }
}

fn create_error_title(err: &LaunchError) -> &'static str {
    match err {
        LaunchError::Tool { stage, .. } => stage.title(),
        LaunchError::Busy(_) => "Project Busy",
        _ => "Error",
    }
}
