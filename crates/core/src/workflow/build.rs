use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use super::Launcher;
use crate::{
    dialog::Prompter,
    error::{LaunchError, ToolStage},
    events::LauncherEvent,
    models::BuildStatus,
    project::find_installer,
    tools::{BuildOutput, ToolError, Toolchain},
};

const SAVE_TITLE: &str = "Save Installer As";

impl<T: Toolchain, P: Prompter> Launcher<T, P> {
    /// Build the project's installer and copy it to a user-chosen path.
    ///
    /// Build output is forwarded chunk by chunk as build-status events while
    /// the process runs. There is no way to cancel a build once started.
    pub async fn build_installer(
        &self,
        project_name: &str,
        project_root: &Path,
    ) -> Result<PathBuf, LaunchError> {
        let default_name = self.config().installer_file_name(project_name);
        let save_to = self
            .prompter()
            .pick_save_path(SAVE_TITLE, &default_name)
            .await
            .ok_or(LaunchError::Cancelled)?;

        let _lease = self.guard().acquire(project_root)?;
        let mut output = self
            .tools()
            .spawn_build(project_root)
            .map_err(|err| LaunchError::tool(ToolStage::Build, err))?;

        let mut exit_code = None;
        while let Some(message) = output.recv().await {
            match message {
                BuildOutput::Stdout(chunk) => {
                    self.build_status(project_name, BuildStatus::Progress, chunk)
                        .await
                }
                BuildOutput::Stderr(chunk) => {
                    self.build_status(project_name, BuildStatus::Error, chunk)
                        .await
                }
                BuildOutput::Exited(code) => {
                    exit_code = code;
                    break;
                }
            }
        }

        if exit_code != Some(0) {
            let code = exit_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(LaunchError::tool(
                ToolStage::Build,
                ToolError::Failed {
                    program: self.config().package_manager.clone(),
                    code: exit_code,
                    diagnostic: format!("Build process exited with code {code}"),
                },
            ));
        }

        let dist_dir = project_root.join(&self.config().dist_dir);
        let installer = find_installer(&dist_dir, &self.config().installer_extension)
            .map_err(|err| LaunchError::io("failed to list build output in", &dist_dir, err))?
            .ok_or_else(|| LaunchError::NoInstaller {
                dist_dir: self.config().dist_dir.clone(),
            })?;

        debug!("copying {} to {}", installer.display(), save_to.display());
        fs::copy(&installer, &save_to)
            .map_err(|err| LaunchError::io("failed to save installer to", &save_to, err))?;
        info!(project = %project_name, "installer saved to {}", save_to.display());
        Ok(save_to)
    }

    async fn build_status(&self, project_name: &str, status: BuildStatus, message: String) {
        self.emit(LauncherEvent::BuildStatus {
            project_name: project_name.to_string(),
            status,
            message,
        })
        .await;
    }
}
