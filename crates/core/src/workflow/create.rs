use std::{fs, path::Path};

use tracing::info;

use super::Launcher;
use crate::{
    dialog::Prompter,
    error::{LaunchError, ToolStage},
    marker::ProjectMarker,
    models::ProjectState,
    project::{assets::remove_path, detect_game_folder},
    tools::Toolchain,
};

const PICK_TITLE: &str = "Select Folder to Create New Project";

impl<T: Toolchain, P: Prompter> Launcher<T, P> {
    /// Scaffold a new project from the template and install its dependencies.
    ///
    /// Steps run strictly in order and stop at the first failure. A project
    /// whose clone or install failed is left on disk as-is.
    pub async fn create_project(
        &self,
        project_name: Option<&str>,
    ) -> Result<ProjectState, LaunchError> {
        let destination = self
            .prompter()
            .pick_directory(PICK_TITLE)
            .await
            .ok_or(LaunchError::Cancelled)?;

        let project_name = validate_project_name(project_name)?;
        let project_root = destination.join(&project_name);
        if project_root.exists() {
            return Err(LaunchError::validation(
                "A folder with that name already exists.",
            ));
        }

        let _lease = self.guard().acquire(&project_root)?;
        fs::create_dir(&project_root)
            .map_err(|err| LaunchError::io("failed to create project folder", &project_root, err))?;

        self.progress("Cloning project template...").await;
        self.tools()
            .clone_template(&self.config().template_url, &project_root)
            .await
            .map_err(|err| LaunchError::tool(ToolStage::Clone, err))?;

        detach_from_template(&project_root)?;

        let marker = ProjectMarker::new(&self.config().launcher_tag, &project_name);
        marker.write(&project_root)?;
        info!(project = %project_name, root = %project_root.display(), "project marker written");

        self.progress("Installing dependencies...").await;
        self.tools()
            .install_dependencies(&project_root)
            .await
            .map_err(|err| LaunchError::tool(ToolStage::Install, err))?;

        self.prompter()
            .show_info(
                "Project Created",
                &format!("Project \"{project_name}\" created successfully!"),
                &format!("Location: {}", project_root.display()),
            )
            .await;

        let game = detect_game_folder(&project_root);
        Ok(ProjectState::new(project_name, &project_root, game))
    }
}

fn validate_project_name(project_name: Option<&str>) -> Result<String, LaunchError> {
    let name = project_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| LaunchError::validation("No project name provided."))?;

    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(LaunchError::validation(
            "Project name cannot contain path separators.",
        ));
    }
    Ok(name.to_string())
}

fn detach_from_template(project_root: &Path) -> Result<(), LaunchError> {
    let git_dir = project_root.join(".git");
    remove_path(&git_dir)
        .map_err(|err| LaunchError::io("failed to remove template history", &git_dir, err))
}
