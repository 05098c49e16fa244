use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::info;

use super::Launcher;
use crate::{
    dialog::Prompter,
    error::LaunchError,
    events::LauncherEvent,
    marker::base_name,
    models::{ImportStatus, ProjectState},
    project::{detect_game_folder, game_destination, replace_tree, validate_game_asset_source},
    tools::Toolchain,
};

const PICK_TITLE: &str = "Select RPG Maker Game Folder";
const INVALID_SOURCE: &str = "The selected folder does not contain www/index.html. \
     Please select a valid RPG Maker MV/MZ exported game folder.";

impl<T: Toolchain, P: Prompter> Launcher<T, P> {
    /// Copy an exported game into `project_root/src/Project Files/<name>`.
    ///
    /// An existing folder of the same name is replaced, never merged. On
    /// success an import-status event is emitted and the refreshed project
    /// state returned.
    pub async fn import_game(
        &self,
        project_name: &str,
        project_root: &Path,
    ) -> Result<ProjectState, LaunchError> {
        let source = self
            .prompter()
            .pick_directory(PICK_TITLE)
            .await
            .ok_or(LaunchError::Cancelled)?;

        if !validate_game_asset_source(&source) {
            return Err(LaunchError::validation(INVALID_SOURCE));
        }

        let game_folder_name = base_name(&source);
        let destination = game_destination(project_root, &game_folder_name);
        if overlaps(&source, &destination) {
            return Err(LaunchError::validation(
                "The selected game folder is already part of this project.",
            ));
        }

        let _lease = self.guard().acquire(project_root)?;
        info!(
            project = %project_name,
            "importing {} into {}",
            source.display(),
            destination.display()
        );

        let copy_dest = destination.clone();
        tokio::task::spawn_blocking(move || replace_tree(&source, &copy_dest))
            .await
            .map_err(io::Error::other)
            .and_then(|result| result)
            .map_err(|err| LaunchError::io("failed to copy game into", &destination, err))?;

        self.emit(LauncherEvent::ImportStatus {
            project_name: project_name.to_string(),
            status: ImportStatus::Success,
            message: format!("Game imported successfully to {}", destination.display()),
        })
        .await;

        let game = detect_game_folder(project_root);
        Ok(ProjectState::new(project_name, project_root, game))
    }
}

// Copying a folder onto itself, or into its own subtree, would destroy or
// endlessly grow the source.
fn overlaps(source: &Path, destination: &Path) -> bool {
    let source = canonical(source);
    let destination = canonical(destination);
    destination.starts_with(&source) || source.starts_with(&destination)
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| {
        match (path.parent().map(canonical), path.file_name()) {
            (Some(parent), Some(name)) => parent.join(name),
            _ => path.to_path_buf(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::LauncherCommand,
        project::project_files_dir,
        workflow::testing::{drain, launcher, FakeToolchain, Scripted, Shown},
    };
    use tempfile::tempdir;

    fn exported_game(parent: &Path, name: &str, file: &str) -> anyhow::Result<PathBuf> {
        let game = parent.join(name);
        fs::create_dir_all(game.join("www"))?;
        fs::write(game.join("www").join("index.html"), "<html></html>")?;
        fs::write(game.join("www").join(file), file)?;
        Ok(game)
    }

    fn import_command(root: &Path) -> LauncherCommand {
        LauncherCommand::ImportGame {
            project_name: "MyGame".to_string(),
            project_root: root.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn imports_game_and_refreshes_project() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("project");
        fs::create_dir_all(&root)?;
        let source = exported_game(temp.path(), "Quest", "data.json")?;

        let prompter = Scripted::default().directory(Some(source));
        let (launcher, mut events) = launcher(FakeToolchain::default(), prompter);
        launcher.handle(import_command(&root)).await;

        let dest = game_destination(&root, "Quest");
        assert!(dest.join("www").join("data.json").is_file());
        assert_eq!(
            drain(&mut events),
            vec![
                LauncherEvent::ImportStatus {
                    project_name: "MyGame".to_string(),
                    status: ImportStatus::Success,
                    message: format!("Game imported successfully to {}", dest.display()),
                },
                LauncherEvent::OpenProject(ProjectState {
                    project_name: "MyGame".to_string(),
                    project_root: root.clone(),
                    has_game: true,
                    game_folder_name: Some("Quest".to_string()),
                }),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn invalid_source_mutates_nothing() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("project");
        fs::create_dir_all(&root)?;
        let source = temp.path().join("NotAGame");
        fs::create_dir_all(&source)?;
        fs::write(source.join("readme.txt"), "nope")?;

        let prompter = Scripted::default().directory(Some(source));
        let (launcher, mut events) = launcher(FakeToolchain::default(), prompter);
        launcher.handle(import_command(&root)).await;

        assert!(!project_files_dir(&root).exists());
        assert!(drain(&mut events).is_empty());
        assert_eq!(
            launcher.prompter().shown(),
            vec![Shown::Error {
                title: "Invalid Game Folder".to_string(),
                message: INVALID_SOURCE.to_string(),
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn reimport_replaces_instead_of_merging() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("project");
        fs::create_dir_all(&root)?;
        let first = exported_game(&temp.path().join("v1"), "Quest", "old.js")?;
        let second = exported_game(&temp.path().join("v2"), "Quest", "new.js")?;

        let prompter = Scripted::default()
            .directory(Some(first))
            .directory(Some(second));
        let (launcher, _events) = launcher(FakeToolchain::default(), prompter);
        launcher.import_game("MyGame", &root).await?;
        launcher.import_game("MyGame", &root).await?;

        let www = game_destination(&root, "Quest").join("www");
        assert!(!www.join("old.js").exists());
        assert!(www.join("new.js").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn importing_the_projects_own_game_is_rejected() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("project");
        let existing = exported_game(&project_files_dir(&root), "Quest", "keep.js")?;

        let prompter = Scripted::default().directory(Some(existing.clone()));
        let (launcher, _events) = launcher(FakeToolchain::default(), prompter);
        let err = launcher.import_game("MyGame", &root).await.unwrap_err();

        assert!(matches!(err, LaunchError::Validation(_)));
        assert!(existing.join("www").join("keep.js").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn busy_project_is_not_touched() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("project");
        fs::create_dir_all(&root)?;
        let source = exported_game(temp.path(), "Quest", "data.json")?;

        let prompter = Scripted::default().directory(Some(source));
        let (launcher, mut events) = launcher(FakeToolchain::default(), prompter);
        let _held = launcher.guard().acquire(&root)?;
        launcher.handle(import_command(&root)).await;

        assert!(!project_files_dir(&root).exists());
        assert!(drain(&mut events).is_empty());
        assert!(matches!(
            launcher.prompter().shown().as_slice(),
            [Shown::Error { title, .. }] if title == "Project Busy"
        ));
        Ok(())
    }
}
