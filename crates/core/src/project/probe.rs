use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::models::GameFolder;

/// Layout segments of `<root>/src/Project Files`.
const SOURCE_DIR: &str = "src";
const PROJECT_FILES_DIR: &str = "Project Files";

/// `<project_root>/src/Project Files`.
pub fn project_files_dir(project_root: impl AsRef<Path>) -> PathBuf {
    project_root
        .as_ref()
        .join(SOURCE_DIR)
        .join(PROJECT_FILES_DIR)
}

/// Where a game folder named `game_folder_name` lives inside a project.
pub fn game_destination(project_root: impl AsRef<Path>, game_folder_name: &str) -> PathBuf {
    project_files_dir(project_root).join(game_folder_name)
}

/// True when `dir` looks like an exported game, i.e. has `www/index.html`.
pub fn validate_game_asset_source(dir: impl AsRef<Path>) -> bool {
    has_entry_point(dir.as_ref())
}

/// Find the game folder embedded in a project.
///
/// Only the immediate children of `src/Project Files` are considered. When
/// several qualify, the lexically smallest folder name wins so the answer is
/// stable for an unchanged tree.
pub fn detect_game_folder(project_root: impl AsRef<Path>) -> Option<GameFolder> {
    let root = project_files_dir(project_root);
    if !root.is_dir() {
        return None;
    }

    let entries = match fs::read_dir(&root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("failed to list {}: {err}", root.display());
            return None;
        }
    };

    let mut folders: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .collect();
    folders.sort_by_key(|entry| entry.file_name());

    for entry in folders {
        let game_dir = entry.path();
        if has_entry_point(&game_dir) {
            let game_folder_name = entry.file_name().to_string_lossy().to_string();
            debug!(folder = %game_folder_name, "detected game folder");
            return Some(GameFolder {
                game_dir,
                game_folder_name,
            });
        }
    }

    None
}

fn has_entry_point(dir: &Path) -> bool {
    dir.join("www").join("index.html").is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn make_game(root: &Path, name: &str) -> Result<PathBuf> {
        let game = game_destination(root, name);
        fs::create_dir_all(game.join("www"))?;
        fs::write(game.join("www").join("index.html"), "<html></html>")?;
        Ok(game)
    }

    #[test]
    fn missing_project_files_is_absent() -> Result<()> {
        let temp = tempdir()?;
        assert_eq!(detect_game_folder(temp.path()), None);

        fs::create_dir_all(temp.path().join("src"))?;
        assert_eq!(detect_game_folder(temp.path()), None);
        Ok(())
    }

    #[test]
    fn detects_single_game() -> Result<()> {
        let temp = tempdir()?;
        let game_dir = make_game(temp.path(), "X")?;

        let found = detect_game_folder(temp.path()).expect("game folder");
        assert_eq!(found.game_folder_name, "X");
        assert_eq!(found.game_dir, game_dir);
        Ok(())
    }

    #[test]
    fn skips_folders_without_entry_point() -> Result<()> {
        let temp = tempdir()?;
        fs::create_dir_all(game_destination(temp.path(), "AAA").join("www"))?;
        fs::write(project_files_dir(temp.path()).join("notes.txt"), "loose file")?;
        make_game(temp.path(), "Real")?;

        let found = detect_game_folder(temp.path()).expect("game folder");
        assert_eq!(found.game_folder_name, "Real");
        Ok(())
    }

    #[test]
    fn multiple_candidates_resolve_lexically_and_stably() -> Result<()> {
        let temp = tempdir()?;
        make_game(temp.path(), "Zeta")?;
        make_game(temp.path(), "Alpha")?;
        make_game(temp.path(), "Mid")?;

        let first = detect_game_folder(temp.path()).expect("game folder");
        assert_eq!(first.game_folder_name, "Alpha");
        for _ in 0..5 {
            assert_eq!(detect_game_folder(temp.path()), Some(first.clone()));
        }
        Ok(())
    }

    #[test]
    fn does_not_recurse_past_one_level() -> Result<()> {
        let temp = tempdir()?;
        let nested = game_destination(temp.path(), "Outer").join("Inner");
        fs::create_dir_all(nested.join("www"))?;
        fs::write(nested.join("www").join("index.html"), "")?;
        assert_eq!(detect_game_folder(temp.path()), None);
        Ok(())
    }

    #[test]
    fn validates_asset_source() -> Result<()> {
        let temp = tempdir()?;
        assert!(!validate_game_asset_source(temp.path()));

        fs::create_dir_all(temp.path().join("www"))?;
        assert!(!validate_game_asset_source(temp.path()));

        fs::write(temp.path().join("www").join("index.html"), "")?;
        assert!(validate_game_asset_source(temp.path()));
        Ok(())
    }
}
