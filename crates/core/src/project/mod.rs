//! Project directory layout: game-folder probing and asset operations.

/// Recursive copy, replacement and installer lookup helpers.
pub mod assets;
/// Read-only checks over a project tree.
pub mod probe;

pub use assets::{find_installer, replace_tree};
pub use probe::{detect_game_folder, game_destination, project_files_dir, validate_game_asset_source};
