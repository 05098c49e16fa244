#![warn(clippy::all, missing_docs)]

//! Core domain logic for the RMMVZ project launcher.
//!
//! This crate hosts the project marker store, game-folder probing,
//! external tool invocation and the create/open/import/build workflows
//! used by the terminal UI and any future frontends.

pub mod config;
pub mod dialog;
pub mod error;
pub mod events;
pub mod marker;
pub mod models;
pub mod project;
pub mod tools;
pub mod workflow;

pub use config::AppConfig;
pub use dialog::{ChannelPrompter, DialogRequest, Prompter, RetryChoice};
pub use error::{LaunchError, ToolStage};
pub use events::{LauncherCommand, LauncherEvent, StartChoice};
pub use marker::{MarkerError, ProjectMarker};
pub use models::{BuildStatus, GameFolder, ImportStatus, ProjectState};
pub use tools::{BuildOutput, SystemToolchain, ToolError, Toolchain};
pub use workflow::Launcher;
