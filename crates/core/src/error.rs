//! Workflow error taxonomy.

use std::{io, path::PathBuf};

use crate::{marker::MarkerError, tools::ToolError};

/// Errors that end a launcher workflow.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The user dismissed a picker; reported nowhere.
    #[error("cancelled")]
    Cancelled,

    /// Recoverable input problem shown to the user.
    #[error("{0}")]
    Validation(String),

    /// Another workflow currently owns this project root.
    #[error("Another operation is already running for {}.", .0.display())]
    Busy(PathBuf),

    /// An external tool failed; the message is its own diagnostic output.
    #[error("{source}")]
    Tool {
        /// Which step invoked the tool.
        stage: ToolStage,
        /// Tool failure.
        #[source]
        source: ToolError,
    },

    /// Reading or writing the project marker failed.
    #[error(transparent)]
    Marker(#[from] MarkerError),

    /// Filesystem failure outside the marker store.
    #[error("{context} {}: {source}", .path.display())]
    Io {
        /// What was being attempted.
        context: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The build succeeded but left no installer behind.
    #[error("No installer found in {dist_dir} directory.")]
    NoInstaller {
        /// Build output directory as configured.
        dist_dir: String,
    },
}

/// Workflow step that ran an external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStage {
    /// Template clone.
    Clone,
    /// Dependency install.
    Install,
    /// Installer build.
    Build,
}

impl ToolStage {
    /// Dialog title used when this step fails.
    pub fn title(self) -> &'static str {
        match self {
            Self::Clone => "Clone Error",
            Self::Install => "Install Error",
            Self::Build => "Build Error",
        }
    }
}

impl LaunchError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn tool(stage: ToolStage, source: ToolError) -> Self {
        Self::Tool { stage, source }
    }

    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Whether the workflow ended because the user backed out.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
