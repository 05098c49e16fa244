//! External tools the workflows drive: version control and the package manager.

use std::{future::Future, path::Path};

use tokio::sync::mpsc;

/// Process-backed implementation of [`Toolchain`].
pub mod system;

pub use system::SystemToolchain;

/// Failure of an external tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The program ran and reported failure; `diagnostic` is its raw output.
    #[error("{diagnostic}")]
    Failed {
        /// Program name.
        program: String,
        /// Exit code, when the process exited normally.
        code: Option<i32>,
        /// Tool output explaining the failure.
        diagnostic: String,
    },
}

/// One message from a running build, delivered in order to a single consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutput {
    /// Chunk read from standard output.
    Stdout(String),
    /// Chunk read from standard error.
    Stderr(String),
    /// Output is finished and the process has exited; `None` means killed by a signal.
    Exited(Option<i32>),
}

/// The version-control and package-manager operations the workflows need.
pub trait Toolchain: Send + Sync + 'static {
    /// Clone `url` into the existing, empty directory `dest`.
    fn clone_template(
        &self,
        url: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<(), ToolError>> + Send;

    /// Install dependencies with `project_root` as working directory.
    fn install_dependencies(
        &self,
        project_root: &Path,
    ) -> impl Future<Output = Result<(), ToolError>> + Send;

    /// Start the installer build in `project_root`.
    ///
    /// Output chunks arrive on the returned channel as they are read, followed
    /// by exactly one [`BuildOutput::Exited`].
    fn spawn_build(&self, project_root: &Path) -> Result<mpsc::Receiver<BuildOutput>, ToolError>;
}
