use std::{
    path::Path,
    process::{Output, Stdio},
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Command,
    sync::mpsc,
};
use tracing::{debug, error, info, warn};

use super::{BuildOutput, ToolError, Toolchain};
use crate::config::AppConfig;

const BUILD_CHANNEL_CAPACITY: usize = 64;
const READ_CHUNK: usize = 4096;

/// Runs git and the package manager as child processes.
#[derive(Debug, Clone)]
pub struct SystemToolchain {
    git_program: String,
    package_manager: String,
    install_args: Vec<String>,
    build_args: Vec<String>,
}

impl SystemToolchain {
    /// Create a toolchain using the programs named in `config`.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            git_program: config.git_program.clone(),
            package_manager: config.package_manager.clone(),
            install_args: config.install_args.clone(),
            build_args: config.build_args.clone(),
        }
    }

    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<Output, ToolError> {
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }
        command.output().await.map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })
    }
}

impl Toolchain for SystemToolchain {
    async fn clone_template(&self, url: &str, dest: &Path) -> Result<(), ToolError> {
        info!("cloning {url} into {}", dest.display());
        let args = vec![
            "clone".to_string(),
            url.to_string(),
            dest.display().to_string(),
        ];
        let output = self.run(&self.git_program, &args, None).await?;
        check_output(&self.git_program, "clone", output)
    }

    async fn install_dependencies(&self, project_root: &Path) -> Result<(), ToolError> {
        info!(
            "running {} {} in {}",
            self.package_manager,
            self.install_args.join(" "),
            project_root.display()
        );
        let output = self
            .run(&self.package_manager, &self.install_args, Some(project_root))
            .await?;
        check_output(&self.package_manager, "install", output)
    }

    fn spawn_build(&self, project_root: &Path) -> Result<mpsc::Receiver<BuildOutput>, ToolError> {
        info!(
            "running {} {} in {}",
            self.package_manager,
            self.build_args.join(" "),
            project_root.display()
        );
        let mut child = Command::new(&self.package_manager)
            .args(&self.build_args)
            .current_dir(project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.package_manager.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (tx, rx) = mpsc::channel(BUILD_CHANNEL_CAPACITY);
        let root = project_root.to_path_buf();

        tokio::spawn(async move {
            tokio::join!(
                forward_chunks(stdout, tx.clone(), BuildOutput::Stdout),
                forward_chunks(stderr, tx.clone(), BuildOutput::Stderr),
            );
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(err) => {
                    error!("failed to wait for build in {}: {err}", root.display());
                    None
                }
            };
            info!(?code, "build finished in {}", root.display());
            let _ = tx.send(BuildOutput::Exited(code)).await;
        });

        Ok(rx)
    }
}

async fn forward_chunks<R>(
    reader: Option<R>,
    tx: mpsc::Sender<BuildOutput>,
    wrap: fn(String) -> BuildOutput,
) where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                debug!(bytes = n, "build output chunk");
                // Keep draining after the consumer leaves so the child never blocks on a full pipe.
                let _ = tx.send(wrap(chunk)).await;
            }
            Err(err) => {
                warn!("failed to read build output: {err}");
                break;
            }
        }
    }
}

fn check_output(program: &str, action: &str, output: Output) -> Result<(), ToolError> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let diagnostic = if stderr.is_empty() {
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            format!("{program} {action} exited with {}", output.status)
        } else {
            stdout
        }
    } else {
        stderr
    };

    Err(ToolError::Failed {
        program: program.to_string(),
        code: output.status.code(),
        diagnostic,
    })
}
