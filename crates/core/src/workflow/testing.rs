//! Fakes for exercising workflows without processes or a screen.

use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::Launcher;
use crate::{
    config::AppConfig,
    dialog::{Prompter, RetryChoice},
    events::LauncherEvent,
    tools::{BuildOutput, ToolError, Toolchain},
};

/// Toolchain that fakes clone/install/build by touching the filesystem.
#[derive(Debug, Default)]
pub(crate) struct FakeToolchain {
    /// Files (relative path, contents) the "template" contains.
    pub template_files: Vec<(String, String)>,
    pub clone_failure: Option<String>,
    pub install_failure: Option<String>,
    /// Messages replayed by the build, in order.
    pub build_output: Vec<BuildOutput>,
    /// File (relative to the project root) the build writes before output is replayed.
    pub build_artifact: Option<String>,
    /// Every toolchain call, in order.
    pub calls: Mutex<Vec<String>>,
}

impl FakeToolchain {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

impl Toolchain for FakeToolchain {
    async fn clone_template(&self, url: &str, dest: &Path) -> Result<(), ToolError> {
        self.record(format!("clone {url}"));
        if let Some(diagnostic) = &self.clone_failure {
            return Err(ToolError::Failed {
                program: "git".to_string(),
                code: Some(128),
                diagnostic: diagnostic.clone(),
            });
        }
        let mut files = self.template_files.clone();
        files.push((".git/HEAD".to_string(), "ref: refs/heads/main".to_string()));
        for (relative, contents) in files {
            let path = dest.join(relative);
            fs::create_dir_all(path.parent().expect("template file has parent")).unwrap();
            fs::write(path, contents).unwrap();
        }
        Ok(())
    }

    async fn install_dependencies(&self, project_root: &Path) -> Result<(), ToolError> {
        self.record(format!("install {}", project_root.display()));
        match &self.install_failure {
            Some(diagnostic) => Err(ToolError::Failed {
                program: "npm".to_string(),
                code: Some(1),
                diagnostic: diagnostic.clone(),
            }),
            None => Ok(()),
        }
    }

    fn spawn_build(&self, project_root: &Path) -> Result<mpsc::Receiver<BuildOutput>, ToolError> {
        self.record(format!("build {}", project_root.display()));
        if let Some(relative) = &self.build_artifact {
            let path = project_root.join(relative);
            fs::create_dir_all(path.parent().expect("artifact has parent")).unwrap();
            fs::write(path, "installer bytes").unwrap();
        }
        let (tx, rx) = mpsc::channel(self.build_output.len() + 1);
        for message in &self.build_output {
            tx.try_send(message.clone()).unwrap();
        }
        Ok(rx)
    }
}

/// Something a [`Scripted`] prompter displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Shown {
    Error { title: String, message: String },
    Info { title: String, message: String, detail: String },
    Retry { title: String, message: String },
}

/// Prompter that answers from pre-recorded queues; empty queues mean cancel.
#[derive(Debug, Default)]
pub(crate) struct Scripted {
    directories: Mutex<VecDeque<Option<PathBuf>>>,
    save_paths: Mutex<VecDeque<Option<PathBuf>>>,
    retries: Mutex<VecDeque<RetryChoice>>,
    shown: Mutex<Vec<Shown>>,
}

impl Scripted {
    pub fn directory(self, answer: Option<PathBuf>) -> Self {
        self.directories.lock().push_back(answer);
        self
    }

    pub fn save_path(self, answer: Option<PathBuf>) -> Self {
        self.save_paths.lock().push_back(answer);
        self
    }

    pub fn retry(self, answer: RetryChoice) -> Self {
        self.retries.lock().push_back(answer);
        self
    }

    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().clone()
    }
}

impl Prompter for Scripted {
    async fn pick_directory(&self, _title: &str) -> Option<PathBuf> {
        self.directories.lock().pop_front().flatten()
    }

    async fn pick_save_path(&self, _title: &str, _default_name: &str) -> Option<PathBuf> {
        self.save_paths.lock().pop_front().flatten()
    }

    async fn ask_retry(&self, title: &str, message: &str) -> RetryChoice {
        self.shown.lock().push(Shown::Retry {
            title: title.to_string(),
            message: message.to_string(),
        });
        self.retries.lock().pop_front().unwrap_or(RetryChoice::Cancel)
    }

    async fn show_error(&self, title: &str, message: &str) {
        self.shown.lock().push(Shown::Error {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    async fn show_info(&self, title: &str, message: &str, detail: &str) {
        self.shown.lock().push(Shown::Info {
            title: title.to_string(),
            message: message.to_string(),
            detail: detail.to_string(),
        });
    }
}

pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        template_url: "https://example.com/template.git".to_string(),
        dist_dir: "dist".to_string(),
        installer_extension: "exe".to_string(),
        ..AppConfig::default()
    }
}

pub(crate) fn launcher(
    tools: FakeToolchain,
    prompter: Scripted,
) -> (Launcher<FakeToolchain, Scripted>, mpsc::Receiver<LauncherEvent>) {
    let (tx, rx) = mpsc::channel(256);
    (Launcher::new(test_config(), tools, prompter, tx), rx)
}

pub(crate) fn drain(events: &mut mpsc::Receiver<LauncherEvent>) -> Vec<LauncherEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
