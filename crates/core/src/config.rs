//! Launcher configuration, layered from defaults, a JSON file and the environment.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory under the user's config dir holding launcher settings.
pub const CONFIG_DIR_NAME: &str = "rmmvz-launcher";
/// File name of the persisted configuration.
pub const CONFIG_FILE_NAME: &str = "config.json";
/// Prefix for environment overrides, e.g. `RMMVZ_TEMPLATE_URL`.
pub const ENV_PREFIX: &str = "RMMVZ";

const DEFAULT_TEMPLATE_URL: &str =
    "https://github.com/ReaperBecca/Game-Window---RMMVZ-Launcher---Free-Tier";
const DEFAULT_LAUNCHER_TAG: &str = "RMMVZ-Launcher-Free-Tier";

/// Runtime settings for the launcher workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Git URL of the project template cloned by the create workflow.
    pub template_url: String,
    /// Tag written into every project marker.
    pub launcher_tag: String,
    /// Version-control client executable.
    pub git_program: String,
    /// Package manager executable used for install and build.
    pub package_manager: String,
    /// Arguments for the dependency install step.
    pub install_args: Vec<String>,
    /// Arguments for the platform installer build.
    pub build_args: Vec<String>,
    /// Output directory of the build, relative to the project root.
    pub dist_dir: String,
    /// File extension (without dot) of the produced installer.
    pub installer_extension: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let (build_script, installer_extension) = platform_build_target();
        Self {
            template_url: DEFAULT_TEMPLATE_URL.to_string(),
            launcher_tag: DEFAULT_LAUNCHER_TAG.to_string(),
            git_program: "git".to_string(),
            package_manager: default_package_manager().to_string(),
            install_args: vec!["install".to_string()],
            build_args: vec!["run".to_string(), build_script.to_string()],
            dist_dir: "dist".to_string(),
            installer_extension: installer_extension.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration layering defaults, `path` (if present) and `RMMVZ_*` variables.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults =
            Config::try_from(&AppConfig::default()).context("failed to encode default config")?;
        let settings = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(" ")
                    .with_list_parse_key("install_args")
                    .with_list_parse_key("build_args")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to load config {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Default file name offered when saving an installer for `project_name`.
    pub fn installer_file_name(&self, project_name: &str) -> String {
        format!("{project_name}-installer.{}", self.installer_extension)
    }
}

/// Location of the configuration file under the user's config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Write a default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default config")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    info!("wrote default config to {}", path.display());
    Ok(())
}

fn platform_build_target() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("build:win", "exe")
    } else if cfg!(target_os = "macos") {
        ("build:mac", "dmg")
    } else {
        ("build:linux", "AppImage")
    }
}

fn default_package_manager() -> &'static str {
    if cfg!(target_os = "windows") {
        "npm.cmd"
    } else {
        "npm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.json"))?;
        assert_eq!(config, AppConfig::default());
        Ok(())
    }

    #[test]
    fn file_overrides_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{ "template_url": "https://example.com/template.git", "dist_dir": "out" }"#,
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.template_url, "https://example.com/template.git");
        assert_eq!(config.dist_dir, "out");
        assert_eq!(config.launcher_tag, DEFAULT_LAUNCHER_TAG);
        Ok(())
    }

    #[test]
    fn default_file_is_written_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        write_default_config(&path)?;
        let written: AppConfig = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(written, AppConfig::default());

        fs::write(&path, r#"{ "dist_dir": "custom" }"#)?;
        write_default_config(&path)?;
        assert!(fs::read_to_string(&path)?.contains("custom"));
        Ok(())
    }

    #[test]
    fn installer_name_uses_extension() {
        let config = AppConfig {
            installer_extension: "exe".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.installer_file_name("MyGame"), "MyGame-installer.exe");
    }
}
