//! Project marker stored at the root of every launcher-managed project.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

/// File name of the marker; its presence alone makes a directory a project.
pub const MARKER_FILE_NAME: &str = ".rmmvzlauncher.json";

/// Errors raised when reading or writing a project marker.
#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    /// No marker file exists at the expected location.
    #[error("no project marker at {}", .0.display())]
    NotFound(PathBuf),
    /// The marker exists but is not JSON.
    #[error("project marker {} is corrupt: {source}", .path.display())]
    Corrupt {
        /// Marker file path.
        path: PathBuf,
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },
    /// Filesystem failure while accessing the marker.
    #[error("failed to access project marker {}: {source}", .path.display())]
    Io {
        /// Marker file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Identifier record associating a directory with this launcher.
///
/// Only the file's presence identifies a project, so fields of the wrong
/// type are read as absent instead of failing the whole marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMarker {
    /// Tag of the tool that created the project.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub launcher: String,
    /// Creation timestamp as written, normally RFC 3339.
    #[serde(default, deserialize_with = "string_only")]
    pub created: Option<String>,
    /// Logical project name chosen by the user.
    #[serde(default, deserialize_with = "string_only")]
    pub project_name: Option<String>,
}

impl ProjectMarker {
    /// Build a fresh marker stamped with the current time.
    pub fn new(launcher: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            launcher: launcher.into(),
            created: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            project_name: Some(project_name.into()),
        }
    }

    /// Creation time, when `created` holds an RFC 3339 timestamp.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let created = self.created.as_deref()?;
        DateTime::parse_from_rfc3339(created)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }

    /// Project name recorded in the marker, or the base name of `project_root`.
    pub fn display_name(&self, project_root: &Path) -> String {
        self.project_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| base_name(project_root))
    }

    /// Read the marker stored at `project_root`.
    pub fn read(project_root: impl AsRef<Path>) -> Result<Self, MarkerError> {
        let path = marker_path(project_root);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(MarkerError::NotFound(path));
            }
            Err(source) => return Err(MarkerError::Io { path, source }),
        };
        let value: Value = serde_json::from_str(&contents)
            .map_err(|source| MarkerError::Corrupt { path: path.clone(), source })?;
        if !value.is_object() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|source| MarkerError::Corrupt { path, source })
    }

    /// Atomically persist the marker into an existing `project_root`.
    pub fn write(&self, project_root: impl AsRef<Path>) -> Result<PathBuf, MarkerError> {
        let project_root = project_root.as_ref();
        let path = marker_path(project_root);
        let io_err = |source: io::Error| MarkerError::Io {
            path: path.clone(),
            source,
        };

        let serialized = serde_json::to_vec_pretty(self)
            .map_err(|source| io_err(io::Error::new(io::ErrorKind::InvalidData, source)))?;
        // The temp file lives next to the target so the rename stays on one filesystem.
        let mut staged = NamedTempFile::new_in(project_root).map_err(io_err)?;
        staged.write_all(&serialized).map_err(io_err)?;
        staged.as_file().sync_all().map_err(io_err)?;
        staged.persist(&path).map_err(|err| io_err(err.error))?;
        Ok(path)
    }
}

/// Path of the marker file inside `project_root`.
pub fn marker_path(project_root: impl AsRef<Path>) -> PathBuf {
    project_root.as_ref().join(MARKER_FILE_NAME)
}

fn string_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    string_only(deserializer).map(Option::unwrap_or_default)
}

pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn marker_round_trip() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let marker = ProjectMarker::new("RMMVZ-Launcher-Free-Tier", "Foo");
        let path = marker.write(dir.path())?;
        assert_eq!(path, dir.path().join(MARKER_FILE_NAME));

        let read = ProjectMarker::read(dir.path())?;
        assert_eq!(read.project_name.as_deref(), Some("Foo"));
        assert_eq!(read.launcher, "RMMVZ-Launcher-Free-Tier");
        assert_eq!(read, marker);
        Ok(())
    }

    #[test]
    fn marker_uses_camel_case_keys() -> anyhow::Result<()> {
        let dir = tempdir()?;
        ProjectMarker::new("tag", "Foo").write(dir.path())?;
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(marker_path(dir.path()))?)?;
        assert_eq!(raw["projectName"], "Foo");
        assert_eq!(raw["launcher"], "tag");
        assert!(raw["created"].is_string());
        Ok(())
    }

    #[test]
    fn missing_marker_is_not_found() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let err = ProjectMarker::read(dir.path()).unwrap_err();
        assert!(matches!(err, MarkerError::NotFound(_)));
        Ok(())
    }

    #[test]
    fn garbage_marker_is_corrupt() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(marker_path(dir.path()), "not json at all")?;
        let err = ProjectMarker::read(dir.path()).unwrap_err();
        assert!(matches!(err, MarkerError::Corrupt { .. }));
        Ok(())
    }

    #[test]
    fn foreign_marker_falls_back_to_directory_name() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("Legacy Project");
        fs::create_dir_all(&root)?;
        fs::write(marker_path(&root), r#"{ "launcher": "older-build" }"#)?;

        let marker = ProjectMarker::read(&root)?;
        assert_eq!(marker.project_name, None);
        assert_eq!(marker.display_name(&root), "Legacy Project");
        Ok(())
    }

    #[test]
    fn loosely_typed_fields_do_not_reject_the_project() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("Old Quest");
        fs::create_dir_all(&root)?;

        fs::write(
            marker_path(&root),
            r#"{"launcher":"RMMVZ-Launcher-Free-Tier","created":"2024-05-01","projectName":"Foo"}"#,
        )?;
        let marker = ProjectMarker::read(&root)?;
        assert_eq!(marker.created.as_deref(), Some("2024-05-01"));
        assert_eq!(marker.created_at(), None);
        assert_eq!(marker.display_name(&root), "Foo");

        fs::write(
            marker_path(&root),
            r#"{"launcher":7,"created":1714521600000,"projectName":["Foo"],"extra":true}"#,
        )?;
        let marker = ProjectMarker::read(&root)?;
        assert_eq!(marker, ProjectMarker::default());
        assert_eq!(marker.display_name(&root), "Old Quest");

        fs::write(marker_path(&root), "[]")?;
        assert_eq!(ProjectMarker::read(&root)?, ProjectMarker::default());
        Ok(())
    }

    #[test]
    fn fresh_marker_timestamp_parses() {
        let marker = ProjectMarker::new("tag", "Foo");
        assert!(marker.created_at().is_some());
    }

    #[test]
    fn write_into_missing_root_fails() {
        let dir = tempdir().unwrap();
        let err = ProjectMarker::new("tag", "Foo")
            .write(dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, MarkerError::Io { .. }));
    }
}
