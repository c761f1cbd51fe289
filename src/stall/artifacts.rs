//! Lifetime of the temporary files one run creates.
//!
//! A [`TempArtifacts`] handle is acquired per run. Every temp file is
//! registered before the pass that writes it starts, and everything registered
//! is removed when the handle drops, whichever way the run ends. The handle
//! also holds `<output>.lock` so two runs cannot share temp names.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::json;

use super::error::{StallError, StallResult};
use super::logging::log_event_with;
use super::passes::TempKind;
use crate::ui::prelude::Level;

pub const DEFAULT_TEMP_EXTENSION: &str = "nut";

/// `<output>_<kind>.<ext>`, appended to the full output file name.
pub fn temp_path(output: &Path, kind: TempKind, extension: &str) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(format!("_{}.{}", kind.suffix(), extension));
    PathBuf::from(name)
}

fn lock_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

#[derive(Debug)]
pub struct TempArtifacts {
    output: PathBuf,
    extension: String,
    registered: HashMap<TempKind, PathBuf>,
    order: Vec<TempKind>,
    lock: Option<PathBuf>,
    owns_files: bool,
}

impl TempArtifacts {
    /// Name-only handle for dry runs: no lock, no file is ever touched.
    pub fn planned(output: &Path, extension: &str) -> Self {
        Self {
            output: output.to_path_buf(),
            extension: extension.to_string(),
            registered: HashMap::new(),
            order: Vec::new(),
            lock: None,
            owns_files: false,
        }
    }

    /// Take the per-output lock and return a handle that cleans up on drop.
    pub fn acquire(output: &Path, extension: &str) -> StallResult<Self> {
        let lock = lock_path(output);
        match OpenOptions::new().write(true).create_new(true).open(&lock) {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(StallError::OutputInUse(output.to_path_buf()));
            }
            Err(err) => {
                return Err(StallError::io(
                    format!("Failed to create lock file {}", lock.display()),
                    err,
                ));
            }
        }

        let mut artifacts = Self::planned(output, extension);
        artifacts.lock = Some(lock);
        artifacts.owns_files = true;
        Ok(artifacts)
    }

    pub fn path_for(&self, kind: TempKind) -> PathBuf {
        temp_path(&self.output, kind, &self.extension)
    }

    /// Declare that a pass is about to write `kind`; returns its path.
    pub fn register(&mut self, kind: TempKind) -> PathBuf {
        let path = self.path_for(kind);
        if self.registered.insert(kind, path.clone()).is_none() {
            self.order.push(kind);
        }
        path
    }

    /// Path of an artifact an earlier pass produced.
    pub fn resolve(&self, kind: TempKind) -> StallResult<PathBuf> {
        self.registered.get(&kind).cloned().ok_or_else(|| {
            StallError::InvalidTempKind(format!(
                "{} artifact consumed before any pass produced it",
                kind.suffix()
            ))
        })
    }

    fn cleanup(&mut self) {
        if !self.owns_files {
            return;
        }

        for kind in self.order.drain(..) {
            let Some(path) = self.registered.remove(&kind) else {
                continue;
            };
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => log_event_with(
                    Level::Warn,
                    "stall.cleanup.missing",
                    format!("Temporary file {} not found", path.display()),
                    json!({ "path": path.display().to_string() }),
                ),
                Err(err) => log_event_with(
                    Level::Warn,
                    "stall.cleanup.failed",
                    format!("Failed to remove temporary file {}: {err}", path.display()),
                    json!({ "path": path.display().to_string() }),
                ),
            }
        }

        if let Some(lock) = self.lock.take()
            && let Err(err) = fs::remove_file(&lock)
        {
            log_event_with(
                Level::Warn,
                "stall.cleanup.lock",
                format!("Failed to remove lock file {}: {err}", lock.display()),
                json!({ "path": lock.display().to_string() }),
            );
        }
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_names_append_to_output_name() {
        let path = temp_path(Path::new("/tmp/out.mp4"), TempKind::Skipping, "nut");
        assert_eq!(path, PathBuf::from("/tmp/out.mp4_skipping.nut"));
    }

    #[test]
    fn resolving_unproduced_artifact_fails() {
        let artifacts = TempArtifacts::planned(Path::new("out.mkv"), "nut");
        assert!(matches!(
            artifacts.resolve(TempKind::Audio),
            Err(StallError::InvalidTempKind(_))
        ));
    }

    #[test]
    fn planned_handle_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mkv");
        {
            let mut artifacts = TempArtifacts::planned(&output, "nut");
            let video = artifacts.register(TempKind::Video);
            assert_eq!(artifacts.resolve(TempKind::Video).unwrap(), video);
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn drop_removes_registered_files_and_lock() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mkv");
        {
            let mut artifacts = TempArtifacts::acquire(&output, "nut").unwrap();
            assert!(lock_path(&output).exists());
            let video = artifacts.register(TempKind::Video);
            fs::write(&video, b"frames").unwrap();
            // registered but never written: only a warning at cleanup
            artifacts.register(TempKind::Audio);
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn second_run_on_same_output_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mkv");
        let _first = TempArtifacts::acquire(&output, "nut").unwrap();
        assert!(matches!(
            TempArtifacts::acquire(&output, "nut"),
            Err(StallError::OutputInUse(_))
        ));
    }
}
