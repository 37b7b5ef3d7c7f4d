//! Filesystem repository for the scaler and classifier artifacts.
//!
//! TODO: Verify a sidecar checksum before parsing so truncated copies fail fast.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::common::config::AppCfg;
use crate::common::error::{ServeError, ServeResult};

use super::domain::{ArtifactRepo, Classifier, Scaler};

/// Reads both artifacts from local paths.
#[derive(Clone, Debug)]
pub struct FsArtifactRepo {
    model_path: PathBuf,
    scaler_path: PathBuf,
}

impl FsArtifactRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::with_paths(&cfg.model_path, &cfg.scaler_path)
    }

    pub fn with_paths(model_path: impl Into<PathBuf>, scaler_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            scaler_path: scaler_path.into(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn scaler_path(&self) -> &Path {
        &self.scaler_path
    }
}

fn read_artifact(path: &Path) -> ServeResult<String> {
    fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::InvalidData => {
            ServeError::artifact_corrupt(format!("{}: not valid UTF-8", path.display()))
        }
        _ => ServeError::artifact_missing(format!("{}: {err}", path.display())),
    })
}

fn with_path(path: &Path, err: ServeError) -> ServeError {
    ServeError::new(err.code, format!("{}: {}", path.display(), err.msg))
}

impl ArtifactRepo for FsArtifactRepo {
    fn load_scaler(&self) -> ServeResult<Scaler> {
        let raw = read_artifact(&self.scaler_path)?;
        Scaler::from_json(&raw).map_err(|err| with_path(&self.scaler_path, err))
    }

    fn load_classifier(&self) -> ServeResult<Classifier> {
        let raw = read_artifact(&self.model_path)?;
        Classifier::from_json(&raw).map_err(|err| with_path(&self.model_path, err))
    }
}
