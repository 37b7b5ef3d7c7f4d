//! Model store: the fitted scaler and classifier, loaded once at startup.

pub mod domain;
pub mod repo_fs;

pub use domain::{ArtifactRepo, Classifier, ModelStore, Scaler, Tree};
pub use repo_fs::FsArtifactRepo;
