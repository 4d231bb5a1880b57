//! Directory-backed persistence for artifact bundles.
//!
//! Layout under the bundle directory:
//!
//! ```text
//! model.json    fitted model
//! imputer.json  fitted imputer
//! scaler.json   fitted scaler, or `null`
//! meta.json     flat metadata map (threshold, trained_at, ...)
//! ```
//!
//! Writes are not atomic across the four files; a crash mid-save leaves a
//! partial bundle and training has to be re-run.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ArtifactBundle, ArtifactError, BundleMeta, MedianImputer, Model, Result, Scaler};

pub const MODEL_FILE: &str = "model.json";
pub const IMPUTER_FILE: &str = "imputer.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const META_FILE: &str = "meta.json";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write all four artifacts, creating the directory if needed.
    pub fn save(&self, bundle: &ArtifactBundle) -> Result<()> {
        tracing::info!(path = %self.root.display(), model = bundle.model_name(), "Saving artifact bundle");

        std::fs::create_dir_all(&self.root).map_err(|e| ArtifactError::Io {
            path: self.root.clone(),
            source: e,
        })?;

        self.write_json(MODEL_FILE, &bundle.model)?;
        self.write_json(IMPUTER_FILE, &bundle.imputer)?;
        self.write_json(SCALER_FILE, &bundle.scaler)?;
        self.write_json(META_FILE, &bundle.meta)?;

        tracing::debug!(path = %self.root.display(), "Artifact bundle saved");
        Ok(())
    }

    /// Read and validate all artifacts. A missing `scaler.json` means the
    /// bundle has no scaler.
    pub fn load(&self) -> Result<ArtifactBundle> {
        tracing::info!(path = %self.root.display(), "Loading artifact bundle");

        let model: Model = self.read_json(MODEL_FILE)?;
        let imputer: MedianImputer = self.read_json(IMPUTER_FILE)?;
        let meta: BundleMeta = self.read_json(META_FILE)?;
        let scaler: Option<Scaler> = if self.path(SCALER_FILE).exists() {
            self.read_json(SCALER_FILE)?
        } else {
            None
        };

        let bundle = ArtifactBundle {
            model,
            imputer,
            scaler,
            meta,
        };
        bundle.validate()?;

        tracing::info!(
            path = %self.root.display(),
            model = bundle.model_name(),
            scaled = bundle.scaler.is_some(),
            threshold = bundle.meta.threshold(),
            trained_at = %bundle.meta.trained_at,
            "Artifact bundle loaded"
        );
        Ok(bundle)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.path(file);
        let json = serde_json::to_string_pretty(value).map_err(ArtifactError::Serialization)?;
        std::fs::write(&path, json).map_err(|e| ArtifactError::Io { path, source: e })
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.path(file);
        if !path.exists() {
            return Err(ArtifactError::Missing(path));
        }
        let json = std::fs::read_to_string(&path).map_err(|e| ArtifactError::Io {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&json)
            .map_err(|e| ArtifactError::Schema(format!("{}: {}", path.display(), e)))
    }
}

