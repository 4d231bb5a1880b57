//! Fitted model artifacts and their on-disk bundle.
//!
//! A bundle is four co-dependent pieces fitted against the same feature
//! schema: the model, the imputer, an optional scaler and metadata. They are
//! always saved and loaded together through [`ArtifactStore`].

pub mod bundle;
pub mod imputer;
pub mod model;
pub mod scaler;
pub mod store;

pub use bundle::{ArtifactBundle, BundleMeta, DEFAULT_THRESHOLD};
pub use imputer::MedianImputer;
pub use model::{Model, Predictor};
pub use scaler::Scaler;
pub use store::{ArtifactStore, IMPUTER_FILE, META_FILE, MODEL_FILE, SCALER_FILE};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while persisting or restoring an artifact bundle.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// I/O failure while reading or writing a bundle file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required bundle file does not exist.
    #[error("artifact not found: {0}")]
    Missing(PathBuf),

    /// A file could not be parsed or the pieces disagree with the feature schema.
    #[error("invalid artifact schema: {0}")]
    Schema(String),

    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArtifactError>;
