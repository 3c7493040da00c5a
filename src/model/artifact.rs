//! Binary model artifact format
//!
//! A saved model is a bincode-encoded envelope: magic bytes, a format
//! version, human-readable metadata, the opaque model payload, and an FNV-1a
//! checksum of the payload. Loading verifies all three of magic, version and
//! checksum before the payload is decoded.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{Result, StorecastError};

/// Descriptive metadata stored next to the model payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,
    /// Producing crate version
    pub version: String,
    /// Training timestamp (RFC 3339)
    pub trained_at: String,
    /// Feature names in training order
    pub feature_names: Vec<String>,
    /// Target name
    pub target_name: String,
    /// Model type
    pub model_type: String,
    /// Hyperparameters
    pub hyperparameters: HashMap<String, String>,
    /// Hold-out metrics
    pub metrics: HashMap<String, f64>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            name: "model".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: String::new(),
            feature_names: Vec::new(),
            target_name: "target".to_string(),
            model_type: "unknown".to_string(),
            hyperparameters: HashMap::new(),
            metrics: HashMap::new(),
        }
    }
}

impl ModelMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_trained_at(mut self, trained_at: impl Into<String>) -> Self {
        self.trained_at = trained_at.into();
        self
    }

    pub fn with_model_type(mut self, model_type: impl Into<String>) -> Self {
        self.model_type = model_type.into();
        self
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.feature_names = features;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_name = target.into();
        self
    }

    pub fn add_hyperparameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hyperparameters.insert(key.into(), value.into());
        self
    }

    pub fn add_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// On-disk envelope around a serialized model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    /// Model metadata
    pub metadata: ModelMetadata,
    /// Serialized model payload
    pub model_data: Vec<u8>,
    /// Checksum of the payload
    pub checksum: u64,
}

impl ModelArtifact {
    /// Magic bytes for storecast model files
    const MAGIC: [u8; 4] = *b"SCMA";
    /// Current format version
    const VERSION: u32 = 1;

    pub fn new(metadata: ModelMetadata, model_data: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&model_data);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            model_data,
            checksum,
        }
    }

    /// FNV-1a over the payload bytes
    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        let mut hash = FNV_OFFSET;
        for byte in data {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }

    pub fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.model_data) == self.checksum
    }

    fn verify(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(StorecastError::SerializationError(
                "not a storecast model file (bad magic bytes)".to_string(),
            ));
        }
        if self.format_version != Self::VERSION {
            return Err(StorecastError::SerializationError(format!(
                "unsupported model format version {} (expected {})",
                self.format_version,
                Self::VERSION
            )));
        }
        if !self.verify_checksum() {
            return Err(StorecastError::SerializationError(
                "checksum verification failed - file may be corrupted".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serialize a model into an artifact file
pub fn save_model<M: Serialize>(
    model: &M,
    path: impl AsRef<Path>,
    metadata: ModelMetadata,
) -> Result<()> {
    let model_data = bincode::serialize(model)
        .map_err(|e| StorecastError::SerializationError(format!("failed to serialize: {e}")))?;

    let artifact = ModelArtifact::new(metadata, model_data);

    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, &artifact)
        .map_err(|e| StorecastError::SerializationError(format!("failed to write: {e}")))?;

    Ok(())
}

/// Read an artifact file back into a model and its metadata
pub fn load_model<M: DeserializeOwned>(path: impl AsRef<Path>) -> Result<(M, ModelMetadata)> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let artifact: ModelArtifact = bincode::deserialize_from(reader)
        .map_err(|e| StorecastError::SerializationError(format!("failed to deserialize: {e}")))?;

    artifact.verify()?;

    let model: M = bincode::deserialize(&artifact.model_data).map_err(|e| {
        StorecastError::SerializationError(format!("failed to deserialize model: {e}"))
    })?;

    Ok((model, artifact.metadata))
}
