use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::errors::AppError;

/// Raw bytes of a model artifact plus their SHA-256 checksum.
///
/// The checksum is computed as soon as the file is read so that a deployment
/// can pin the exact artifact it expects (`MODEL_SHA256`) and refuse to start
/// on a corrupted or swapped file.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    /// Where the artifact was read from.
    pub path: PathBuf,
    /// The artifact contents.
    pub bytes: Vec<u8>,
    /// SHA-256 checksum of `bytes` (hex encoded, lowercase).
    pub checksum: String,
}

impl ModelArtifact {
    /// Reads an artifact from disk and computes its checksum.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::ModelLoad(format!("cannot read {}: {}", path.display(), e))
        })?;

        Ok(Self::from_bytes(path, bytes))
    }

    /// Wraps bytes already in memory.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&bytes);
        Self {
            path: path.into(),
            bytes,
            checksum,
        }
    }

    /// Computes SHA-256 checksum of the data
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Checks the artifact against an expected checksum (case-insensitive hex).
    pub fn verify(&self, expected: &str) -> Result<(), AppError> {
        let expected = expected.trim().to_ascii_lowercase();
        if expected == self.checksum {
            return Ok(());
        }

        tracing::warn!(
            "Model artifact checksum mismatch. Expected: {}, Actual: {}, Size: {} bytes",
            expected,
            self.checksum,
            self.bytes.len()
        );
        Err(AppError::ModelLoad(format!(
            "checksum mismatch for {}: expected {}, got {}",
            self.path.display(),
            expected,
            self.checksum
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let a = ModelArtifact::from_bytes("a.json", b"model".to_vec());
        let b = ModelArtifact::from_bytes("b.json", b"model".to_vec());

        assert_eq!(a.checksum, b.checksum);
        assert_eq!(a.checksum.len(), 64);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            ModelArtifact::compute_checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_verify_accepts_uppercase() {
        let artifact = ModelArtifact::from_bytes("m.json", b"{}".to_vec());
        let upper = artifact.checksum.to_ascii_uppercase();

        assert!(artifact.verify(&upper).is_ok());
    }

    #[test]
    fn test_tampered_artifact_rejected() {
        let original = ModelArtifact::from_bytes("m.json", b"{\"intercept\": 1.0}".to_vec());
        let tampered = ModelArtifact::from_bytes("m.json", b"{\"intercept\": 9.0}".to_vec());

        let result = tampered.verify(&original.checksum);
        assert!(matches!(result, Err(AppError::ModelLoad(_))));
    }

    #[test]
    fn test_missing_file_is_model_load_error() {
        let result = ModelArtifact::read("/nonexistent/telco_churn_model.json");
        assert!(matches!(result, Err(AppError::ModelLoad(_))));
    }
}
