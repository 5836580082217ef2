use crate::error::{ArtifactError, GenerationIssue};
use crate::generator::{GenerationMetadata, GenerationResult};
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// A generated bot program together with its generation report, in the shape
/// the process manager consumes: it writes `code` to disk and spawns it.
#[derive(Serialize, Deserialize, Debug)]
pub struct GeneratedArtifact {
    pub bot_name: String,
    pub project_id: Option<String>,
    pub code: String,
    pub metadata: GenerationMetadata,
    pub errors: Vec<GenerationIssue>,
    pub warnings: Vec<String>,
}

impl GeneratedArtifact {
    pub fn from_result(
        bot_name: impl Into<String>,
        project_id: Option<String>,
        result: &GenerationResult,
    ) -> Self {
        Self {
            bot_name: bot_name.into(),
            project_id,
            code: result.code.clone(),
            metadata: result.metadata.clone(),
            errors: result.errors.clone(),
            warnings: result.warnings.clone(),
        }
    }

    /// Saves the artifact to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = encode_to_vec(self, standard())
            .map_err(|e| ArtifactError::Generic(format!("Serialization failed: {}", e)))?;
        let mut file = fs::File::create(path).map_err(|e| {
            ArtifactError::Generic(format!("Could not create file '{}': {}", path, e))
        })?;
        file.write_all(&bytes).map_err(|e| {
            ArtifactError::Generic(format!("Could not write to file '{}': {}", path, e))
        })?;
        Ok(())
    }

    /// Loads an artifact from a file.
    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let mut file = fs::File::open(path).map_err(|e| {
            ArtifactError::Generic(format!("Could not open file '{}': {}", path, e))
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            ArtifactError::Generic(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Deserializes an artifact from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(artifact, _)| artifact) // bincode 2 returns a tuple (data, bytes_read)
            .map_err(|e| ArtifactError::Generic(format!("Deserialization failed: {}", e)))
    }
}
