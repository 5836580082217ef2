use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that abort code generation before any text is produced.
#[derive(Error, Debug, Clone)]
pub enum GenerateError {
    #[error("Failed to parse bot document JSON: {0}")]
    JsonParseError(String),

    #[error("Bot definition is invalid: {0}")]
    InvalidDefinition(String),
}

/// Errors that can occur when converting a custom stored-project format
/// into a canonical `BotDefinition`.
#[derive(Error, Debug, Clone)]
pub enum ConversionError {
    #[error("Invalid custom bot document: {0}")]
    ValidationError(String),
}

/// Errors raised while saving or loading a generated artifact.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("{0}")]
    Generic(String),
}

/// Category of a collected generation issue.
///
/// Validation issues refuse generation outright; the phase-local kinds are
/// recorded at the failing phase boundary while sibling phases keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    ValidationError,
    ImportError,
    HandlerGenerationError,
    UnknownError,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueKind::ValidationError => "VALIDATION_ERROR",
            IssueKind::ImportError => "IMPORT_ERROR",
            IssueKind::HandlerGenerationError => "HANDLER_GENERATION_ERROR",
            IssueKind::UnknownError => "UNKNOWN_ERROR",
        };
        f.write_str(name)
    }
}

/// A single collected problem, tagged with the generator module that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub kind: IssueKind,
    pub message: String,
    pub module: String,
}

impl GenerationIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            module: module.into(),
        }
    }

    pub fn validation(message: impl Into<String>, module: impl Into<String>) -> Self {
        Self::new(IssueKind::ValidationError, message, module)
    }
}

impl fmt::Display for GenerationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.module, self.message)
    }
}
