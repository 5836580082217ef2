//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the
//! botforge crate. Import this module to get access to the core functionality
//! without having to import each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use botforge::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let document = std::fs::read_to_string("path/to/bot.json")?;
//! let definition: BotDefinition = serde_json::from_str(&document)?;
//!
//! let generator = Generator::builder(definition).build();
//! let result = generator.generate();
//!
//! println!("success: {}, handlers: {}", result.success, result.metadata.handlers_count);
//! # Ok(())
//! # }
//! ```

// Core generation pipeline
pub use crate::generator::{
    BotConfig, ContextBuilder, GenerationContext, GenerationMetadata, GenerationResult, Generator,
    GeneratorBuilder,
};

// Graph document model
pub use crate::bot::{
    AttachedMedia, BotDefinition, BotNode, Button, ButtonAction, ConditionKind, ConditionalMessage,
    Connection, GeneratedArtifact, IntoBotDefinition, KeyboardKind, LogicOperator, MediaKind,
    NodeData, NodeType,
};

// Preprocessed graph indices
pub use crate::graph::{MediaVariable, ProcessedGraph, preprocess};

// Error types
pub use crate::error::{
    ArtifactError, ConversionError, GenerateError, GenerationIssue, IssueKind,
};

// Standard library re-exports commonly used with this crate
pub use std::collections::HashMap;
pub use std::path::Path;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
