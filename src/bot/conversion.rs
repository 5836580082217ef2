use super::definition::BotDefinition;
use crate::error::ConversionError;

/// A trait for custom stored-project formats that can be converted into a
/// canonical `BotDefinition`.
///
/// This is the extension point that keeps the generator format-agnostic: the
/// persistence layer can store projects however it likes, and implements this
/// trait to provide the translation into the shape the generator consumes.
///
/// # Example
///
/// ```rust
/// use botforge::bot::{BotDefinition, IntoBotDefinition};
/// use botforge::error::ConversionError;
///
/// struct StoredProject {
///     title: String,
///     graph_json: String,
/// }
///
/// impl IntoBotDefinition for StoredProject {
///     fn into_bot_definition(self) -> Result<BotDefinition, ConversionError> {
///         let mut definition: BotDefinition = serde_json::from_str(&self.graph_json)
///             .map_err(|e| ConversionError::ValidationError(e.to_string()))?;
///         definition.name = self.title;
///         Ok(definition)
///     }
/// }
/// ```
pub trait IntoBotDefinition {
    /// Consumes the object and converts it into a generator-compatible definition.
    fn into_bot_definition(self) -> Result<BotDefinition, ConversionError>;
}

impl IntoBotDefinition for BotDefinition {
    fn into_bot_definition(self) -> Result<BotDefinition, ConversionError> {
        Ok(self)
    }
}
