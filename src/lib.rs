//! # Botforge - Visual Bot Graph Compilation Engine
//!
//! **Botforge** compiles the node graphs produced by a visual bot builder into
//! complete, runnable Python/aiogram programs. The graph of typed nodes
//! (start, message, command, media and admin nodes connected by edges and
//! annotated with buttons, conditional branches, multi-select widgets and
//! variable bindings) is validated, preprocessed into routing indices, and
//! emitted as ordered, marker-delimited source text.
//!
//! ## Core Workflow
//!
//! The engine is format-agnostic: it operates on a canonical `BotDefinition`.
//! The primary workflow is:
//!
//! 1.  **Load Your Data**: Parse your stored project document into your own Rust structs
//!     (or directly into `BotDefinition` - it deserializes the editor's camelCase JSON).
//! 2.  **Convert**: Implement the `IntoBotDefinition` trait for custom formats to provide
//!     a translation layer into the canonical model.
//! 3.  **Generate**: Use `Generator::builder` to create a generator instance. Generation
//!     runs a fixed sequence of phases and returns a structured result with the emitted
//!     program, collected errors, warnings and metadata.
//! 4.  **Deploy**: Hand the emitted code (or a saved `GeneratedArtifact`) to the process
//!     manager that writes and spawns the bot program.
//!
//! ## Quick Start
//!
//! ```rust
//! use botforge::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let document = r#"{
//!         "name": "my_bot",
//!         "nodes": [
//!             {
//!                 "id": "start_1",
//!                 "type": "start",
//!                 "data": {
//!                     "messageText": "Привет! {user_name}",
//!                     "buttons": [
//!                         {"text": "Дальше", "action": "goto", "target": "info"}
//!                     ]
//!                 }
//!             },
//!             {"id": "info", "type": "message", "data": {"messageText": "Все готово"}}
//!         ],
//!         "connections": []
//!     }"#;
//!
//!     let definition: BotDefinition = serde_json::from_str(document)
//!         .map_err(|e| GenerateError::JsonParseError(e.to_string()))?;
//!
//!     let generator = Generator::builder(definition).build();
//!     let result = generator.generate();
//!
//!     assert!(result.success);
//!     assert!(result.code.contains("@@NODE_START:start_1@@"));
//!     println!(
//!         "Generated {} lines, {} handlers",
//!         result.metadata.lines_generated, result.metadata.handlers_count
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Generated Document Contract
//!
//! The emitted program always follows one top-level ordering: encoding pragma,
//! imports, bootstrap, global state, utility functions, message handlers,
//! callback handlers, multi-select handlers, media handlers, main entry
//! function, startup invocation and an optional BotFather command listing.
//! Every node's contribution is wrapped in `@@NODE_START:<id>@@` /
//! `@@NODE_END:<id>@@` markers so external tools can slice the source back to
//! its originating nodes.

pub mod bot;
pub mod emit;
pub mod error;
pub mod generator;
pub mod graph;
pub mod prelude;
