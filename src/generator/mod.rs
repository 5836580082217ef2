//! The generation pipeline: validation gate, ordered emission phases with
//! isolated failure boundaries, and the final document assembly.

use crate::bot::BotDefinition;
use crate::emit::{CodeBuffer, count_handlers, count_lines};
use crate::error::{GenerationIssue, IssueKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

mod bootstrap;
mod context;
mod handlers;
mod keyboard;
mod startup;

pub use context::{BotConfig, ContextBuilder, GenerationContext, is_valid_bot_name};

use handlers::HandlerGenerator;

/// Derived facts about the final document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub lines_generated: usize,
    pub handlers_count: usize,
    pub nodes_processed: usize,
}

/// The structured result every caller receives: a best-effort document plus
/// the accumulated errors and warnings. `success` holds exactly when no error
/// was collected.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub success: bool,
    pub code: String,
    pub errors: Vec<GenerationIssue>,
    pub warnings: Vec<String>,
    pub metadata: GenerationMetadata,
}

/// Compiles a `GenerationContext` into a complete aiogram program.
///
/// Generation is a synchronous, pure function over the context: no I/O, no
/// shared state across invocations, byte-identical output for identical input.
pub struct Generator {
    context: GenerationContext,
}

pub struct GeneratorBuilder {
    inner: ContextBuilder,
}

impl GeneratorBuilder {
    pub fn new(definition: BotDefinition) -> Self {
        Self {
            inner: ContextBuilder::new(definition),
        }
    }

    /// Editor-time live validation; reports violations without building.
    pub fn validate(&self) -> Vec<GenerationIssue> {
        self.inner.validate()
    }

    pub fn build(self) -> Generator {
        Generator {
            context: self.inner.build(),
        }
    }
}

impl Generator {
    pub fn builder(definition: BotDefinition) -> GeneratorBuilder {
        GeneratorBuilder::new(definition)
    }

    pub fn from_context(context: GenerationContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &GenerationContext {
        &self.context
    }

    pub fn generate(&self) -> GenerationResult {
        let ctx = &self.context;
        let mut errors: Vec<GenerationIssue> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        // Top-level validation gate. Recoverable findings (missing start node)
        // become warnings; everything else refuses generation outright.
        let violations = context::validate_rules(&ctx.config.name, &ctx.nodes);
        for violation in violations {
            if violation.recoverable {
                warnings.push(violation.issue.message);
            } else {
                errors.push(violation.issue);
            }
        }
        if !errors.is_empty() {
            return GenerationResult {
                success: false,
                code: String::new(),
                errors,
                warnings,
                metadata: GenerationMetadata {
                    lines_generated: 0,
                    handlers_count: 0,
                    nodes_processed: ctx.nodes.len(),
                },
            };
        }

        let mut buffer = CodeBuffer::new();

        // Phase 1: encoding pragma and imports.
        match bootstrap::emit_header(ctx) {
            Ok(fragment) => buffer.push(fragment),
            Err(message) => errors.push(GenerationIssue::new(
                IssueKind::ImportError,
                message,
                "imports",
            )),
        }

        // Phase 2: bootstrap, global state, utility functions.
        match bootstrap::emit_runtime(ctx) {
            Ok(fragments) => buffer.extend(fragments),
            Err(message) => errors.push(GenerationIssue::new(
                IssueKind::UnknownError,
                message,
                "bootstrap",
            )),
        }

        // Phase 3: handlers, in the fixed sub-order. Each sub-pass has its own
        // failure boundary so a broken pass never silences its siblings.
        fn record_sub_pass(
            result: Result<Vec<String>, String>,
            module: &str,
            banner: &str,
            buffer: &mut CodeBuffer,
            errors: &mut Vec<GenerationIssue>,
        ) {
            match result {
                Ok(fragments) if fragments.is_empty() => {}
                Ok(fragments) => {
                    buffer.push(format!("# --- {} ---", banner));
                    buffer.extend(fragments);
                }
                Err(message) => errors.push(GenerationIssue::new(
                    IssueKind::HandlerGenerationError,
                    message,
                    module,
                )),
            }
        }

        let mut handler_generator = HandlerGenerator::new(ctx);
        record_sub_pass(
            handler_generator.message_handlers(),
            "message handlers",
            "Message handlers",
            &mut buffer,
            &mut errors,
        );
        record_sub_pass(
            handler_generator.callback_handlers(),
            "callback handlers",
            "Callback handlers",
            &mut buffer,
            &mut errors,
        );
        record_sub_pass(
            handler_generator.multiselect_handlers(),
            "multi-select handlers",
            "Multi-select handlers",
            &mut buffer,
            &mut errors,
        );
        record_sub_pass(
            handler_generator.media_handlers(),
            "media handlers",
            "Media input handlers",
            &mut buffer,
            &mut errors,
        );

        // Phase 4: dispatch table, main entry function, startup invocation.
        let handled_ids = handler_generator.handled_ids();
        match startup::emit_dispatch(&handled_ids) {
            Ok(fragment) => buffer.push(fragment),
            Err(message) => errors.push(GenerationIssue::new(
                IssueKind::UnknownError,
                message,
                "dispatch",
            )),
        }
        match startup::emit_main(ctx) {
            Ok(fragment) => buffer.push(fragment),
            Err(message) => errors.push(GenerationIssue::new(
                IssueKind::UnknownError,
                message,
                "startup",
            )),
        }

        // Phase 5: BotFather command listing. Failures here are never fatal.
        match startup::emit_botfather(ctx) {
            Ok(Some(fragment)) => buffer.push(fragment),
            Ok(None) => {}
            Err(message) => warnings.push(format!("BotFather command listing skipped: {}", message)),
        }

        let code = buffer.into_code();
        let metadata = GenerationMetadata {
            lines_generated: count_lines(&code),
            handlers_count: count_handlers(&code),
            nodes_processed: ctx.nodes.len(),
        };
        debug!(
            lines = metadata.lines_generated,
            handlers = metadata.handlers_count,
            nodes = metadata.nodes_processed,
            "generation finished"
        );

        #[cfg(feature = "debug-tools")]
        self.write_debug_file(&code);

        GenerationResult {
            success: errors.is_empty(),
            code,
            errors,
            warnings,
            metadata,
        }
    }

    #[cfg(feature = "debug-tools")]
    fn write_debug_file(&self, code: &str) {
        let sanitized: String = self
            .context
            .config
            .name
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        let path = format!("tmp/{}_generated.py", sanitized);
        if let Some(parent) = std::path::Path::new(&path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&path, code) {
            eprintln!("Warning: could not write debug file '{}': {}", path, e);
        }
    }
}
