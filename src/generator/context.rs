use crate::bot::{BotDefinition, BotNode, Connection, NodeType};
use crate::error::GenerationIssue;
use crate::graph::{ProcessedGraph, preprocess};
use ahash::AHashSet;

/// Bot-level generation flags.
#[derive(Debug, Clone, Default)]
pub struct BotConfig {
    pub name: String,
    pub groups: Vec<String>,
    pub database_enabled: bool,
    pub logging_enabled: bool,
    pub project_id: Option<String>,
}

/// Immutable aggregate handed to every downstream generator: the raw graph,
/// the preprocessed indices and the bot-level flags.
///
/// Built once per generation call. Downstream generators never mutate it;
/// variants are produced with `with_config` as structural copies.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub nodes: Vec<BotNode>,
    pub connections: Vec<Connection>,
    pub graph: ProcessedGraph,
    pub config: BotConfig,
}

impl GenerationContext {
    pub fn builder(definition: BotDefinition) -> ContextBuilder {
        ContextBuilder::new(definition)
    }

    pub fn find_node(&self, node_id: &str) -> Option<&BotNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// The start node, falling back to the first node in insertion order when
    /// no node is typed `start`. The fallback is deliberate: editors routinely
    /// generate previews of unfinished graphs.
    pub fn start_node(&self) -> Option<&BotNode> {
        self.nodes
            .iter()
            .find(|n| n.node_type == NodeType::Start)
            .or_else(|| self.nodes.first())
    }

    /// Structural copy with a different flag set.
    pub fn with_config(&self, config: BotConfig) -> GenerationContext {
        GenerationContext {
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
            graph: self.graph.clone(),
            config,
        }
    }
}

/// Builds a `GenerationContext` from a raw definition, exposing validation
/// independently so editors can run live checks without generating.
pub struct ContextBuilder {
    definition: BotDefinition,
}

impl ContextBuilder {
    pub fn new(definition: BotDefinition) -> Self {
        Self { definition }
    }

    /// Runs every validation rule and returns all violations. Never aborts;
    /// the caller decides whether the result blocks generation.
    pub fn validate(&self) -> Vec<GenerationIssue> {
        validate_rules(&self.definition.name, &self.definition.nodes)
            .into_iter()
            .map(|rule| rule.issue)
            .collect()
    }

    pub fn build(self) -> GenerationContext {
        let BotDefinition {
            name,
            project_id,
            nodes,
            connections,
            groups,
            database_enabled,
            logging_enabled,
        } = self.definition;

        let graph = preprocess(&nodes, &connections);

        GenerationContext {
            nodes,
            connections,
            graph,
            config: BotConfig {
                name,
                groups,
                database_enabled,
                logging_enabled,
                project_id,
            },
        }
    }
}

/// One validation finding, flagged when the orchestrator may recover from it
/// instead of refusing generation.
pub(super) struct RuleViolation {
    pub issue: GenerationIssue,
    pub recoverable: bool,
}

/// All validation rules, in contract order, each applied independently so
/// every violation is reported rather than only the first.
pub(super) fn validate_rules(name: &str, nodes: &[BotNode]) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    let push = |message: String, recoverable: bool, violations: &mut Vec<RuleViolation>| {
        violations.push(RuleViolation {
            issue: GenerationIssue::validation(message, "validation"),
            recoverable,
        });
    };

    if name.trim().is_empty() {
        push("Bot name must not be empty".to_string(), false, &mut violations);
    }

    if nodes.is_empty() {
        push(
            "Bot graph must contain at least one node".to_string(),
            false,
            &mut violations,
        );
    }

    // Deliberate relaxation: the orchestrator recovers by treating the first
    // node in insertion order as the implicit start.
    if !nodes.is_empty() && !nodes.iter().any(|n| n.node_type == NodeType::Start) {
        push(
            "Bot graph has no start node; the first node will be used as the entry point"
                .to_string(),
            true,
            &mut violations,
        );
    }

    if !name.trim().is_empty() && !is_valid_bot_name(name) {
        push(
            format!(
                "Bot name '{}' must start with a letter or underscore and contain only letters, digits and underscores",
                name
            ),
            false,
            &mut violations,
        );
    }

    let mut seen = AHashSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            push(
                format!("Node ID '{}' is not unique", node.id),
                false,
                &mut violations,
            );
        }
    }

    violations
}

/// Bot names follow the `[A-Za-z_][A-Za-z0-9_]*` charset.
pub fn is_valid_bot_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
