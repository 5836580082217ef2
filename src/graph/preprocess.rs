use crate::bot::{BotNode, ButtonAction, Connection, MediaKind};
use ahash::{AHashMap, AHashSet};

/// A variable known to hold media, together with the media kind it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaVariable {
    pub kind: MediaKind,
    pub variable: String,
}

/// Derived indices over the raw graph, computed once before generation.
///
/// This stage is a pure, total function over its input shape: it never errors,
/// never deduplicates node IDs (uniqueness is a validation concern) and never
/// resolves dangling references (the handler generator degrades those to
/// defensive fallbacks).
#[derive(Debug, Clone, Default)]
pub struct ProcessedGraph {
    /// Direct projection of node IDs, order preserved.
    pub all_node_ids: Vec<String>,
    /// Variable name -> media kind, for "send as media with caption" decisions.
    pub media_variables: AHashMap<String, MediaVariable>,
    /// Static media URL per node ID (first URL field wins, photo over video
    /// over audio over document).
    pub static_media: AHashMap<String, (MediaKind, String)>,
    /// Node IDs referenced by any button, continue target or auto-transition,
    /// in first-reference order, deduplicated.
    pub referenced_targets: Vec<String>,
    /// Node IDs used only as conditional-button targets.
    pub conditional_only_targets: AHashSet<String>,
    /// Source node ID -> ordered outgoing connection targets.
    pub outgoing: AHashMap<String, Vec<String>>,
}

impl ProcessedGraph {
    /// The single structural successor of a node, if it has exactly one.
    pub fn single_successor(&self, node_id: &str) -> Option<&str> {
        match self.outgoing.get(node_id).map(Vec::as_slice) {
            Some([only]) => Some(only.as_str()),
            _ => None,
        }
    }
}

pub fn preprocess(nodes: &[BotNode], connections: &[Connection]) -> ProcessedGraph {
    let all_node_ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();

    let mut media_variables = AHashMap::new();
    let mut static_media = AHashMap::new();
    for node in nodes {
        // Input-collection nodes produce media variables for later attachment.
        if let Some(variable) = &node.data.input_variable {
            let collected_kind = if node.data.collect_photo {
                Some(MediaKind::Photo)
            } else if node.data.collect_video {
                Some(MediaKind::Video)
            } else if node.data.collect_audio {
                Some(MediaKind::Audio)
            } else if node.data.collect_document {
                Some(MediaKind::Document)
            } else {
                None
            };
            if let Some(kind) = collected_kind {
                media_variables.insert(
                    variable.clone(),
                    MediaVariable {
                        kind,
                        variable: variable.clone(),
                    },
                );
            }
        }
        for attachment in &node.data.attached_media {
            media_variables.insert(
                attachment.variable.clone(),
                MediaVariable {
                    kind: attachment.kind,
                    variable: attachment.variable.clone(),
                },
            );
        }
        let url_fields = [
            (MediaKind::Photo, &node.data.image_url),
            (MediaKind::Video, &node.data.video_url),
            (MediaKind::Audio, &node.data.audio_url),
            (MediaKind::Document, &node.data.document_url),
        ];
        if let Some((kind, url)) = url_fields
            .iter()
            .find_map(|(kind, url)| url.as_ref().map(|u| (*kind, u.clone())))
        {
            static_media.insert(node.id.clone(), (kind, url));
        }
    }

    // Reachable handler targets: every ID a button, continue target or
    // auto-transition points at, in first-reference order.
    let mut referenced_targets = Vec::new();
    let mut referenced_seen = AHashSet::new();
    let mut direct_targets = AHashSet::new();
    let mut conditional_targets = AHashSet::new();
    let reference = |id: &str, seen: &mut AHashSet<String>, out: &mut Vec<String>| {
        if seen.insert(id.to_string()) {
            out.push(id.to_string());
        }
    };

    for node in nodes {
        for button in &node.data.buttons {
            if button.action == ButtonAction::Goto {
                if let Some(target) = &button.target {
                    reference(target, &mut referenced_seen, &mut referenced_targets);
                    direct_targets.insert(target.clone());
                }
            }
        }
        for conditional in &node.data.conditional_messages {
            for button in &conditional.buttons {
                if button.action == ButtonAction::Goto {
                    if let Some(target) = &button.target {
                        reference(target, &mut referenced_seen, &mut referenced_targets);
                        conditional_targets.insert(target.clone());
                    }
                }
            }
        }
        if let Some(target) = &node.data.continue_button_target {
            reference(target, &mut referenced_seen, &mut referenced_targets);
            direct_targets.insert(target.clone());
        }
        if node.data.enable_auto_transition {
            if let Some(target) = &node.data.auto_transition_to {
                reference(target, &mut referenced_seen, &mut referenced_targets);
                direct_targets.insert(target.clone());
            }
        }
    }

    // Implicit auto-transitions: a node with no buttons and exactly one
    // outgoing connection reaches its single successor.
    let mut implicit = Vec::new();
    for node in nodes {
        if !node.data.buttons.is_empty() {
            continue;
        }
        let targets: Vec<&Connection> = connections
            .iter()
            .filter(|c| c.source == node.id)
            .collect();
        if let [only] = targets.as_slice() {
            implicit.push(only.target.clone());
        }
    }
    for target in implicit {
        reference(&target, &mut referenced_seen, &mut referenced_targets);
        direct_targets.insert(target);
    }

    let conditional_only_targets = conditional_targets
        .difference(&direct_targets)
        .cloned()
        .collect();

    let mut outgoing: AHashMap<String, Vec<String>> = AHashMap::new();
    for connection in connections {
        outgoing
            .entry(connection.source.clone())
            .or_default()
            .push(connection.target.clone());
    }

    ProcessedGraph {
        all_node_ids,
        media_variables,
        static_media,
        referenced_targets,
        conditional_only_targets,
        outgoing,
    }
}
