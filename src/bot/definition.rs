use serde::{Deserialize, Serialize};

/// The complete, canonical definition of a visual bot graph, ready for generation.
/// This is the target structure for any custom stored-project conversion, and it
/// deserializes directly from the camelCase JSON documents the visual editor stores.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotDefinition {
    #[serde(default, alias = "botName")]
    pub name: String,
    #[serde(default, alias = "projectId")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub nodes: Vec<BotNode>,
    #[serde(default, alias = "edges")]
    pub connections: Vec<Connection>,
    #[serde(default, alias = "groupIds")]
    pub groups: Vec<String>,
    #[serde(default, alias = "databaseEnabled")]
    pub database_enabled: bool,
    #[serde(default, alias = "loggingEnabled")]
    pub logging_enabled: bool,
}

/// A single typed node in the visual graph.
#[derive(Debug, Clone, Deserialize)]
pub struct BotNode {
    pub id: String,
    #[serde(rename = "type", alias = "nodeType", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub data: NodeData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Start,
    #[default]
    Message,
    Command,
    Media,
    Admin,
    #[serde(other)]
    Other,
}

/// Per-node configuration carried by the editor document.
///
/// Every field is optional in the wire format; absent fields default to the
/// inert value so the preprocessor stays total over arbitrary documents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeData {
    #[serde(default, alias = "messageText", alias = "text")]
    pub message_text: Option<String>,
    #[serde(default)]
    pub buttons: Vec<Button>,
    #[serde(default, alias = "keyboardType")]
    pub keyboard_type: Option<KeyboardKind>,

    // Input collection: which incoming content kinds the node waits for.
    #[serde(default, alias = "collectText")]
    pub collect_text: bool,
    #[serde(default, alias = "collectPhoto")]
    pub collect_photo: bool,
    #[serde(default, alias = "collectVideo")]
    pub collect_video: bool,
    #[serde(default, alias = "collectAudio")]
    pub collect_audio: bool,
    #[serde(default, alias = "collectDocument")]
    pub collect_document: bool,
    #[serde(default, alias = "inputVariable")]
    pub input_variable: Option<String>,

    #[serde(default, alias = "conditionalMessages")]
    pub conditional_messages: Vec<ConditionalMessage>,

    #[serde(default, alias = "attachedMedia")]
    pub attached_media: Vec<AttachedMedia>,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default, alias = "videoUrl")]
    pub video_url: Option<String>,
    #[serde(default, alias = "audioUrl")]
    pub audio_url: Option<String>,
    #[serde(default, alias = "documentUrl")]
    pub document_url: Option<String>,

    // Multi-select widget configuration.
    #[serde(default, alias = "allowMultipleSelection")]
    pub allow_multiple_selection: bool,
    #[serde(default, alias = "multiSelectVariable")]
    pub multi_select_variable: Option<String>,
    #[serde(default, alias = "continueButtonTarget")]
    pub continue_button_target: Option<String>,

    // Auto-transition configuration.
    #[serde(default, alias = "enableAutoTransition")]
    pub enable_auto_transition: bool,
    #[serde(default, alias = "autoTransitionTo")]
    pub auto_transition_to: Option<String>,

    /// Command name for command-type nodes, with or without the leading slash.
    #[serde(default)]
    pub command: Option<String>,

    /// Composite keyboard strategy: append the referenced node's buttons to
    /// this node's keyboard. Selected by configuration, never by node ID.
    #[serde(default, alias = "mergeKeyboardFrom")]
    pub merge_keyboard_from: Option<String>,
}

impl NodeData {
    /// True when any input-collection flag is set.
    pub fn collects_input(&self) -> bool {
        self.collect_text
            || self.collect_photo
            || self.collect_video
            || self.collect_audio
            || self.collect_document
    }

    /// True when the node behaves as a multi-select widget.
    pub fn is_multi_select(&self) -> bool {
        self.allow_multiple_selection
            || self
                .buttons
                .iter()
                .any(|b| b.action == ButtonAction::Selection)
    }
}

/// A button attached to a node or to one of its conditional messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Button {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub action: ButtonAction,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default, alias = "hideAfterClick")]
    pub hide_after_click: bool,
    #[serde(default, alias = "skipDataCollection")]
    pub skip_data_collection: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonAction {
    #[default]
    Goto,
    Url,
    Command,
    Selection,
    Contact,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardKind {
    Inline,
    Reply,
}

/// A structural edge between two nodes. Used only for implicit single-successor
/// auto-transition inference when a node has no buttons of its own.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
}

/// One alternative rendering of a node, selected by a variable-existence predicate.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionalMessage {
    #[serde(default)]
    pub condition: ConditionKind,
    #[serde(default, alias = "variableNames")]
    pub variable_names: Vec<String>,
    #[serde(default, alias = "logicOperator")]
    pub logic_operator: LogicOperator,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, alias = "messageText")]
    pub message_text: String,
    #[serde(default)]
    pub buttons: Vec<Button>,
    #[serde(default, alias = "keyboardType")]
    pub keyboard_type: Option<KeyboardKind>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, alias = "waitForInput")]
    pub wait_for_input: bool,
    #[serde(default, alias = "inputVariable")]
    pub input_variable: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ConditionKind {
    #[default]
    #[serde(alias = "variable_exists", alias = "variableExists")]
    VariableExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LogicOperator {
    #[default]
    #[serde(alias = "AND", alias = "and")]
    And,
    #[serde(alias = "OR", alias = "or")]
    Or,
}

/// A media attachment resolved from a previously collected variable.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachedMedia {
    pub variable: String,
    #[serde(rename = "type", alias = "mediaType", default)]
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Photo,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    /// The string the generated runtime helper dispatches on.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
        }
    }
}
