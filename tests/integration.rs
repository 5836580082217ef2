//! End-to-end tests: raw JSON document parsing, custom-format conversion,
//! configuration flags and artifact persistence.
mod common;
use botforge::prelude::*;
use common::*;

const EDITOR_DOCUMENT_JSON: &str = r#"{
    "botName": "survey_bot",
    "projectId": "proj_42",
    "databaseEnabled": true,
    "loggingEnabled": true,
    "groupIds": ["-1001234567890"],
    "nodes": [
        {
            "id": "start_1",
            "type": "start",
            "data": {
                "messageText": "Привет, {user_name}!",
                "buttons": [
                    {"text": "Опрос", "action": "goto", "target": "poll", "hideAfterClick": false}
                ]
            }
        },
        {
            "id": "poll",
            "type": "message",
            "data": {
                "messageText": "Выбери варианты",
                "allowMultipleSelection": true,
                "multiSelectVariable": "choices",
                "continueButtonTarget": "ask_photo",
                "buttons": [
                    {"text": "Первый", "action": "selection"},
                    {"text": "Второй", "action": "selection"}
                ]
            }
        },
        {
            "id": "ask_photo",
            "type": "message",
            "data": {
                "messageText": "Пришли фото",
                "collectPhoto": true,
                "inputVariable": "photo_answer",
                "enableAutoTransition": false
            }
        },
        {
            "id": "final",
            "type": "message",
            "data": {
                "conditionalMessages": [
                    {
                        "condition": "variable_exists",
                        "variableNames": ["photo_answer"],
                        "logicOperator": "OR",
                        "priority": 1,
                        "messageText": "Спасибо за фото!"
                    }
                ],
                "messageText": "Готово"
            }
        }
    ],
    "connections": [
        {"source": "ask_photo", "target": "final"}
    ]
}"#;

#[test]
fn test_editor_document_deserializes_with_camelcase_aliases() {
    let definition: BotDefinition =
        serde_json::from_str(EDITOR_DOCUMENT_JSON).expect("Failed to parse editor document");

    assert_eq!(definition.name, "survey_bot");
    assert_eq!(definition.project_id.as_deref(), Some("proj_42"));
    assert!(definition.database_enabled);
    assert!(definition.logging_enabled);
    assert_eq!(definition.groups, vec!["-1001234567890".to_string()]);
    assert_eq!(definition.nodes.len(), 4);

    let poll = &definition.nodes[1];
    assert!(poll.data.allow_multiple_selection);
    assert_eq!(poll.data.multi_select_variable.as_deref(), Some("choices"));
    assert_eq!(poll.data.continue_button_target.as_deref(), Some("ask_photo"));

    let ask = &definition.nodes[2];
    assert!(ask.data.collect_photo);
    assert_eq!(ask.data.input_variable.as_deref(), Some("photo_answer"));

    let conditional = &definition.nodes[3].data.conditional_messages[0];
    assert_eq!(conditional.logic_operator, LogicOperator::Or);
    assert!(conditional.enabled);
}

#[test]
fn test_full_document_generation() {
    let definition: BotDefinition =
        serde_json::from_str(EDITOR_DOCUMENT_JSON).expect("Failed to parse editor document");
    let result = Generator::builder(definition).build().generate();
    assert!(result.success, "errors: {:?}", result.errors);
    let code = &result.code;

    // Database flag: sqlite persistence is wired through the variable setter.
    assert!(code.contains("import sqlite3"));
    assert!(code.contains("def init_database():"));
    assert!(code.contains("save_user_variable(user_id, name, value)"));
    assert!(code.contains("DB_PATH = \"survey_bot.db\""));

    // Logging flag and group list.
    assert!(code.contains("logging.basicConfig(level=logging.INFO)"));
    assert!(code.contains("GROUP_IDS = [\"-1001234567890\"]"));

    // All four nodes contribute marker regions.
    for id in ["start_1", "poll", "ask_photo", "final"] {
        assert!(code.contains(&format!("# @@NODE_START:{}@@", id)), "{}", id);
        assert!(code.contains(&format!("# @@NODE_END:{}@@", id)), "{}", id);
    }

    assert_eq!(result.metadata.nodes_processed, 4);
}

#[test]
fn test_into_bot_definition_conversion() {
    struct StoredProject {
        title: String,
        graph_json: String,
    }

    impl IntoBotDefinition for StoredProject {
        fn into_bot_definition(self) -> std::result::Result<BotDefinition, ConversionError> {
            let mut definition: BotDefinition = serde_json::from_str(&self.graph_json)
                .map_err(|e| ConversionError::ValidationError(e.to_string()))?;
            definition.name = self.title;
            Ok(definition)
        }
    }

    let stored = StoredProject {
        title: "renamed_bot".to_string(),
        graph_json: EDITOR_DOCUMENT_JSON.to_string(),
    };
    let definition = stored
        .into_bot_definition()
        .expect("conversion should succeed");
    assert_eq!(definition.name, "renamed_bot");

    let result = Generator::builder(definition).build().generate();
    assert!(result.success);
}

#[test]
fn test_with_config_produces_structural_copy() {
    let generator = Generator::builder(simple_bot()).build();
    let plain = generator.generate();
    assert!(!plain.code.contains("import sqlite3"));

    let mut config = generator.context().config.clone();
    config.database_enabled = true;
    let variant = Generator::from_context(generator.context().with_config(config)).generate();
    assert!(variant.code.contains("import sqlite3"));
    assert!(variant.code.contains("init_database()"));

    // The original context is untouched.
    let replay = generator.generate();
    assert_eq!(plain.code, replay.code);
}

#[test]
fn test_artifact_round_trip() {
    let generator = Generator::builder(simple_bot()).build();
    let result = generator.generate();
    let artifact = GeneratedArtifact::from_result(
        generator.context().config.name.clone(),
        generator.context().config.project_id.clone(),
        &result,
    );

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("bot.artifact");
    let path = path.to_str().expect("temp path is not UTF-8");

    artifact.save(path).expect("Failed to save artifact");
    let loaded = GeneratedArtifact::from_file(path).expect("Failed to load artifact");

    assert_eq!(loaded.bot_name, "simple_bot");
    assert_eq!(loaded.code, result.code);
    assert_eq!(loaded.metadata, result.metadata);
    assert!(loaded.errors.is_empty());
}

#[test]
fn test_artifact_rejects_garbage_bytes() {
    let error = GeneratedArtifact::from_bytes(&[0xff, 0x00, 0x13, 0x37]);
    assert!(error.is_err());
}

#[test]
fn test_admin_node_broadcasts_to_groups() {
    let mut bot = simple_bot();
    bot.groups = vec!["-100999".to_string()];
    let mut report = node("report", NodeType::Admin, "Новая заявка");
    report.data.enable_auto_transition = false;
    bot.nodes[0].data.buttons.push(goto_button("Заявка", "report"));
    bot.nodes.push(report);

    let result = Generator::builder(bot).build().generate();
    assert!(result.success);
    assert!(result.code.contains("for group_id in GROUP_IDS:"));
    assert!(result.code.contains("await bot.send_message(group_id, text)"));
}
