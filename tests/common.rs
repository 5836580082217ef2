//! Common test utilities for building bot definitions.
use botforge::prelude::*;

/// Creates a node with the given type and message text.
#[allow(dead_code)]
pub fn node(id: &str, node_type: NodeType, text: &str) -> BotNode {
    BotNode {
        id: id.to_string(),
        node_type,
        data: NodeData {
            message_text: Some(text.to_string()),
            ..Default::default()
        },
    }
}

#[allow(dead_code)]
pub fn goto_button(text: &str, target: &str) -> Button {
    Button {
        text: text.to_string(),
        action: ButtonAction::Goto,
        target: Some(target.to_string()),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn selection_button(text: &str) -> Button {
    Button {
        text: text.to_string(),
        action: ButtonAction::Selection,
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn definition(name: &str, nodes: Vec<BotNode>, connections: Vec<Connection>) -> BotDefinition {
    BotDefinition {
        name: name.to_string(),
        nodes,
        connections,
        ..Default::default()
    }
}

/// A start node greeting plus one message node reached by a button.
///
/// Logic: `start_1 --[Дальше]--> info`
#[allow(dead_code)]
pub fn simple_bot() -> BotDefinition {
    let mut start = node("start_1", NodeType::Start, "Привет!");
    start.data.buttons.push(goto_button("Дальше", "info"));
    let info = node("info", NodeType::Message, "Вся информация здесь");
    definition("simple_bot", vec![start, info], vec![])
}

/// The minimal single-node graph: one start node, no buttons, no connections.
#[allow(dead_code)]
pub fn single_node_bot() -> BotDefinition {
    definition(
        "single_bot",
        vec![node("start_1", NodeType::Start, "Hi")],
        vec![],
    )
}

/// Three nodes wired into a button cycle: `a -> b -> c -> a`.
#[allow(dead_code)]
pub fn cyclic_bot() -> BotDefinition {
    let mut a = node("a", NodeType::Start, "Node A");
    a.data.buttons.push(goto_button("To B", "b"));
    let mut b = node("b", NodeType::Message, "Node B");
    b.data.buttons.push(goto_button("To C", "c"));
    let mut c = node("c", NodeType::Message, "Node C");
    c.data.buttons.push(goto_button("To A", "a"));
    definition("cyclic_bot", vec![a, b, c], vec![])
}

/// A multi-select widget node with two options, committing into `interests`
/// and continuing to a thank-you node.
#[allow(dead_code)]
pub fn multiselect_bot() -> BotDefinition {
    let mut start = node("start_1", NodeType::Start, "Выбери интересы");
    start.data.buttons.push(goto_button("Начать", "poll"));

    let mut poll = node("poll", NodeType::Message, "Что тебе интересно?");
    poll.data.allow_multiple_selection = true;
    poll.data.multi_select_variable = Some("interests".to_string());
    poll.data.continue_button_target = Some("thanks".to_string());
    poll.data.buttons.push(selection_button("Спорт"));
    poll.data.buttons.push(selection_button("Музыка"));

    let thanks = node("thanks", NodeType::Message, "Спасибо!");
    definition("multiselect_bot", vec![start, poll, thanks], vec![])
}

/// A node with two conditional messages of different priorities plus a
/// default text.
#[allow(dead_code)]
pub fn conditional_bot() -> BotDefinition {
    let mut start = node("start_1", NodeType::Start, "Меню");
    start.data.buttons.push(goto_button("Профиль", "profile"));

    let mut profile = node("profile", NodeType::Message, "Профиль не заполнен");
    profile.data.conditional_messages = vec![
        ConditionalMessage {
            condition: ConditionKind::VariableExists,
            variable_names: vec!["name".to_string()],
            logic_operator: LogicOperator::And,
            priority: 1,
            message_text: "Привет, {name}".to_string(),
            buttons: vec![],
            keyboard_type: None,
            enabled: true,
            wait_for_input: false,
            input_variable: None,
        },
        ConditionalMessage {
            condition: ConditionKind::VariableExists,
            variable_names: vec!["name".to_string(), "age".to_string()],
            logic_operator: LogicOperator::And,
            priority: 5,
            message_text: "Полный профиль: {name}, {age}".to_string(),
            buttons: vec![],
            keyboard_type: None,
            enabled: true,
            wait_for_input: false,
            input_variable: None,
        },
    ];

    definition("conditional_bot", vec![start, profile], vec![])
}
