//! Keyboard synthesis.
//!
//! Decision table: multi-select > reply-type buttons > inline buttons > none.
//! Callback payload formats are part of the wire contract consumed by the
//! generated dispatch lambdas:
//!
//! - `goto` buttons      -> `<target>_btn_<index>`
//! - `command` buttons   -> `cmd_<command-without-slash>`
//! - `selection` buttons -> `ms_<shortNodeId>_<shortValue>`
//! - multi-select commit -> `done_<shortNodeId>`

use crate::bot::{BotNode, Button, ButtonAction, KeyboardKind};
use crate::emit::{py_str, sanitize_identifier, short_id, strip_html};
use crate::generator::context::GenerationContext;
use itertools::Itertools;
use tracing::warn;

/// Length cap for `ms_` payload halves. Keeps the full payload inside the
/// platform's 64-byte callback-data limit.
const MS_SHORT_LEN: usize = 8;
/// Length cap for the `done_` sentinel suffix.
const DONE_SHORT_LEN: usize = 10;

pub(super) fn goto_payload(target: &str, index: usize) -> String {
    format!("{}_btn_{}", target, index)
}

pub(super) fn command_payload(command: &str) -> String {
    format!("cmd_{}", command.trim_start_matches('/'))
}

pub(super) fn selection_payload(node_id: &str, value: &str) -> String {
    format!(
        "ms_{}_{}",
        short_id(node_id, MS_SHORT_LEN),
        short_id(value, MS_SHORT_LEN)
    )
}

/// The payload prefix shared by all of a node's selection buttons.
pub(super) fn selection_prefix(node_id: &str) -> String {
    format!("ms_{}_", short_id(node_id, MS_SHORT_LEN))
}

pub(super) fn done_payload(node_id: &str) -> String {
    format!("done_{}", short_id(node_id, DONE_SHORT_LEN))
}

/// Sentinel payload for buttons whose routing information is missing. The
/// generated program answers these with a "not configured" notice instead of
/// the generation failing.
pub(super) const UNCONFIGURED_PAYLOAD: &str = "unconfigured";

/// A button together with the node that owns it. Payload indices are always
/// relative to the owning node's button list, so merged keyboards keep the
/// capture semantics of their source node.
pub(super) struct ButtonRef<'a> {
    pub button: &'a Button,
    pub owner_id: &'a str,
    pub index: usize,
}

/// The node's own buttons plus, when the composite keyboard strategy is
/// configured, the buttons of the referenced node.
pub(super) fn collect_buttons<'a>(
    ctx: &'a GenerationContext,
    node: &'a BotNode,
) -> Vec<ButtonRef<'a>> {
    let mut refs: Vec<ButtonRef<'a>> = node
        .data
        .buttons
        .iter()
        .enumerate()
        .map(|(index, button)| ButtonRef {
            button,
            owner_id: node.id.as_str(),
            index,
        })
        .collect();

    if let Some(merge_id) = &node.data.merge_keyboard_from {
        match ctx.find_node(merge_id) {
            Some(merged) => {
                refs.extend(
                    merged
                        .data
                        .buttons
                        .iter()
                        .enumerate()
                        .map(|(index, button)| ButtonRef {
                            button,
                            owner_id: merged.id.as_str(),
                            index,
                        }),
                );
            }
            None => warn!(
                node = %node.id,
                merge = %merge_id,
                "composite keyboard source not found, keeping base keyboard"
            ),
        }
    }

    refs
}

/// Column count from a button-count/text-length heuristic: long captions get a
/// full row, short caption pairs share one.
pub(super) fn keyboard_columns<'a>(texts: impl IntoIterator<Item = &'a str>) -> usize {
    let texts: Vec<&str> = texts.into_iter().collect();
    if texts.is_empty() {
        return 1;
    }
    if texts.iter().any(|t| t.chars().count() > 18) {
        return 1;
    }
    if texts.len() <= 2 { texts.len() } else { 2 }
}

/// Reply keyboards are used when explicitly requested or when any button needs
/// a contact/location request, which inline keyboards cannot carry.
pub(super) fn is_reply_keyboard(
    keyboard_type: Option<KeyboardKind>,
    buttons: &[ButtonRef<'_>],
) -> bool {
    keyboard_type == Some(KeyboardKind::Reply)
        || buttons.iter().any(|b| {
            matches!(
                b.button.action,
                ButtonAction::Contact | ButtonAction::Location
            )
        })
}

fn inline_button_expr(button_ref: &ButtonRef<'_>) -> String {
    let button = button_ref.button;
    let caption = py_str(&strip_html(&button.text));
    match button.action {
        ButtonAction::Url => match &button.url {
            Some(url) => format!("InlineKeyboardButton({}, url={})", caption, py_str(url)),
            None => {
                warn!(owner = %button_ref.owner_id, text = %button.text, "url button without url");
                format!(
                    "InlineKeyboardButton({}, callback_data=\"{}\")",
                    caption, UNCONFIGURED_PAYLOAD
                )
            }
        },
        ButtonAction::Command => {
            let command = button.command.as_deref().or(button.target.as_deref());
            match command {
                Some(command) => format!(
                    "InlineKeyboardButton({}, callback_data=\"{}\")",
                    caption,
                    command_payload(command)
                ),
                None => {
                    warn!(owner = %button_ref.owner_id, text = %button.text, "command button without command");
                    format!(
                        "InlineKeyboardButton({}, callback_data=\"{}\")",
                        caption, UNCONFIGURED_PAYLOAD
                    )
                }
            }
        }
        // Goto and everything else routes through a callback payload.
        _ => match &button.target {
            Some(target) => format!(
                "InlineKeyboardButton({}, callback_data=\"{}\")",
                caption,
                goto_payload(target, button_ref.index)
            ),
            None => {
                warn!(owner = %button_ref.owner_id, text = %button.text, "goto button without target, falling back");
                format!(
                    "InlineKeyboardButton({}, callback_data=\"{}\")",
                    caption, UNCONFIGURED_PAYLOAD
                )
            }
        },
    }
}

fn reply_button_expr(button_ref: &ButtonRef<'_>) -> String {
    let caption = py_str(&strip_html(&button_ref.button.text));
    match button_ref.button.action {
        ButtonAction::Contact => format!("KeyboardButton({}, request_contact=True)", caption),
        ButtonAction::Location => format!("KeyboardButton({}, request_location=True)", caption),
        _ => format!("KeyboardButton({})", caption),
    }
}

/// Emits the lines that build a `keyboard` variable for a plain (non
/// multi-select) node at the given indent depth. Returns `None` when the node
/// renders without a keyboard.
pub(super) fn emit_keyboard(
    buttons: &[ButtonRef<'_>],
    keyboard_type: Option<KeyboardKind>,
    indent: usize,
) -> Option<Vec<String>> {
    if buttons.is_empty() {
        return None;
    }
    let pad = "    ".repeat(indent);
    let mut lines = Vec::new();

    let columns = keyboard_columns(buttons.iter().map(|b| b.button.text.as_str()));
    if is_reply_keyboard(keyboard_type, buttons) {
        lines.push(format!(
            "{}keyboard = ReplyKeyboardMarkup(resize_keyboard=True, one_time_keyboard=True)",
            pad
        ));
        for row in &buttons.iter().chunks(columns) {
            let exprs = row.map(reply_button_expr).join(", ");
            lines.push(format!("{}keyboard.row({})", pad, exprs));
        }
    } else {
        lines.push(format!("{}keyboard = InlineKeyboardMarkup()", pad));
        for row in &buttons.iter().chunks(columns) {
            let exprs = row.map(inline_button_expr).join(", ");
            lines.push(format!("{}keyboard.row({})", pad, exprs));
        }
    }
    Some(lines)
}

/// Emits the selection-options dict and the keyboard builder function for a
/// multi-select node. The builder re-renders check-marks from the session's
/// current selection set on every call.
pub(super) fn emit_multiselect_support(node: &BotNode) -> Vec<String> {
    let ident = sanitize_identifier(&node.id);
    let columns = keyboard_columns(
        node.data
            .buttons
            .iter()
            .filter(|b| b.action == ButtonAction::Selection)
            .map(|b| b.text.as_str()),
    );

    let mut dict_lines = vec![format!("MS_OPTIONS_{} = {{", ident)];
    for (index, button) in node.data.buttons.iter().enumerate() {
        if button.action != ButtonAction::Selection {
            continue;
        }
        // Non-ASCII captions would collapse under the short-ID charset, so
        // keys come from the target ID or the button position.
        let key = button
            .target
            .clone()
            .unwrap_or_else(|| index.to_string());
        dict_lines.push(format!(
            "    \"{}\": {},",
            selection_payload(&node.id, &key),
            py_str(&strip_html(&button.text))
        ));
    }
    dict_lines.push("}".to_string());

    let builder = format!(
        r#"def build_keyboard_{ident}(selections):
    keyboard = InlineKeyboardMarkup()
    row = []
    for payload, option in MS_OPTIONS_{ident}.items():
        caption = ("✅ " + option) if option in selections else option
        row.append(InlineKeyboardButton(caption, callback_data=payload))
        if len(row) == {columns}:
            keyboard.row(*row)
            row = []
    if row:
        keyboard.row(*row)
    keyboard.row(InlineKeyboardButton("Готово", callback_data="{done}"))
    return keyboard"#,
        ident = ident,
        columns = columns,
        done = done_payload(&node.id),
    );

    vec![dict_lines.join("\n"), builder]
}
