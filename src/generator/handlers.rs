//! Handler state-machine generation.
//!
//! For every node in the union of {nodes with inline/callback buttons} and
//! {IDs referenced by any button, conditional branch or auto-transition}, this
//! module synthesizes one self-contained event handler: callback-pattern
//! matching, de-duplication bookkeeping, multi-select accumulation, conditional
//! message evaluation, keyboard synthesis, media dispatch, auto-transition
//! resolution and post-action redirection.

use crate::bot::{BotNode, ButtonAction, ConditionalMessage, LogicOperator, NodeType};
use crate::emit::{interpolate_call, node_end_marker, node_start_marker, py_str, sanitize_identifier};
use crate::generator::context::GenerationContext;
use crate::generator::keyboard::{
    self, ButtonRef, collect_buttons, done_payload, emit_keyboard, emit_multiselect_support,
    goto_payload, is_reply_keyboard, selection_prefix,
};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use tracing::{debug, warn};

/// How the handler is entered, which decides the decorator stack.
enum EntryKind {
    Start,
    Command(String),
    Callback,
}

/// One entry of a node's button-value capture table:
/// payload -> (source variable, button caption, optional redirect).
struct CaptureEntry {
    payload: String,
    variable: String,
    value: String,
    redirect: Option<String>,
}

pub(super) struct HandlerGenerator<'a> {
    ctx: &'a GenerationContext,
    /// De-duplication set: at most one handler is emitted per node ID, even
    /// when a node is reachable through several routes.
    processed: AHashSet<String>,
    /// Target node ID -> capture table for buttons pointing at it.
    captures: AHashMap<String, Vec<CaptureEntry>>,
    /// Target node ID -> payloads of hide-after-click buttons pointing at it.
    hide_payloads: AHashMap<String, Vec<String>>,
}

impl<'a> HandlerGenerator<'a> {
    pub(super) fn new(ctx: &'a GenerationContext) -> Self {
        let mut captures: AHashMap<String, Vec<CaptureEntry>> = AHashMap::new();
        let mut hide_payloads: AHashMap<String, Vec<String>> = AHashMap::new();

        for node in &ctx.nodes {
            if node.data.is_multi_select() {
                continue;
            }
            for (index, button) in node.data.buttons.iter().enumerate() {
                if button.action != ButtonAction::Goto {
                    continue;
                }
                let Some(target) = &button.target else {
                    continue;
                };
                let payload = goto_payload(target, index);
                if button.hide_after_click {
                    hide_payloads
                        .entry(target.clone())
                        .or_default()
                        .push(payload.clone());
                }
                if button.skip_data_collection {
                    continue;
                }
                if let Some(variable) = &node.data.input_variable {
                    let redirect = node
                        .data
                        .continue_button_target
                        .as_ref()
                        .filter(|t| t.as_str() != target.as_str())
                        .cloned();
                    captures.entry(target.clone()).or_default().push(CaptureEntry {
                        payload,
                        variable: variable.clone(),
                        value: button.text.clone(),
                        redirect,
                    });
                }
            }
        }

        Self {
            ctx,
            processed: AHashSet::new(),
            captures,
            hide_payloads,
        }
    }

    /// IDs of every emitted node handler, for the dispatch table.
    pub(super) fn handled_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in &self.ctx.graph.all_node_ids {
            if self.processed.contains(id) {
                ids.push(id.clone());
            }
        }
        for id in &self.ctx.graph.referenced_targets {
            if self.processed.contains(id) && !ids.iter().any(|known| known == id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    /// Message-entry handlers: the start node and every command node.
    pub(super) fn message_handlers(&mut self) -> Result<Vec<String>, String> {
        let ctx = self.ctx;
        let mut fragments = Vec::new();

        if let Some(start) = ctx.start_node() {
            if !start.data.is_multi_select() && self.processed.insert(start.id.clone()) {
                fragments.push(self.emit_node_handler(start, EntryKind::Start));
            }
        }

        let command_nodes: Vec<&BotNode> = ctx
            .nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Command || n.data.command.is_some())
            .collect();
        for node in command_nodes {
            if node.data.is_multi_select() || self.processed.contains(&node.id) {
                continue;
            }
            let command = node
                .data
                .command
                .as_deref()
                .map(|c| c.trim_start_matches('/').to_string())
                .unwrap_or_else(|| sanitize_identifier(&node.id).to_lowercase());
            self.processed.insert(node.id.clone());
            fragments.push(self.emit_node_handler(node, EntryKind::Command(command)));
        }

        Ok(fragments)
    }

    /// Callback handlers: buttoned nodes first, then every referenced target
    /// that has not yet received a handler.
    pub(super) fn callback_handlers(&mut self) -> Result<Vec<String>, String> {
        let ctx = self.ctx;
        let mut fragments = Vec::new();

        for node in &ctx.nodes {
            if node.data.buttons.is_empty()
                || node.data.is_multi_select()
                || self.processed.contains(&node.id)
            {
                continue;
            }
            self.processed.insert(node.id.clone());
            fragments.push(self.emit_node_handler(node, EntryKind::Callback));
        }

        // Secondary pass over referenced IDs. The start sentinel was produced
        // by the primary pass and is never re-emitted here.
        for target in &ctx.graph.referenced_targets {
            if self.processed.contains(target) {
                continue;
            }
            match ctx.find_node(target) {
                Some(node) if node.data.is_multi_select() => continue,
                Some(node) => {
                    self.processed.insert(target.clone());
                    fragments.push(self.emit_node_handler(node, EntryKind::Callback));
                }
                None => {
                    warn!(target = %target, "referenced node does not exist, emitting fallback handler");
                    self.processed.insert(target.clone());
                    fragments.push(self.emit_missing_target_handler(target));
                }
            }
        }

        Ok(fragments)
    }

    /// Multi-select widget handlers.
    pub(super) fn multiselect_handlers(&mut self) -> Result<Vec<String>, String> {
        let mut fragments = Vec::new();
        for node in &self.ctx.nodes {
            if !node.data.is_multi_select() || self.processed.contains(&node.id) {
                continue;
            }
            self.processed.insert(node.id.clone());
            fragments.push(self.emit_multiselect_handler(node));
        }
        Ok(fragments)
    }

    /// Content-type collectors that feed the waiting-for-input state machine.
    pub(super) fn media_handlers(&mut self) -> Result<Vec<String>, String> {
        let mut wants_text = false;
        let mut wants_photo = false;
        let mut wants_video = false;
        let mut wants_audio = false;
        let mut wants_document = false;

        for node in &self.ctx.nodes {
            let data = &node.data;
            wants_text |= data.collect_text;
            wants_photo |= data.collect_photo;
            wants_video |= data.collect_video;
            wants_audio |= data.collect_audio;
            wants_document |= data.collect_document;
            // Reply-keyboard answers arrive as plain text messages.
            let buttons = collect_buttons(self.ctx, node);
            if data.input_variable.is_some() && is_reply_keyboard(data.keyboard_type, &buttons) {
                wants_text = true;
            }
        }

        let mut fragments = Vec::new();
        let collectors = [
            (wants_text, "TEXT", "text", "message.text"),
            (wants_photo, "PHOTO", "photo", "message.photo[-1].file_id"),
            (wants_video, "VIDEO", "video", "message.video.file_id"),
            (wants_audio, "AUDIO", "audio", "message.audio.file_id"),
            (wants_document, "DOCUMENT", "document", "message.document.file_id"),
        ];
        for (wanted, content_type, kind, value_expr) in collectors {
            if !wanted {
                continue;
            }
            fragments.push(format!(
                r#"@dp.message_handler(content_types=types.ContentTypes.{content_type})
async def handle_{kind}_input(message: types.Message):
    user_id = message.from_user.id
    pending = waiting_for_input.get(user_id)
    if not pending or "{kind}" not in pending["types"]:
        return
    set_user_variable(user_id, pending["variable"], {value_expr})
    waiting_for_input.pop(user_id, None)
    if pending.get("next"):
        await continue_to(pending["next"], message)"#,
            ));
        }
        Ok(fragments)
    }

    // --- Per-node emission ---

    /// Explicit auto-transition always wins; a node with no buttons and exactly
    /// one outgoing connection gets an implicit one.
    fn resolve_transition(&self, node: &BotNode) -> Option<String> {
        if node.data.enable_auto_transition {
            if let Some(target) = &node.data.auto_transition_to {
                return Some(target.clone());
            }
        }
        if node.data.buttons.is_empty() {
            if let Some(target) = self.ctx.graph.single_successor(&node.id) {
                return Some(target.to_string());
            }
        }
        None
    }

    fn decorator_stack(&self, node: &BotNode, entry: &EntryKind) -> Vec<String> {
        let mut decorators = Vec::new();
        let matcher = format!(
            "lambda c: c.data == \"{id}\" or c.data.startswith(\"{id}_btn_\")",
            id = node.id
        );
        match entry {
            EntryKind::Start => {
                decorators.push("@dp.message_handler(commands=[\"start\"])".to_string());
                decorators.push(format!("@dp.callback_query_handler({})", matcher));
            }
            EntryKind::Command(command) => {
                decorators.push(format!("@dp.message_handler(commands=[\"{}\"])", command));
                decorators.push(format!(
                    "@dp.callback_query_handler(lambda c: c.data == \"{}\" or c.data == \"{}\" or c.data.startswith(\"{}_btn_\"))",
                    keyboard::command_payload(command),
                    node.id,
                    node.id
                ));
            }
            EntryKind::Callback => {
                decorators.push(format!("@dp.callback_query_handler({})", matcher));
            }
        }
        decorators
    }

    fn emit_node_handler(&self, node: &BotNode, entry: EntryKind) -> String {
        debug!(node = %node.id, "emitting node handler");
        let ident = sanitize_identifier(&node.id);
        let mut lines: Vec<String> = Vec::new();

        lines.push(node_start_marker(&node.id));

        let capture_entries = self.captures.get(&node.id);
        if let Some(entries) = capture_entries {
            lines.push(format!("BUTTON_VALUES_{} = {{", ident));
            for entry in entries {
                let redirect = match &entry.redirect {
                    Some(target) => py_str(target),
                    None => "None".to_string(),
                };
                lines.push(format!(
                    "    \"{}\": ({}, {}, {}),",
                    entry.payload,
                    py_str(&entry.variable),
                    py_str(&entry.value),
                    redirect
                ));
            }
            lines.push("}".to_string());
            lines.push(String::new());
            lines.push(String::new());
        }

        lines.extend(self.decorator_stack(node, &entry));
        lines.push(format!("async def handle_{}(event):", ident));
        self.emit_prologue(&mut lines);
        self.emit_hide_guard(node, &mut lines);
        self.emit_capture_block(node, capture_entries.map(Vec::as_slice), &mut lines);

        let conditionals = enabled_conditionals(node);
        let has_conditionals = !conditionals.is_empty();
        if has_conditionals {
            self.emit_conditional_chain(node, &conditionals, &mut lines);
            push_line(&mut lines, 1, "if not shown_conditional:");
            self.emit_default_render(node, 2, &mut lines);
        } else {
            self.emit_default_render(node, 1, &mut lines);
        }

        self.emit_auto_transition(node, has_conditionals, &mut lines);

        lines.push(node_end_marker(&node.id));
        lines.join("\n")
    }

    fn emit_prologue(&self, lines: &mut Vec<String>) {
        push_line(lines, 1, "user_id = event.from_user.id");
        push_line(lines, 1, "chat_id = event_chat_id(event)");
        push_line(lines, 1, "if isinstance(event, types.CallbackQuery):");
        push_line(lines, 2, "try:");
        push_line(lines, 3, "await event.answer()");
        push_line(lines, 2, "except Exception:");
        push_line(lines, 3, "pass");
    }

    /// Hide-after-click: taps on hide-marked buttons drop the originating
    /// message and terminate the handler.
    fn emit_hide_guard(&self, node: &BotNode, lines: &mut Vec<String>) {
        let Some(payloads) = self.hide_payloads.get(&node.id) else {
            return;
        };
        let tuple = payloads.iter().map(|p| format!("\"{}\"", p)).join(", ");
        push_line(
            lines,
            1,
            format!("if getattr(event, \"data\", None) in ({},):", tuple),
        );
        push_line(lines, 2, "try:");
        push_line(lines, 3, "await event.message.delete()");
        push_line(lines, 2, "except Exception:");
        push_line(lines, 3, "pass");
        push_line(lines, 2, "return");
    }

    /// Persists the clicked button's value under the source node's input
    /// variable. Deferred while a conditional keyboard is pending.
    fn emit_capture_block(
        &self,
        node: &BotNode,
        entries: Option<&[CaptureEntry]>,
        lines: &mut Vec<String>,
    ) {
        let Some(entries) = entries else {
            return;
        };
        if entries.is_empty() {
            return;
        }
        let ident = sanitize_identifier(&node.id);
        push_line(
            lines,
            1,
            format!(
                "captured = BUTTON_VALUES_{}.get(getattr(event, \"data\", None))",
                ident
            ),
        );
        push_line(lines, 1, "if captured is not None:");
        push_line(lines, 2, "if user_id in conditional_pending:");
        push_line(lines, 3, "conditional_pending.discard(user_id)");
        push_line(lines, 2, "else:");
        push_line(lines, 3, "set_user_variable(user_id, captured[0], captured[1])");
        push_line(lines, 2, "if captured[2]:");
        push_line(lines, 3, "await continue_to(captured[2], event)");
        push_line(lines, 3, "return");
    }

    /// Conditional messages as a single first-match if/elif chain, highest
    /// priority first.
    fn emit_conditional_chain(
        &self,
        node: &BotNode,
        conditionals: &[&ConditionalMessage],
        lines: &mut Vec<String>,
    ) {
        push_line(lines, 1, "store = get_user_store(user_id)");
        push_line(lines, 1, "shown_conditional = False");

        for (position, conditional) in conditionals.iter().enumerate() {
            let joiner = match conditional.logic_operator {
                LogicOperator::And => " and ",
                LogicOperator::Or => " or ",
            };
            let predicate = conditional
                .variable_names
                .iter()
                .map(|name| format!("{} in store", py_str(name)))
                .join(joiner);
            let head = if position == 0 { "if" } else { "elif" };
            push_line(lines, 1, format!("{} {}:", head, predicate));
            push_line(
                lines,
                2,
                format!("text = {}", interpolate_call(&conditional.message_text)),
            );

            let button_refs: Vec<ButtonRef<'_>> = conditional
                .buttons
                .iter()
                .enumerate()
                .map(|(index, button)| ButtonRef {
                    button,
                    owner_id: node.id.as_str(),
                    index,
                })
                .collect();
            match emit_keyboard(&button_refs, conditional.keyboard_type, 2) {
                Some(keyboard_lines) => {
                    lines.extend(keyboard_lines);
                    push_line(lines, 2, "await send_or_edit(event, chat_id, text, keyboard)");
                    // Pending user choice: defers captures and blocks transitions.
                    push_line(lines, 2, "conditional_pending.add(user_id)");
                }
                None => {
                    push_line(lines, 2, "await send_or_edit(event, chat_id, text)");
                }
            }
            push_line(lines, 2, "shown_conditional = True");

            if conditional.wait_for_input {
                let variable = conditional
                    .input_variable
                    .as_deref()
                    .or(node.data.input_variable.as_deref())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("input_{}", sanitize_identifier(&node.id)));
                let next = match self.resolve_transition(node) {
                    Some(target) => py_str(&target),
                    None => "None".to_string(),
                };
                push_line(
                    lines,
                    2,
                    format!(
                        "waiting_for_input[user_id] = {{\"variable\": {}, \"next\": {}, \"types\": [\"text\"]}}",
                        py_str(&variable),
                        next
                    ),
                );
            }
        }
    }

    /// The node's default message/keyboard/media path.
    fn emit_default_render(&self, node: &BotNode, depth: usize, lines: &mut Vec<String>) {
        let text = node.data.message_text.clone().unwrap_or_default();
        push_line(lines, depth, format!("text = {}", interpolate_call(&text)));

        let buttons = collect_buttons(self.ctx, node);
        let keyboard_lines = emit_keyboard(&buttons, node.data.keyboard_type, depth);
        let has_keyboard = keyboard_lines.is_some();
        if let Some(keyboard_lines) = keyboard_lines {
            lines.extend(keyboard_lines);
        }
        let keyboard_arg = if has_keyboard { ", keyboard" } else { "" };

        // Media dispatch: attached variables and static URLs render through the
        // media-assembly helper; the first attachment carries caption and keyboard.
        let mut media_sends: Vec<(String, String)> = Vec::new();
        if let Some((kind, url)) = self.ctx.graph.static_media.get(&node.id) {
            media_sends.push((kind.as_str().to_string(), py_str(url)));
        }
        for attachment in &node.data.attached_media {
            let kind = self
                .ctx
                .graph
                .media_variables
                .get(&attachment.variable)
                .map(|m| m.kind)
                .unwrap_or(attachment.kind);
            media_sends.push((
                kind.as_str().to_string(),
                format!("get_user_store(user_id).get({})", py_str(&attachment.variable)),
            ));
        }

        if media_sends.is_empty() {
            if has_keyboard && is_reply_keyboard(node.data.keyboard_type, &buttons) {
                // Reply markup cannot ride on an edit.
                push_line(
                    lines,
                    depth,
                    "await bot.send_message(chat_id, text, reply_markup=keyboard)",
                );
            } else {
                push_line(
                    lines,
                    depth,
                    format!("await send_or_edit(event, chat_id, text{})", keyboard_arg),
                );
            }
        } else {
            for (position, (kind, source)) in media_sends.iter().enumerate() {
                if position == 0 {
                    push_line(
                        lines,
                        depth,
                        format!(
                            "await send_media_with_caption(chat_id, \"{}\", {}, text{})",
                            kind, source, keyboard_arg
                        ),
                    );
                } else {
                    push_line(
                        lines,
                        depth,
                        format!(
                            "await send_media_with_caption(chat_id, \"{}\", {}, None)",
                            kind, source
                        ),
                    );
                }
            }
        }

        if node.node_type == NodeType::Admin && !self.ctx.config.groups.is_empty() {
            push_line(lines, depth, "for group_id in GROUP_IDS:");
            push_line(lines, depth + 1, "try:");
            push_line(lines, depth + 2, "await bot.send_message(group_id, text)");
            push_line(lines, depth + 1, "except Exception as exc:");
            push_line(
                lines,
                depth + 2,
                "logging.error(\"group send failed: %s\", exc)",
            );
        }

        let arms_text_wait = node.data.input_variable.is_some()
            && has_keyboard
            && is_reply_keyboard(node.data.keyboard_type, &buttons);
        if node.data.collects_input() || arms_text_wait {
            let variable = node
                .data
                .input_variable
                .clone()
                .unwrap_or_else(|| format!("input_{}", sanitize_identifier(&node.id)));
            if node.data.input_variable.is_none() {
                warn!(node = %node.id, "input collection without inputVariable, using fallback name");
            }
            let mut types: Vec<&str> = Vec::new();
            if node.data.collect_text || arms_text_wait {
                types.push("text");
            }
            if node.data.collect_photo {
                types.push("photo");
            }
            if node.data.collect_video {
                types.push("video");
            }
            if node.data.collect_audio {
                types.push("audio");
            }
            if node.data.collect_document {
                types.push("document");
            }
            let types_list = types.iter().map(|t| format!("\"{}\"", t)).join(", ");
            let next = match self.resolve_transition(node) {
                Some(target) => py_str(&target),
                None => "None".to_string(),
            };
            push_line(
                lines,
                depth,
                format!(
                    "waiting_for_input[user_id] = {{\"variable\": {}, \"next\": {}, \"types\": [{}]}}",
                    py_str(&variable),
                    next,
                    types_list
                ),
            );
        }
    }

    /// Auto-transition as a direct tail-call of the target's handler, guarded
    /// at runtime: never while a conditional keyboard is pending a choice and
    /// never while the node is waiting for user input.
    fn emit_auto_transition(&self, node: &BotNode, has_conditionals: bool, lines: &mut Vec<String>) {
        let Some(target) = self.resolve_transition(node) else {
            return;
        };
        if self.ctx.find_node(&target).is_none() {
            warn!(node = %node.id, target = %target, "auto-transition target not found");
            push_line(lines, 1, "# auto-transition target not found - end navigation");
            push_line(
                lines,
                1,
                format!(
                    "logging.warning(\"Navigation target '{}' is not defined\")",
                    target
                ),
            );
            return;
        }
        let guard = if has_conditionals {
            "if not shown_conditional and user_id not in waiting_for_input:".to_string()
        } else {
            "if user_id not in waiting_for_input:".to_string()
        };
        push_line(lines, 1, guard);
        push_line(
            lines,
            2,
            format!("await handle_{}(event)", sanitize_identifier(&target)),
        );
    }

    /// A handler for a referenced ID with no backing node: acknowledge and end
    /// navigation instead of leaving the payload dangling.
    fn emit_missing_target_handler(&self, target: &str) -> String {
        let ident = sanitize_identifier(target);
        format!(
            r#"@dp.callback_query_handler(lambda c: c.data == "{target}" or c.data.startswith("{target}_btn_"))
async def handle_{ident}(event):
    if isinstance(event, types.CallbackQuery):
        try:
            await event.answer()
        except Exception:
            pass
    # target not found - end navigation
    logging.warning("Navigation target '{target}' is not defined")"#,
        )
    }

    fn emit_multiselect_handler(&self, node: &BotNode) -> String {
        debug!(node = %node.id, "emitting multi-select handler");
        let ident = sanitize_identifier(&node.id);
        let done = done_payload(&node.id);
        let ms_prefix = selection_prefix(&node.id);
        let variable = node
            .data
            .multi_select_variable
            .clone()
            .unwrap_or_else(|| format!("selected_{}", ident));
        if node.data.multi_select_variable.is_none() {
            warn!(node = %node.id, "multi-select node without multiSelectVariable, using fallback name");
        }

        let mut lines: Vec<String> = Vec::new();
        lines.push(node_start_marker(&node.id));
        for fragment in emit_multiselect_support(node) {
            lines.push(fragment);
            lines.push(String::new());
            lines.push(String::new());
        }

        lines.push(format!(
            "@dp.callback_query_handler(lambda c: c.data == \"{id}\" or c.data.startswith(\"{id}_btn_\") or c.data.startswith(\"{ms}\") or c.data == \"{done}\")",
            id = node.id,
            ms = ms_prefix,
            done = done
        ));
        lines.push(format!("async def handle_{}(event):", ident));
        self.emit_prologue(&mut lines);
        push_line(
            &mut lines,
            1,
            format!(
                "selections = multi_select_state.setdefault(user_id, {{}}).setdefault(\"{}\", set())",
                node.id
            ),
        );
        push_line(&mut lines, 1, "data = getattr(event, \"data\", None)");

        // Commit: merge with the previously persisted value (set union, so a
        // repeated Done stays idempotent), persist, clear transient state.
        push_line(&mut lines, 1, format!("if data == \"{}\":", done));
        push_line(&mut lines, 2, "merged = set(selections)");
        push_line(
            &mut lines,
            2,
            format!(
                "previous = get_user_store(user_id).get({}, \"\")",
                py_str(&variable)
            ),
        );
        push_line(&mut lines, 2, "if previous:");
        push_line(
            &mut lines,
            3,
            "merged.update(part.strip() for part in previous.split(\",\") if part.strip())",
        );
        push_line(
            &mut lines,
            2,
            format!(
                "set_user_variable(user_id, {}, \", \".join(sorted(merged)))",
                py_str(&variable)
            ),
        );
        push_line(
            &mut lines,
            2,
            format!("multi_select_state[user_id].pop(\"{}\", None)", node.id),
        );
        match &node.data.continue_button_target {
            Some(target) if self.ctx.find_node(target).is_some() => {
                push_line(
                    &mut lines,
                    2,
                    format!("await handle_{}(event)", sanitize_identifier(target)),
                );
            }
            Some(target) => {
                warn!(node = %node.id, target = %target, "continue target not found");
                push_line(&mut lines, 2, "# target not found - end navigation");
                push_line(
                    &mut lines,
                    2,
                    format!(
                        "logging.warning(\"Navigation target '{}' is not defined\")",
                        target
                    ),
                );
            }
            None => {
                push_line(
                    &mut lines,
                    2,
                    "await bot.send_message(chat_id, \"Выбор сохранен\")",
                );
            }
        }
        push_line(&mut lines, 2, "return");

        // Toggle: membership flip plus keyboard re-render. No transition on an
        // individual selection tap.
        push_line(
            &mut lines,
            1,
            format!("if data is not None and data.startswith(\"{}\"):", ms_prefix),
        );
        push_line(
            &mut lines,
            2,
            format!("option = MS_OPTIONS_{}.get(data)", ident),
        );
        push_line(&mut lines, 2, "if option is not None:");
        push_line(&mut lines, 3, "if option in selections:");
        push_line(&mut lines, 4, "selections.discard(option)");
        push_line(&mut lines, 3, "else:");
        push_line(&mut lines, 4, "selections.add(option)");
        push_line(&mut lines, 2, "message = getattr(event, \"message\", None)");
        push_line(&mut lines, 2, "if message is not None:");
        push_line(&mut lines, 3, "try:");
        push_line(
            &mut lines,
            4,
            format!(
                "await message.edit_reply_markup(reply_markup=build_keyboard_{}(selections))",
                ident
            ),
        );
        push_line(&mut lines, 3, "except Exception:");
        push_line(&mut lines, 4, "pass");
        push_line(&mut lines, 2, "return");

        // Initial entry renders the node text with the current selection state.
        let text = node.data.message_text.clone().unwrap_or_default();
        push_line(&mut lines, 1, format!("text = {}", interpolate_call(&text)));
        push_line(
            &mut lines,
            1,
            format!(
                "await send_or_edit(event, chat_id, text, build_keyboard_{}(selections))",
                ident
            ),
        );

        lines.push(node_end_marker(&node.id));
        lines.join("\n")
    }
}

fn enabled_conditionals(node: &BotNode) -> Vec<&ConditionalMessage> {
    let mut conditionals: Vec<&ConditionalMessage> = node
        .data
        .conditional_messages
        .iter()
        .filter(|c| c.enabled && !c.variable_names.is_empty())
        .collect();
    conditionals.sort_by_key(|c| std::cmp::Reverse(c.priority));
    conditionals
}

fn push_line(lines: &mut Vec<String>, depth: usize, text: impl AsRef<str>) {
    lines.push(format!("{}{}", "    ".repeat(depth), text.as_ref()));
}
