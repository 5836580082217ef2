//! Tests for the handler state-machine generator: de-duplication, multi-select
//! accumulation, conditional chains, transitions, capture and media dispatch.
mod common;
use botforge::prelude::*;
use common::*;

fn generate(bot: BotDefinition) -> GenerationResult {
    let result = Generator::builder(bot).build().generate();
    assert!(result.success, "errors: {:?}", result.errors);
    result
}

#[test]
fn test_cyclic_graph_emits_one_handler_per_node() {
    let result = generate(cyclic_bot());
    let code = &result.code;

    for id in ["a", "b", "c"] {
        assert_eq!(
            code.matches(&format!("async def handle_{}(event):", id)).count(),
            1,
            "node '{}' must get exactly one handler",
            id
        );
    }
    // Each handler references the next node's payload; generation terminates
    // without recursing through the cycle.
    assert!(code.contains("callback_data=\"b_btn_0\""));
    assert!(code.contains("callback_data=\"c_btn_0\""));
    assert!(code.contains("callback_data=\"a_btn_0\""));
}

#[test]
fn test_multiselect_accumulation_and_commit() {
    let result = generate(multiselect_bot());
    let code = &result.code;

    // Options dict keyed by short payloads, captions preserved.
    assert!(code.contains("MS_OPTIONS_poll = {"));
    assert!(code.contains("\"ms_poll_n0\": \"Спорт\","));
    assert!(code.contains("\"ms_poll_n1\": \"Музыка\","));

    // Toggling re-renders the same keyboard; no transition on a selection tap.
    assert!(code.contains("selections.discard(option)"));
    assert!(code.contains("selections.add(option)"));
    assert!(code.contains("edit_reply_markup(reply_markup=build_keyboard_poll(selections))"));

    // The Done sentinel merges with the previously persisted value (set
    // union), persists and clears transient state.
    assert!(code.contains("if data == \"done_poll\":"));
    assert!(code.contains("merged = set(selections)"));
    assert!(code.contains("merged.update(part.strip() for part in previous.split(\",\") if part.strip())"));
    assert!(code.contains("set_user_variable(user_id, \"interests\", \", \".join(sorted(merged)))"));
    assert!(code.contains("multi_select_state[user_id].pop(\"poll\", None)"));

    // Commit continues into the configured target's own handler.
    assert!(code.contains("await handle_thanks(event)"));

    // The commit keyboard carries the Done button.
    assert!(code.contains("InlineKeyboardButton(\"Готово\", callback_data=\"done_poll\")"));
}

#[test]
fn test_multiselect_without_continue_target_confirms() {
    let mut bot = multiselect_bot();
    bot.nodes[1].data.continue_button_target = None;
    let result = generate(bot);
    assert!(result.code.contains("await bot.send_message(chat_id, \"Выбор сохранен\")"));
}

#[test]
fn test_conditional_chain_is_priority_ordered() {
    let result = generate(conditional_bot());
    let code = &result.code;

    assert!(code.contains("shown_conditional = False"));
    // Priority 5 renders first, priority 1 in the elif arm.
    let high = code
        .find("substitute_variables(\"Полный профиль: {name}, {age}\", user_id)")
        .expect("high-priority branch missing");
    let low = code
        .find("substitute_variables(\"Привет, {name}\", user_id)")
        .expect("low-priority branch missing");
    assert!(high < low, "branches must be ordered by descending priority");

    assert!(code.contains("if \"name\" in store and \"age\" in store:"));
    assert!(code.contains("elif \"name\" in store:"));

    // The default path only renders when no condition matched.
    assert!(code.contains("if not shown_conditional:"));
    assert!(code.contains("substitute_variables(\"Профиль не заполнен\", user_id)"));
}

#[test]
fn test_conditional_or_operator() {
    let mut bot = conditional_bot();
    bot.nodes[1].data.conditional_messages[1].logic_operator = LogicOperator::Or;
    let result = generate(bot);
    assert!(result.code.contains("if \"name\" in store or \"age\" in store:"));
}

#[test]
fn test_implicit_auto_transition_from_single_connection() {
    let start = node("start_1", NodeType::Start, "Добро пожаловать");
    let next = node("next_step", NodeType::Message, "Шаг два");
    let bot = definition(
        "auto_bot",
        vec![start, next],
        vec![Connection {
            source: "start_1".to_string(),
            target: "next_step".to_string(),
        }],
    );
    let result = generate(bot);
    let code = &result.code;

    // Guarded tail-call of the successor's own handler.
    assert!(code.contains("if user_id not in waiting_for_input:"));
    assert!(code.contains("await handle_next_step(event)"));
    // The implicit target still receives its own handler.
    assert!(code.contains("async def handle_next_step(event):"));
}

#[test]
fn test_explicit_auto_transition_wins_over_connection() {
    let mut start = node("start_1", NodeType::Start, "Старт");
    start.data.enable_auto_transition = true;
    start.data.auto_transition_to = Some("winner".to_string());
    let winner = node("winner", NodeType::Message, "Явная цель");
    let loser = node("loser", NodeType::Message, "Структурная цель");
    let bot = definition(
        "explicit_bot",
        vec![start, winner, loser],
        vec![Connection {
            source: "start_1".to_string(),
            target: "loser".to_string(),
        }],
    );
    let result = generate(bot);
    assert!(result.code.contains("await handle_winner(event)"));
    assert!(!result.code.contains("await handle_loser(event)"));
}

#[test]
fn test_no_transition_while_waiting_for_input() {
    let mut start = node("start_1", NodeType::Start, "Как тебя зовут?");
    start.data.collect_text = true;
    start.data.input_variable = Some("name".to_string());
    let next = node("next_step", NodeType::Message, "Привет, {name}");
    let bot = definition(
        "input_bot",
        vec![start, next],
        vec![Connection {
            source: "start_1".to_string(),
            target: "next_step".to_string(),
        }],
    );
    let result = generate(bot);
    let code = &result.code;

    // The waiting state is armed before the transition guard runs.
    assert!(code.contains(
        "waiting_for_input[user_id] = {\"variable\": \"name\", \"next\": \"next_step\", \"types\": [\"text\"]}"
    ));
    assert!(code.contains("if user_id not in waiting_for_input:"));
    // The text collector resumes navigation once input arrives.
    assert!(code.contains("async def handle_text_input(message: types.Message):"));
    assert!(code.contains("await continue_to(pending[\"next\"], message)"));
}

#[test]
fn test_media_input_collection() {
    let mut bot = simple_bot();
    let mut ask = node("ask", NodeType::Message, "Пришли фото");
    ask.data.collect_photo = true;
    ask.data.input_variable = Some("pic".to_string());
    bot.nodes[0].data.buttons.push(goto_button("Фото", "ask"));
    bot.nodes.push(ask);

    let result = generate(bot);
    let code = &result.code;
    assert!(code.contains("\"types\": [\"photo\"]"));
    assert!(code.contains("async def handle_photo_input(message: types.Message):"));
    assert!(code.contains("message.photo[-1].file_id"));
}

#[test]
fn test_attached_media_dispatch() {
    let mut bot = simple_bot();
    // The photo collected under `pic` is attached to the info node.
    bot.nodes[0].data.collect_photo = true;
    bot.nodes[0].data.input_variable = Some("pic".to_string());
    bot.nodes[1].data.attached_media.push(AttachedMedia {
        variable: "pic".to_string(),
        kind: MediaKind::Photo,
    });

    let result = generate(bot);
    assert!(result.code.contains(
        "await send_media_with_caption(chat_id, \"photo\", get_user_store(user_id).get(\"pic\"), text)"
    ));
}

#[test]
fn test_static_image_dispatch() {
    let mut bot = simple_bot();
    bot.nodes[1].data.image_url = Some("https://example.com/pic.png".to_string());
    let result = generate(bot);
    assert!(result.code.contains(
        "await send_media_with_caption(chat_id, \"photo\", \"https://example.com/pic.png\", text)"
    ));
}

#[test]
fn test_text_send_uses_edit_then_fallback() {
    let result = generate(simple_bot());
    let code = &result.code;
    assert!(code.contains("await send_or_edit(event, chat_id, text, keyboard)"));
    // The shared helper carries the try-edit / fallback-send pair.
    assert!(code.contains("await message.edit_text(text, reply_markup=keyboard)"));
    assert!(code.contains("await bot.send_message(chat_id, text, reply_markup=keyboard)"));
}

#[test]
fn test_button_value_capture() {
    let mut start = node("start_1", NodeType::Start, "Ты согласен?");
    start.data.input_variable = Some("answer".to_string());
    start.data.buttons.push(goto_button("Да", "after"));
    start.data.buttons.push(goto_button("Нет", "after"));
    let after = node("after", NodeType::Message, "Записал");
    let bot = definition("capture_bot", vec![start, after], vec![]);

    let result = generate(bot);
    let code = &result.code;
    assert!(code.contains("BUTTON_VALUES_after = {"));
    assert!(code.contains("\"after_btn_0\": (\"answer\", \"Да\", None),"));
    assert!(code.contains("\"after_btn_1\": (\"answer\", \"Нет\", None),"));
    assert!(code.contains("set_user_variable(user_id, captured[0], captured[1])"));
    // Persistence is deferred while a conditional keyboard is pending.
    assert!(code.contains("if user_id in conditional_pending:"));
    assert!(code.contains("conditional_pending.discard(user_id)"));
}

#[test]
fn test_hide_after_click_deletes_message() {
    let mut start = node("start_1", NodeType::Start, "Реклама");
    let mut hide = goto_button("Скрыть", "hidden_info");
    hide.hide_after_click = true;
    start.data.buttons.push(hide);
    let hidden = node("hidden_info", NodeType::Message, "Скрыто");
    let bot = definition("hide_bot", vec![start, hidden], vec![]);

    let result = generate(bot);
    let code = &result.code;
    assert!(code.contains("if getattr(event, \"data\", None) in (\"hidden_info_btn_0\",):"));
    assert!(code.contains("await event.message.delete()"));
}

#[test]
fn test_missing_goto_target_gets_fallback_handler() {
    let mut start = node("start_1", NodeType::Start, "Сломанная кнопка");
    start.data.buttons.push(goto_button("Вникуда", "ghost"));
    let bot = definition("broken_bot", vec![start], vec![]);

    let result = generate(bot);
    let code = &result.code;
    // Generation does not fail; navigation ends defensively.
    assert!(result.success);
    assert!(code.contains("async def handle_ghost(event):"));
    assert!(code.contains("# target not found - end navigation"));
    assert!(code.contains("logging.warning(\"Navigation target 'ghost' is not defined\")"));
}

#[test]
fn test_url_and_command_buttons() {
    let mut start = node("start_1", NodeType::Start, "Ссылки");
    start.data.buttons.push(Button {
        text: "Сайт".to_string(),
        action: ButtonAction::Url,
        url: Some("https://example.com".to_string()),
        ..Default::default()
    });
    start.data.buttons.push(Button {
        text: "Помощь".to_string(),
        action: ButtonAction::Command,
        command: Some("/help".to_string()),
        ..Default::default()
    });
    let bot = definition("links_bot", vec![start], vec![]);

    let result = generate(bot);
    let code = &result.code;
    assert!(code.contains("InlineKeyboardButton(\"Сайт\", url=\"https://example.com\")"));
    assert!(code.contains("InlineKeyboardButton(\"Помощь\", callback_data=\"cmd_help\")"));
}

#[test]
fn test_reply_keyboard_with_contact_request() {
    let mut start = node("start_1", NodeType::Start, "Поделись контактом");
    start.data.buttons.push(Button {
        text: "Отправить контакт".to_string(),
        action: ButtonAction::Contact,
        ..Default::default()
    });
    let bot = definition("contact_bot", vec![start], vec![]);

    let result = generate(bot);
    let code = &result.code;
    assert!(code.contains("ReplyKeyboardMarkup(resize_keyboard=True, one_time_keyboard=True)"));
    assert!(code.contains("KeyboardButton(\"Отправить контакт\", request_contact=True)"));
}

#[test]
fn test_composite_keyboard_merge_by_configuration() {
    let mut start = node("start_1", NodeType::Start, "Результат");
    start.data.buttons.push(goto_button("Дальше", "extra"));
    start.data.merge_keyboard_from = Some("extra".to_string());
    let mut extra = node("extra", NodeType::Message, "Дополнительно");
    extra.data.buttons.push(goto_button("Назад", "start_1"));
    let bot = definition("merge_bot", vec![start, extra], vec![]);

    let result = generate(bot);
    let code = &result.code;
    // The start keyboard carries both its own button and the merged one, with
    // the merged payload indexed against its owning node.
    let start_marker = code.find("# @@NODE_START:start_1@@").unwrap();
    let end_marker = code.find("# @@NODE_END:start_1@@").unwrap();
    let region = &code[start_marker..end_marker];
    assert!(region.contains("callback_data=\"extra_btn_0\""));
    assert!(region.contains("callback_data=\"start_1_btn_0\""));
}

#[test]
fn test_html_is_stripped_from_button_captions() {
    let mut start = node("start_1", NodeType::Start, "Меню");
    start
        .data
        .buttons
        .push(goto_button("<b>Жирная</b> кнопка", "info"));
    let info = node("info", NodeType::Message, "Инфо");
    let bot = definition("html_bot", vec![start, info], vec![]);

    let result = generate(bot);
    assert!(result.code.contains("InlineKeyboardButton(\"Жирная кнопка\""));
}
