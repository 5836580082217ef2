//! Emitters for the document head: encoding pragma, imports, bot bootstrap,
//! global session state and the runtime utility functions every handler calls.

use crate::emit::py_str;
use crate::generator::context::GenerationContext;
use itertools::Itertools;

/// Phase 1: encoding pragma and imports.
pub(super) fn emit_header(ctx: &GenerationContext) -> Result<String, String> {
    let project = match &ctx.config.project_id {
        Some(id) => format!(" (project {})", id),
        None => String::new(),
    };
    let mut lines = vec![
        "# -*- coding: utf-8 -*-".to_string(),
        format!("\"\"\"{} - generated bot program{}.\"\"\"", ctx.config.name, project),
        "import logging".to_string(),
        "import os".to_string(),
        "import re".to_string(),
    ];
    if ctx.config.database_enabled {
        lines.push("import sqlite3".to_string());
    }
    lines.push("from aiogram import Bot, Dispatcher, executor, types".to_string());
    lines.push("from aiogram.types import (".to_string());
    lines.push("    InlineKeyboardButton,".to_string());
    lines.push("    InlineKeyboardMarkup,".to_string());
    lines.push("    KeyboardButton,".to_string());
    lines.push("    ReplyKeyboardMarkup,".to_string());
    lines.push(")".to_string());
    Ok(lines.join("\n"))
}

/// Phase 2: bootstrap, global state and utility functions, as ordered fragments.
pub(super) fn emit_runtime(ctx: &GenerationContext) -> Result<Vec<String>, String> {
    let mut fragments = Vec::new();

    let mut bootstrap = vec!["API_TOKEN = os.environ.get(\"BOT_TOKEN\", \"\")".to_string()];
    if ctx.config.logging_enabled {
        bootstrap.push(String::new());
        bootstrap.push("logging.basicConfig(level=logging.INFO)".to_string());
    }
    bootstrap.push(String::new());
    bootstrap.push("bot = Bot(token=API_TOKEN)".to_string());
    bootstrap.push("dp = Dispatcher(bot)".to_string());
    fragments.push(bootstrap.join("\n"));

    let mut globals = Vec::new();
    if !ctx.config.groups.is_empty() {
        let ids = ctx.config.groups.iter().map(|g| py_str(g)).join(", ");
        globals.push(format!("GROUP_IDS = [{}]", ids));
    }
    globals.push("user_data = {}".to_string());
    globals.push("multi_select_state = {}".to_string());
    globals.push("waiting_for_input = {}".to_string());
    globals.push("conditional_pending = set()".to_string());
    fragments.push(globals.join("\n"));

    if ctx.config.database_enabled {
        fragments.push(emit_database(ctx));
    }
    fragments.push(emit_utilities(ctx));

    Ok(fragments)
}

fn emit_database(ctx: &GenerationContext) -> String {
    format!(
        r#"DB_PATH = "{name}.db"


def init_database():
    connection = sqlite3.connect(DB_PATH)
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_variables ("
        "user_id INTEGER NOT NULL, name TEXT NOT NULL, value TEXT, "
        "PRIMARY KEY (user_id, name))"
    )
    connection.commit()
    connection.close()


def save_user_variable(user_id, name, value):
    connection = sqlite3.connect(DB_PATH)
    connection.execute(
        "INSERT OR REPLACE INTO user_variables (user_id, name, value) VALUES (?, ?, ?)",
        (user_id, name, str(value)),
    )
    connection.commit()
    connection.close()"#,
        name = ctx.config.name
    )
}

fn emit_utilities(ctx: &GenerationContext) -> String {
    let persist_line = if ctx.config.database_enabled {
        "\n    save_user_variable(user_id, name, value)"
    } else {
        ""
    };

    let store_helpers = format!(
        r#"def get_user_store(user_id):
    if user_id not in user_data:
        user_data[user_id] = {{}}
    return user_data[user_id]


def set_user_variable(user_id, name, value):
    get_user_store(user_id)[name] = value{persist_line}"#
    );

    // Interpolation happens here, at run time. The generator only wires the
    // call sites; values are unknown until the user has interacted.
    let substitution = concat!(
        "def substitute_variables(text, user_id):\n",
        "    store = get_user_store(user_id)\n",
        "\n",
        "    def replace(match):\n",
        "        return str(store.get(match.group(1), match.group(0)))\n",
        "\n",
        "    return re.sub(r\"\\{(\\w+)\\}\", replace, text)"
    );

    let event_helpers = concat!(
        "def event_chat_id(event):\n",
        "    message = getattr(event, \"message\", None)\n",
        "    if message is not None:\n",
        "        return message.chat.id\n",
        "    return event.chat.id\n",
        "\n",
        "\n",
        "async def send_or_edit(event, chat_id, text, keyboard=None):\n",
        "    message = getattr(event, \"message\", None)\n",
        "    if message is not None:\n",
        "        try:\n",
        "            await message.edit_text(text, reply_markup=keyboard)\n",
        "            return\n",
        "        except Exception:\n",
        "            pass\n",
        "    await bot.send_message(chat_id, text, reply_markup=keyboard)"
    );

    let media_helper = concat!(
        "async def send_media_with_caption(chat_id, kind, source, caption, keyboard=None):\n",
        "    if not source:\n",
        "        if caption:\n",
        "            await bot.send_message(chat_id, caption, reply_markup=keyboard)\n",
        "        return\n",
        "    try:\n",
        "        if kind == \"photo\":\n",
        "            await bot.send_photo(chat_id, source, caption=caption, reply_markup=keyboard)\n",
        "        elif kind == \"video\":\n",
        "            await bot.send_video(chat_id, source, caption=caption, reply_markup=keyboard)\n",
        "        elif kind == \"audio\":\n",
        "            await bot.send_audio(chat_id, source, caption=caption, reply_markup=keyboard)\n",
        "        elif kind == \"document\":\n",
        "            await bot.send_document(chat_id, source, caption=caption, reply_markup=keyboard)\n",
        "        else:\n",
        "            await bot.send_message(chat_id, caption or \"\", reply_markup=keyboard)\n",
        "    except Exception as exc:\n",
        "        logging.error(\"media send failed: %s\", exc)\n",
        "        if caption:\n",
        "            await bot.send_message(chat_id, caption, reply_markup=keyboard)"
    );

    let unconfigured = concat!(
        "@dp.callback_query_handler(lambda c: c.data == \"unconfigured\")\n",
        "async def handle_unconfigured_button(event: types.CallbackQuery):\n",
        "    try:\n",
        "        await event.answer(\"Эта кнопка еще не настроена\")\n",
        "    except Exception:\n",
        "        pass"
    );

    [
        store_helpers.as_str(),
        substitution,
        event_helpers,
        media_helper,
        unconfigured,
    ]
    .join("\n\n\n")
}
