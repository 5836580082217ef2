//! Emitters for the document tail: the handler dispatch table, the main entry
//! function with its startup invocation, and the optional BotFather command
//! listing.

use crate::bot::{ButtonAction, NodeType};
use crate::emit::{sanitize_identifier, strip_html};
use crate::generator::context::GenerationContext;

/// Transitions use direct tail-calls when the target is known at generation
/// time; this table serves the cases where the target is only known at run
/// time (input collection, capture redirects).
pub(super) fn emit_dispatch(handled_ids: &[String]) -> Result<String, String> {
    let mut lines = vec!["NODE_HANDLERS = {".to_string()];
    for id in handled_ids {
        lines.push(format!("    \"{}\": handle_{},", id, sanitize_identifier(id)));
    }
    lines.push("}".to_string());
    lines.push(String::new());
    lines.push(String::new());
    lines.push("async def continue_to(node_id, event):".to_string());
    lines.push("    handler = NODE_HANDLERS.get(node_id)".to_string());
    lines.push("    if handler is None:".to_string());
    lines.push(
        "        logging.warning(\"Navigation target '%s' is not defined\", node_id)".to_string(),
    );
    lines.push("        return".to_string());
    lines.push("    try:".to_string());
    lines.push("        await handler(event)".to_string());
    lines.push("    except Exception as exc:".to_string());
    lines.push("        logging.error(\"navigation failed: %s\", exc)".to_string());
    Ok(lines.join("\n"))
}

/// Phase 4: main entry function and startup invocation.
pub(super) fn emit_main(ctx: &GenerationContext) -> Result<String, String> {
    let mut lines = vec!["def main():".to_string()];
    if ctx.config.database_enabled {
        lines.push("    init_database()".to_string());
    }
    if ctx.config.logging_enabled {
        lines.push(format!(
            "    logging.info(\"Starting {}\")",
            ctx.config.name
        ));
    }
    lines.push("    executor.start_polling(dp, skip_updates=True)".to_string());
    lines.push(String::new());
    lines.push(String::new());
    lines.push("if __name__ == \"__main__\":".to_string());
    lines.push("    main()".to_string());
    Ok(lines.join("\n"))
}

/// Phase 5: BotFather `/setcommands` listing, assembled from the start node,
/// command nodes and command buttons. Returns `Ok(None)` when the graph
/// declares no commands beyond the implicit start.
pub(super) fn emit_botfather(ctx: &GenerationContext) -> Result<Option<String>, String> {
    fn push_command(
        name: &str,
        description: &str,
        commands: &mut Vec<(String, String)>,
    ) -> Result<(), String> {
        let name = name.trim_start_matches('/').to_string();
        if commands.iter().any(|(existing, _)| *existing == name) {
            return Ok(());
        }
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(format!(
                "command '{}' is not a valid BotFather command name",
                name
            ));
        }
        let description = first_line(description);
        let description = if description.is_empty() {
            "...".to_string()
        } else {
            description
        };
        commands.push((name, description));
        Ok(())
    }

    let mut commands: Vec<(String, String)> = Vec::new();

    if let Some(start) = ctx.start_node() {
        push_command(
            "start",
            start.data.message_text.as_deref().unwrap_or("Launch the bot"),
            &mut commands,
        )?;
    }
    for node in &ctx.nodes {
        if node.node_type == NodeType::Command || node.data.command.is_some() {
            let name = node
                .data
                .command
                .clone()
                .unwrap_or_else(|| sanitize_identifier(&node.id).to_lowercase());
            push_command(
                &name,
                node.data.message_text.as_deref().unwrap_or(""),
                &mut commands,
            )?;
        }
        for button in &node.data.buttons {
            if button.action == ButtonAction::Command {
                if let Some(command) = button.command.as_deref().or(button.target.as_deref()) {
                    push_command(command, &button.text, &mut commands)?;
                }
            }
        }
    }

    if commands.len() <= 1 {
        return Ok(None);
    }

    let mut lines = vec![
        "# ===== BotFather commands =====".to_string(),
        "# Paste into BotFather's /setcommands:".to_string(),
        "#".to_string(),
    ];
    for (name, description) in commands {
        lines.push(format!("# {} - {}", name, description));
    }
    Ok(Some(lines.join("\n")))
}

fn first_line(text: &str) -> String {
    let stripped = strip_html(text);
    let line = stripped.lines().next().unwrap_or("").trim();
    let mut out: String = line.chars().take(60).collect();
    if line.chars().count() > 60 {
        out.push('…');
    }
    out
}
