//! Python text rendering utilities.
//!
//! Every branch of the generator renders literals through `py_str`, so quoting
//! and escaping stay consistent across the whole emitted document.

/// Renders a raw text field as a double-quoted Python string literal.
/// Newlines are escaped, so the literal always occupies a single source line.
pub fn py_str(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => literal.push_str("\\\\"),
            '"' => literal.push_str("\\\""),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            _ => literal.push(ch),
        }
    }
    literal.push('"');
    literal
}

/// Removes HTML tags from a text field. Button captions cannot carry markup,
/// so they are stripped before quoting.
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Maps a node ID to a valid Python identifier fragment.
pub fn sanitize_identifier(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for ch in id.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        out.insert(0, 'n');
    }
    out
}

/// The last `max_len` characters of an ID, used to keep callback payloads
/// inside the platform's payload-length limit.
pub fn short_id(id: &str, max_len: usize) -> String {
    let sanitized = sanitize_identifier(id);
    let chars: Vec<char> = sanitized.chars().collect();
    if chars.len() <= max_len {
        sanitized
    } else {
        chars[chars.len() - max_len..].iter().collect()
    }
}

/// Opening marker of a node's contribution. Byte-exact interface contract:
/// external tools slice the generated source back to originating nodes.
pub fn node_start_marker(node_id: &str) -> String {
    format!("# @@NODE_START:{}@@", node_id)
}

/// Closing marker of a node's contribution.
pub fn node_end_marker(node_id: &str) -> String {
    format!("# @@NODE_END:{}@@", node_id)
}

/// Wires a runtime variable-interpolation call site for a text field.
/// Substitution itself happens in the generated program, never here.
pub fn interpolate_call(text: &str) -> String {
    format!("substitute_variables({}, user_id)", py_str(text))
}
