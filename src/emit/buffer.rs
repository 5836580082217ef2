/// Ordered accumulator for generated source fragments.
///
/// Fragments are collected in phase order and joined exactly once at the end,
/// which keeps the document ordering contract explicit and the generation
/// function free of shared mutable state.
#[derive(Debug, Default)]
pub struct CodeBuffer {
    fragments: Vec<String>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one fragment. Trailing newlines are normalized away; the final
    /// join separates fragments with two blank lines, the way top-level Python
    /// definitions are spaced.
    pub fn push(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        let trimmed = fragment.trim_end_matches('\n');
        if !trimmed.is_empty() {
            self.fragments.push(trimmed.to_string());
        }
    }

    pub fn extend(&mut self, fragments: impl IntoIterator<Item = String>) {
        for fragment in fragments {
            self.push(fragment);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Joins all fragments into the final document.
    pub fn into_code(self) -> String {
        let mut code = self.fragments.join("\n\n\n");
        code.push('\n');
        code
    }
}

/// Counts emitted handler-function signatures in the final text. A structural
/// scan rather than a running tally: the number reflects the actual document,
/// double-counting only if handlers are legitimately duplicated.
pub fn count_handlers(code: &str) -> usize {
    code.matches("async def handle_").count()
}

pub fn count_lines(code: &str) -> usize {
    code.lines().count()
}
