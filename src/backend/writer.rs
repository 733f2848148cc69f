const INDENT: &str = "  ";

/// Line buffer with an indentation level, shared by the renderers.
pub(crate) struct CodeWriter {
    buffer: String,
    indent_level: usize,
}

impl CodeWriter {
    pub(crate) fn new() -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
        }
    }

    pub(crate) fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub(crate) fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(INDENT);
        }
    }

    /// One indented line.
    pub(crate) fn line(&mut self, text: &str) {
        if !text.is_empty() {
            self.write_indent();
            self.buffer.push_str(text);
        }
        self.buffer.push('\n');
    }

    /// Verbatim text, typically a fixed prelude.
    pub(crate) fn raw(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub(crate) fn blank(&mut self) {
        self.buffer.push('\n');
    }

    pub(crate) fn finish(self) -> String {
        self.buffer
    }
}
