const INDENT: &str = "    ";

/// Line-oriented text buffer used by the code generators.
#[derive(Debug, Default)]
pub struct SourceWriter {
    text: String,
    depth: usize,
}

impl SourceWriter {
    pub fn new() -> SourceWriter {
        SourceWriter::default()
    }

    pub fn line(&mut self, line: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.text.push_str(INDENT);
        }
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    /// Separates two sections with one empty line, never more.
    pub fn blank(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with("\n\n") {
            self.text.push('\n');
        }
    }

    pub fn open(&mut self) {
        self.line("{");
        self.depth += 1;
    }

    pub fn close(&mut self) {
        self.close_with("}");
    }

    pub fn close_with(&mut self, closing: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(closing);
    }

    pub fn finish(self) -> String {
        self.text
    }
}
