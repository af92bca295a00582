pub const INDENT: &str = "    ";

/// Accumulates generated GLSL lines.
///
/// Lines pushed with [`GlslDocument::line`] are stored as given. Nested
/// documents added with [`GlslDocument::append_block`] are indented one level
/// and each of their lines is terminated with `;` unless it already ends in
/// `;`, `{` or `}`.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct GlslDocument {
    lines: Vec<String>,
}

fn is_terminated(line: &str) -> bool {
    matches!(line.chars().last(), Some(';' | '{' | '}'))
}

impl GlslDocument {
    pub fn new() -> Self {
        GlslDocument::default()
    }

    pub fn with_line(line: impl Into<String>) -> Self {
        GlslDocument {
            lines: vec![line.into()],
        }
    }

    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn extend<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Appends another document's lines one level deeper.
    pub fn append_block(&mut self, block: GlslDocument) -> &mut Self {
        for line in block.lines {
            if line.is_empty() {
                self.lines.push(line);
                continue;
            }
            let mut indented = String::with_capacity(INDENT.len() + line.len() + 1);
            indented.push_str(INDENT);
            indented.push_str(&line);
            if !is_terminated(&indented) {
                indented.push(';');
            }
            self.lines.push(indented);
        }
        self
    }

    /// Appends another document's lines at the same level.
    pub fn append(&mut self, mut other: GlslDocument) -> &mut Self {
        self.lines.append(&mut other.lines);
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn finish(self) -> String {
        let mut result = self.lines.join("\n");
        result.push('\n');
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminates_nested_statements() {
        let mut body = GlslDocument::with_line("if (a) {");
        body.append_block(GlslDocument::with_line("x = 1"));
        body.line("}");

        let mut function = GlslDocument::with_line("void main() {");
        function.append_block(body);
        function.append_block(GlslDocument::with_line("y = 2;"));
        function.line("}");

        assert_eq!(
            function.lines(),
            &[
                "void main() {",
                "    if (a) {",
                "        x = 1;",
                "    }",
                "    y = 2;",
                "}"
            ]
        );
    }

    #[test]
    fn keeps_blank_lines_unterminated() {
        let mut document = GlslDocument::new();
        document.append_block(GlslDocument::with_line(""));
        assert_eq!(document.finish(), "\n");
    }
}
