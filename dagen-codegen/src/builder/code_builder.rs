//! Code builder utility for generating properly indented code.

use super::Indent;

/// Fluent API for building brace-style code with proper indentation.
///
/// Supports both consuming methods (returning `Self`) for chaining and
/// mutable methods (returning `&mut Self`) for loops.
///
/// # Example
///
/// ```
/// use dagen_codegen::builder::CodeBuilder;
///
/// let code = CodeBuilder::csharp()
///     .block("public partial class Row", |b| {
///         b.line("public int? Id { get; set; }")
///     })
///     .build();
///
/// assert_eq!(code, "public partial class Row\n{\n    public int? Id { get; set; }\n}\n");
/// ```
#[derive(Debug, Clone)]
pub struct CodeBuilder {
    indent_level: usize,
    indent: Indent,
    buffer: String,
}

impl CodeBuilder {
    /// Create a new CodeBuilder with 4-space indentation.
    pub fn csharp() -> Self {
        Self {
            indent_level: 0,
            indent: Indent::CSHARP,
            buffer: String::new(),
        }
    }

    // =========================================================================
    // Mutable API - methods prefixed with `push_`
    // =========================================================================

    /// Add a line of code with current indentation (mutable).
    pub fn push_line(&mut self, s: &str) -> &mut Self {
        self.write_indent();
        self.buffer.push_str(s);
        self.buffer.push('\n');
        self
    }

    /// Add every line of `text` at the current indentation (mutable).
    ///
    /// Blank lines stay blank.
    pub fn push_lines(&mut self, text: &str) -> &mut Self {
        for line in text.lines() {
            if line.trim().is_empty() {
                self.push_blank();
            } else {
                self.push_line(line);
            }
        }
        self
    }

    /// Add a blank line (mutable).
    pub fn push_blank(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    /// Increase indentation level (mutable).
    pub fn push_indent(&mut self) -> &mut Self {
        self.indent_level += 1;
        self
    }

    /// Decrease indentation level (mutable).
    pub fn push_dedent(&mut self) -> &mut Self {
        self.indent_level = self.indent_level.saturating_sub(1);
        self
    }

    /// Add a C# XML doc comment line (mutable).
    pub fn push_xml_doc(&mut self, text: &str) -> &mut Self {
        self.write_indent();
        self.buffer.push_str("/// ");
        self.buffer.push_str(text);
        self.buffer.push('\n');
        self
    }

    // =========================================================================
    // Consuming API
    // =========================================================================

    /// Add a line of code with current indentation.
    pub fn line(mut self, s: &str) -> Self {
        self.push_line(s);
        self
    }

    /// Add every line of `text` at the current indentation.
    pub fn lines(mut self, text: &str) -> Self {
        self.push_lines(text);
        self
    }

    /// Add a blank line (no indentation).
    pub fn blank(mut self) -> Self {
        self.push_blank();
        self
    }

    /// Add `header`, then an indented body between braces on their own lines.
    pub fn block<F>(self, header: &str, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.block_with_close(header, "}", f)
    }

    /// Like [`CodeBuilder::block`] with a custom closing line such as `});`.
    pub fn block_with_close<F>(self, header: &str, close: &str, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        let mut builder = self.line(header).line("{");
        builder.push_indent();
        let mut builder = f(builder);
        builder.push_dedent();
        builder.line(close)
    }

    /// Add an XML doc comment line (`/// text`).
    pub fn xml_doc(mut self, text: &str) -> Self {
        self.push_xml_doc(text);
        self
    }

    /// Conditionally add content.
    pub fn when<F>(self, condition: bool, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        if condition { f(self) } else { self }
    }

    /// Hand the builder to a helper function mid-chain.
    pub fn with<F>(self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        f(self)
    }

    /// Add content built from `value` when it is present.
    pub fn when_some<T, F>(self, value: Option<T>, f: F) -> Self
    where
        F: FnOnce(Self, T) -> Self,
    {
        match value {
            Some(value) => f(self, value),
            None => self,
        }
    }

    /// Iterate and add content for each item.
    pub fn each<T, I, F>(mut self, items: I, f: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(Self, T) -> Self,
    {
        for item in items {
            self = f(self, item);
        }
        self
    }

    /// Consume the builder and return the generated code.
    pub fn build(self) -> String {
        self.buffer
    }

    fn write_indent(&mut self) {
        let width = self.indent_level * self.indent.width();
        self.buffer.extend(std::iter::repeat_n(' ', width));
    }
}

impl Default for CodeBuilder {
    fn default() -> Self {
        Self::csharp()
    }
}
