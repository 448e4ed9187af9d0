//! Line-oriented formatting for generated C# text.
//!
//! Emitters build text without caring about indentation; [`format`] re-indents
//! it from brace depth and tidies blank lines. Both passes only look at the
//! trimmed content of each line, which is what makes them idempotent.

const INDENT: &str = "    ";

fn lines(input: &str) -> Vec<&str> {
    input.split("\r\n").flat_map(|l| l.split(['\r', '\n'])).collect()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Re-indent every line by the brace depth at that point.
///
/// A line starting with `}` is written one level shallower than the current
/// depth. After a line is written, each `{` on it opens a level and each `}`
/// closes one. Blank lines come out empty.
pub fn indent_by_braces(input: &str) -> String {
    let mut depth: i64 = 0;
    let mut out = Vec::new();

    for line in lines(input) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push(String::new());
        } else {
            let level = if trimmed.starts_with('}') {
                depth - 1
            } else {
                depth
            };
            let level = usize::try_from(level).unwrap_or(0);
            out.push(format!("{}{}", INDENT.repeat(level), trimmed));
        }
        for c in trimmed.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
        }
    }

    out.join("\n")
}

/// Collapse blank-line runs and drop blanks hugging a lone brace.
pub fn normalize_blank_lines(input: &str) -> String {
    let mut collapsed: Vec<&str> = Vec::new();
    for line in lines(input) {
        if is_blank(line) && collapsed.last().is_some_and(|prev| is_blank(prev)) {
            continue;
        }
        collapsed.push(line);
    }

    // blank right after a lone `{`
    let mut after_open: Vec<&str> = Vec::with_capacity(collapsed.len());
    for line in collapsed {
        if is_blank(line) && after_open.last().is_some_and(|prev| prev.trim() == "{") {
            continue;
        }
        after_open.push(line);
    }

    // blank right before a lone `}`
    let mut result: Vec<&str> = Vec::with_capacity(after_open.len());
    for (i, line) in after_open.iter().enumerate() {
        if is_blank(line) && after_open.get(i + 1).is_some_and(|next| next.trim() == "}") {
            continue;
        }
        result.push(line);
    }

    result.join("\n")
}

/// Indent then normalize blank lines.
pub fn format(input: &str) -> String {
    normalize_blank_lines(&indent_by_braces(input))
}
