//! Indentation configuration for code generation.

/// Indentation width for generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indent(u8);

impl Indent {
    /// 4-space indentation, the C# convention and what the formatter emits.
    pub const CSHARP: Self = Self(4);

    /// Columns per indent level.
    pub fn width(&self) -> usize {
        usize::from(self.0)
    }
}

impl Default for Indent {
    fn default() -> Self {
        Self::CSHARP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csharp_width_matches_formatter() {
        assert_eq!(Indent::default().width(), 4);
        let formatted = dagen_core::format::format("class A\n{\nint x;\n}\n");
        assert!(formatted.contains(&format!("\n{}int x;", " ".repeat(Indent::CSHARP.width()))));
    }
}
