//! Identifier sanitization and casing conversions.

/// C# reserved keywords that need an `@` prefix when used as identifiers.
pub(crate) const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Check if a name is a C# reserved keyword
pub fn is_csharp_keyword(name: &str) -> bool {
    CSHARP_KEYWORDS.contains(&name)
}

/// Convert a database name into a C# identifier.
///
/// Strips `@`, turns spaces into `_` and `#` into `Number`, and prefixes
/// `N_` when the result would start with a digit.
pub fn to_identifier(source: &str) -> String {
    let result = source
        .replace('@', "")
        .replace(' ', "_")
        .replace('#', "Number");
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        format!("N_{result}")
    } else {
        result
    }
}

/// Convert to camelCase (e.g., "DATE_RANGE" -> "dateRange", "UserIDs" -> "userIDs")
///
/// Words are split on `_`, `-` and spaces, on lower-to-upper transitions, and
/// before the last capital of an uppercase run that starts a new word
/// ("DATERange" is "DATE" + "Range"). A fully uppercase word of more than one
/// letter is treated as an acronym and reduced to its leading capital, while
/// mixed words such as "IDs" are kept as written.
pub fn to_camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, word) in split_words(input).iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
            continue;
        }
        let is_acronym = word.chars().count() > 1
            && word
                .chars()
                .filter(|c| c.is_alphabetic())
                .all(|c| c.is_uppercase());
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            if is_acronym {
                out.push_str(&chars.as_str().to_lowercase());
            } else {
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

/// Convert to a C# parameter name: camelCase, with keywords escaped by `@`.
pub fn to_parameter_case(input: &str) -> String {
    let camel = to_camel_case(input);
    if is_csharp_keyword(&camel) {
        format!("@{camel}")
    } else {
        camel
    }
}

fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in input.split(['_', '-', ' ']).filter(|c| !c.is_empty()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && c.is_uppercase() && !current.is_empty() {
                let prev = chars[i - 1];
                let lower_follows = chars
                    .get(i + 1..i + 3)
                    .is_some_and(|next| next.iter().all(|n| n.is_lowercase()));
                if !prev.is_uppercase() || lower_follows {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current);
        }
    }
    words
}
