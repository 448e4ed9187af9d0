//! Parameter default values scanned out of a routine's source text.
//!
//! The catalog does not expose parameter defaults for procedures, so they are
//! recovered from the `CREATE PROCEDURE` header. Only the text before the
//! first standalone `AS` keyword is searched. A default literal that itself
//! contains ` AS ` ends the header early; that limitation is kept as-is.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_AS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\sAS\s").expect("valid regex"));

// parameter name, one ignored type token, then the default value
static DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?P<name>@\S*)\s*\S*\s*=\s*(?P<value>\S*)").expect("valid regex")
});

/// Scan a routine body for `@name type = value` defaults.
///
/// Keys keep their leading `@`. Values are raw SQL literals with one trailing
/// `,` and then one trailing `)` removed. Later duplicates overwrite earlier
/// ones.
pub fn scan_default_values(body: &str) -> IndexMap<String, String> {
    let mut defaults = IndexMap::new();

    let Some(first_as) = FIRST_AS.find(body) else {
        return defaults;
    };
    let header = &body[..first_as.start()];

    for captures in DEFAULT.captures_iter(header) {
        let name = &captures["name"];
        let mut value = &captures["value"];
        if let Some(stripped) = value.strip_suffix(',') {
            value = stripped;
        }
        if let Some(stripped) = value.strip_suffix(')') {
            value = stripped;
        }
        defaults.insert(name.to_string(), value.to_string());
    }

    defaults
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const BODY_TAIL: &str = "AS
IF @OrdYear != '1996' AND @OrdYear != '1997' AND @OrdYear != '1998'
BEGIN
\tSELECT @OrdYear = '1998'
END

SELECT ProductName,
\tTotalPurchase=ROUND(SUM(CONVERT(decimal(14,2), OD.Quantity * (1-OD.Discount) * OD.UnitPrice)), 0)
FROM [Order Details] OD, Orders O, Products P, Categories C
WHERE OD.OrderID = O.OrderID
\tAND C.CategoryName = @CategoryName
\tAND SUBSTRING(CONVERT(nvarchar(22), O.OrderDate, 111), 1, 4) = @OrdYear
GROUP BY ProductName
ORDER BY ProductName
";

    fn sales_by_category(header: &str) -> String {
        format!("CREATE PROCEDURE SalesByCategory\n    {header}\n{BODY_TAIL}")
    }

    #[test]
    fn test_single_default() {
        let body = sales_by_category("@CategoryName nvarchar(15), @OrdYear nvarchar(4) = '1998'");
        let defaults = scan_default_values(&body);

        assert_eq!(defaults.len(), 1);
        let (name, value) = defaults.first().unwrap();
        assert_eq!(name, "@OrdYear");
        assert_eq!(value, "'1998'");
    }

    #[test]
    fn test_multiple_defaults() {
        let body = sales_by_category(
            "@CategoryName nvarchar(15) = 'NoName', @OrdYear nvarchar(4) = '1998'",
        );
        let defaults = scan_default_values(&body);

        assert_eq!(defaults.len(), 2);
        let (name, value) = defaults.first().unwrap();
        assert_eq!(name, "@CategoryName");
        assert_eq!(value, "'NoName'");
        assert_eq!(defaults["@OrdYear"], "'1998'");
    }

    #[test]
    fn test_trailing_paren_trimmed() {
        let body = "CREATE PROCEDURE dbo.Page (@Size int = 10)\nAS\nSELECT 1";
        let defaults = scan_default_values(body);
        assert_eq!(defaults["@Size"], "10");
    }

    #[test]
    fn test_no_as_keyword() {
        assert!(scan_default_values("@Size int = 10").is_empty());
    }

    #[test]
    fn test_assignments_after_as_are_ignored() {
        let body = "CREATE PROCEDURE dbo.Reset\nAS\nDECLARE @x int = 5\nSELECT @x";
        assert!(scan_default_values(body).is_empty());
    }

    #[test]
    fn test_as_inside_default_truncates_header() {
        // Known limitation: the header ends at the first ` AS `, even inside a literal.
        let body =
            "CREATE PROCEDURE dbo.Label @Label varchar(20) = 'SOLD AS IS', @Limit int = 5\nAS\nSELECT 1";
        let defaults = scan_default_values(body);

        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults["@Label"], "'SOLD");
        assert!(!defaults.contains_key("@Limit"));
    }

    proptest! {
        #[test]
        fn scan_never_yields_malformed_entries(body in "[ -~\n\t]{0,200}") {
            for (name, value) in scan_default_values(&body) {
                prop_assert!(name.starts_with('@'));
                prop_assert!(!value.chars().any(char::is_whitespace));
            }
        }
    }
}
