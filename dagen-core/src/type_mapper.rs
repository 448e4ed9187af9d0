//! Mapping between SQL Server types and the generated C# surface.
//!
//! Every known source type has exactly one row in [`TYPE_TABLE`]; the three
//! lookups (target type, binding tag, default literal) all read that row, so a
//! type is either fully supported or rejected with [`TypeMappingError`].

use thiserror::Error;

/// Error returned when a source type has no mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeMappingError {
    #[error("unknown SQL type: {name}")]
    UnknownType { name: String },
}

/// Literal used when synthesizing a speculative call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefaultLiteral {
    /// No generically safe literal exists.
    Unavailable,
    Fixed(&'static str),
    /// A freshly generated `uniqueidentifier` literal.
    FreshUuid,
}

#[derive(Debug, Clone, Copy)]
struct TypeEntry {
    source: &'static str,
    target: &'static str,
    binding_tag: &'static str,
    default: DefaultLiteral,
}

const fn entry(
    source: &'static str,
    target: &'static str,
    binding_tag: &'static str,
    default: DefaultLiteral,
) -> TypeEntry {
    TypeEntry {
        source,
        target,
        binding_tag,
        default,
    }
}

const DATETIME_LITERAL: DefaultLiteral = DefaultLiteral::Fixed("'2022-11-10 09:00:00'");
const EMPTY_STRING: DefaultLiteral = DefaultLiteral::Fixed("''");
const ZERO: DefaultLiteral = DefaultLiteral::Fixed("0");
const NULL: DefaultLiteral = DefaultLiteral::Fixed("NULL");

#[rustfmt::skip]
const TYPE_TABLE: &[TypeEntry] = &[
    entry("varchar", "string", "VarChar", EMPTY_STRING),
    entry("nvarchar", "string", "NVarChar", EMPTY_STRING),
    entry("char", "string", "Char", EMPTY_STRING),
    entry("nchar", "string", "NChar", EMPTY_STRING),
    entry("text", "string", "Text", EMPTY_STRING),
    entry("ntext", "string", "Text", EMPTY_STRING),
    entry("sysname", "string", "VarChar", DefaultLiteral::Unavailable),
    entry("xml", "string", "Xml", DefaultLiteral::Fixed("'<body></body>'")),
    entry("int", "int", "Int", ZERO),
    entry("tinyint", "byte", "TinyInt", ZERO),
    entry("smallint", "short", "SmallInt", ZERO),
    entry("bigint", "long", "BigInt", ZERO),
    entry("bit", "bool", "Bit", ZERO),
    entry("uniqueidentifier", "Guid", "UniqueIdentifier", DefaultLiteral::FreshUuid),
    entry("datetime", "DateTime", "DateTime", DATETIME_LITERAL),
    entry("datetime2", "DateTime", "DateTime2", DATETIME_LITERAL),
    entry("smalldatetime", "DateTime", "SmallDateTime", DATETIME_LITERAL),
    entry("timestamp", "DateTime", "Timestamp", DATETIME_LITERAL),
    entry("datetimeoffset", "DateTimeOffset", "DateTimeOffset", DATETIME_LITERAL),
    entry("date", "DateTime", "Date", DefaultLiteral::Fixed("'2022-11-10'")),
    entry("time", "TimeSpan", "Time", DefaultLiteral::Fixed("'09:00:00'")),
    entry("decimal", "decimal", "Decimal", ZERO),
    entry("numeric", "decimal", "Decimal", ZERO),
    entry("money", "decimal", "Money", ZERO),
    entry("smallmoney", "object", "SmallMoney", ZERO),
    entry("float", "double", "Float", ZERO),
    entry("real", "float", "Real", ZERO),
    entry("binary", "byte[]", "Binary", ZERO),
    entry("varbinary", "byte[]", "VarBinary", ZERO),
    entry("sql_variant", "object", "Variant", NULL),
    entry("image", "object", "Image", NULL),
    entry("hierarchyid", "object", "Binary", DefaultLiteral::Fixed("'/'")),
    entry("geometry", "object", "Binary", DefaultLiteral::Fixed("geometry::Parse('POINT(4 5 6 3.5)')")),
    entry(
        "geography",
        "object",
        "Binary",
        DefaultLiteral::Fixed("geography::STGeomFromText('LINESTRING(-122.360 47.656, -122.343 47.656 )', 4326)"),
    ),
];

fn lookup(source_type: &str) -> Option<&'static TypeEntry> {
    TYPE_TABLE
        .iter()
        .find(|e| e.source.eq_ignore_ascii_case(source_type))
}

fn lookup_or_fail(source_type: &str) -> Result<&'static TypeEntry, TypeMappingError> {
    lookup(source_type).ok_or_else(|| TypeMappingError::UnknownType {
        name: source_type.to_string(),
    })
}

/// Returns true when the source type has a fixed mapping.
pub fn is_known_type(source_type: &str) -> bool {
    lookup(source_type).is_some()
}

/// Map a source type to its C# type.
///
/// `row_set_class` is the generated class name of the row-set type the
/// caller resolved for this name, if any. It is only consulted when the name
/// is not one of the fixed types, in which case the mapping is `List<Row>`.
pub fn to_target_type(
    source_type: &str,
    nullable: bool,
    row_set_class: Option<&str>,
) -> Result<String, TypeMappingError> {
    let base = match (lookup(source_type), row_set_class) {
        (Some(entry), _) => entry.target.to_string(),
        (None, Some(class)) => format!("List<{class}>"),
        (None, None) => {
            return Err(TypeMappingError::UnknownType {
                name: source_type.to_string(),
            });
        }
    };
    Ok(if nullable { format!("{base}?") } else { base })
}

/// Map a source type to its `SqlDbType` member name.
pub fn to_binding_tag(source_type: &str) -> Result<&'static str, TypeMappingError> {
    lookup_or_fail(source_type).map(|e| e.binding_tag)
}

/// A literal usable for this type in a speculative call, if one exists.
///
/// Unknown types yield `None`: the speculative attempt then declares a
/// variable of the type instead.
pub fn to_default_literal(source_type: &str) -> Option<String> {
    match lookup(source_type)?.default {
        DefaultLiteral::Unavailable => None,
        DefaultLiteral::Fixed(literal) => Some(literal.to_string()),
        DefaultLiteral::FreshUuid => Some(format!("'{}'", uuid::Uuid::new_v4())),
    }
}

/// True when the C# type is a reference type.
///
/// Generated files enable nullable reference types, so these are always
/// annotated as nullable on result holders.
pub fn is_reference_type(target_type: &str) -> bool {
    let base = target_type.trim_end_matches('?');
    matches!(base, "string" | "byte[]" | "object") || base.starts_with("List<")
}

/// Initializer for a non-nullable property of the given C# type.
pub fn default_initializer(target_type: &str) -> Option<&'static str> {
    match target_type.trim_end_matches('?') {
        "string" => Some("\"\""),
        "byte[]" => Some("new byte[0]"),
        _ => None,
    }
}
