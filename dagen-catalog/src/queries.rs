//! Catalog SQL text.

/// Escape a value for interpolation inside a single-quoted SQL literal.
pub fn quote(value: &str) -> String {
    value.replace('\'', "''")
}

pub fn procedures(schema: &str) -> String {
    format!(
        "SELECT p.name FROM sys.procedures p
JOIN sys.schemas s ON p.schema_id = s.schema_id
WHERE s.name = '{schema}'
ORDER BY p.name",
        schema = quote(schema)
    )
}

pub fn routine_body(schema: &str, routine: &str) -> String {
    format!(
        "SELECT definition FROM sys.sql_modules
WHERE object_id = OBJECT_ID('{schema}.{routine}')",
        schema = quote(schema),
        routine = quote(routine)
    )
}

pub fn parameters(schema: &str, routine: &str) -> String {
    format!(
        "SELECT p.name AS ParameterName, ISNULL(t.name, ut.name) AS TypeName, ISNULL(ts.name, uts.name) AS TypeSchema,
    ISNULL(isp.character_maximum_length, CAST(p.max_length AS int)) AS max_length, p.precision, p.scale, p.is_output
FROM sys.parameters p
LEFT JOIN sys.types t ON p.system_type_id = t.system_type_id AND t.is_user_defined = 0 AND t.name <> 'sysname'
LEFT JOIN sys.types ut ON p.user_type_id = ut.user_type_id AND ut.name <> 'AUTO_ID'
LEFT JOIN sys.schemas ts ON t.schema_id = ts.schema_id
LEFT JOIN sys.schemas uts ON ut.schema_id = uts.schema_id
LEFT JOIN INFORMATION_SCHEMA.PARAMETERS isp ON p.name = isp.parameter_name AND isp.SPECIFIC_SCHEMA = '{schema}' AND isp.SPECIFIC_NAME = '{routine}'
WHERE p.object_id = OBJECT_ID('{schema}.{routine}')
AND ISNULL(ut.name, t.name) IS NOT NULL
ORDER BY p.parameter_id",
        schema = quote(schema),
        routine = quote(routine)
    )
}

pub fn first_result_set(schema: &str, routine: &str) -> String {
    format!(
        "SELECT rs.name, rs.is_nullable, ISNULL(t.name, ut.name) AS typeName, CAST(rs.max_length AS int) AS max_length, rs.precision, rs.scale
FROM sys.dm_exec_describe_first_result_set('{schema}.{routine}', NULL, 0) rs
LEFT JOIN sys.types t ON rs.system_type_id = t.system_type_id AND t.is_user_defined = 0 AND t.name <> 'sysname'
LEFT JOIN sys.types ut ON rs.user_type_id = ut.user_type_id AND ut.name <> 'AUTO_ID'
WHERE rs.name IS NOT NULL
ORDER BY rs.column_ordinal",
        schema = quote(schema),
        routine = quote(routine)
    )
}

pub fn first_result_set_errors(schema: &str, routine: &str) -> String {
    format!(
        "SELECT error_message
FROM sys.dm_exec_describe_first_result_set('{schema}.{routine}', NULL, 0) rs",
        schema = quote(schema),
        routine = quote(routine)
    )
}

pub const TABLE_TYPES: &str = "SELECT DISTINCT tt.name AS TableTypeName, c.name AS ColumnName, CAST(t.max_length AS int) AS max_length, t.precision, t.scale, t.is_nullable,
    ISNULL(ut.name, t.name) AS TypeName, c.column_id, s.name AS SchemaName
FROM sys.table_types tt
JOIN sys.columns c ON tt.type_table_object_id = c.object_id
JOIN sys.schemas s ON tt.schema_id = s.schema_id
LEFT JOIN sys.types t ON c.system_type_id = t.system_type_id AND t.is_user_defined = 0 AND t.name <> 'sysname'
LEFT JOIN sys.types ut ON c.user_type_id = ut.user_type_id AND ut.name <> 'AUTO_ID'
WHERE tt.is_user_defined = 1
ORDER BY s.name, c.column_id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_doubles_apostrophes() {
        assert_eq!(quote("O'Brien"), "O''Brien");
        assert_eq!(quote("plain"), "plain");
    }

    #[test]
    fn test_identifiers_are_quoted() {
        let sql = routine_body("dbo", "Get'Stuff");
        assert!(sql.contains("OBJECT_ID('dbo.Get''Stuff')"));
    }

    #[test]
    fn test_procedures_filters_schema() {
        assert!(procedures("sales").contains("WHERE s.name = 'sales'"));
    }
}
