use dagen_core::to_default_literal;

use crate::ParameterDescriptor;

/// Build the throwaway call used to discover a result shape by execution.
///
/// Parameters whose type has a generic literal are passed that literal.
/// Every other parameter (row-set types, mostly) is declared as a local
/// variable of its own type and passed empty.
pub fn speculative_call(schema: &str, routine: &str, parameters: &[ParameterDescriptor]) -> String {
    let declarations: Vec<String> = parameters
        .iter()
        .filter(|p| to_default_literal(&p.type_name).is_none())
        .map(|p| format!("DECLARE {} {}.{};", p.name, p.type_schema, p.type_name))
        .collect();

    let arguments: Vec<String> = parameters
        .iter()
        .map(|p| match to_default_literal(&p.type_name) {
            Some(literal) => format!("{} = {}", p.name, literal),
            None => format!("{0} = {0}", p.name),
        })
        .collect();

    format!(
        "{} EXEC {}.{} {}",
        declarations.join(" "),
        schema,
        routine,
        arguments.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_and_declared_variables() {
        let parameters = vec![
            ParameterDescriptor::new("@Name", "varchar").with_max_length(50),
            ParameterDescriptor::new("@Ids", "IdList").with_type_schema("dbo"),
            ParameterDescriptor::new("@Count", "int"),
        ];

        let call = speculative_call("dbo", "Search", &parameters);
        assert_eq!(
            call,
            "DECLARE @Ids dbo.IdList; EXEC dbo.Search @Name = '', @Ids = @Ids, @Count = 0"
        );
    }

    #[test]
    fn test_no_parameters() {
        assert_eq!(speculative_call("dbo", "Ping", &[]), " EXEC dbo.Ping ");
    }

    #[test]
    fn test_uuid_literal_is_fresh() {
        let parameters = vec![ParameterDescriptor::new("@Id", "uniqueidentifier")];
        let first = speculative_call("dbo", "Get", &parameters);
        let second = speculative_call("dbo", "Get", &parameters);
        assert!(first.starts_with(" EXEC dbo.Get @Id = '"));
        assert_ne!(first, second);
    }
}
