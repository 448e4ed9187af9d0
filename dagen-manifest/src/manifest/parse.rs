//! Manifest parsing from files and strings.

use std::{path::Path, str::FromStr};

use super::{
    Manifest,
    validate::{ParseContext, find_table_span, find_value_span},
};
use crate::{Error, Result, error::SourceContext};

const REPOSITORY_HEADER: &str = "[[repository]]";

impl FromStr for Manifest {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        parse_manifest(s, "dagen.toml")
    }
}

impl Manifest {
    /// Parse a dagen.toml file from the given path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Box::new(Error::Io {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        parse_manifest(&content, &path.display().to_string())
    }

    /// Parse a dagen.toml from a string with a custom filename for error reporting.
    pub fn from_str_with_filename(content: &str, filename: &str) -> Result<Self> {
        parse_manifest(content, filename)
    }
}

/// Parse a manifest from content with the given filename for error reporting.
pub fn parse_manifest(content: &str, filename: &str) -> Result<Manifest> {
    let source_ctx = SourceContext::new(content, filename);
    let manifest: Manifest = toml::from_str(content).map_err(|e| source_ctx.parse_error(e))?;
    validate_manifest(&manifest, content, filename)?;
    Ok(manifest)
}

/// Validate the manifest after parsing.
fn validate_manifest(manifest: &Manifest, src: &str, filename: &str) -> Result<()> {
    let ctx = ParseContext::new(src, filename);

    if manifest.repositories.is_empty() {
        return Err(ctx
            .source_context()
            .validation_error("no [[repository]] tables defined", None));
    }

    for (index, repo) in manifest.repositories.iter().enumerate() {
        let table_span = find_table_span(src, REPOSITORY_HEADER, index);
        let repo_ctx = ctx.at(format!("repository #{}", index + 1));

        repo_ctx.require(&repo.connection, "connection", table_span)?;
        repo_ctx.require(&repo.schema, "schema", table_span)?;
        repo_ctx.require(&repo.namespace, "namespace", table_span)?;
        repo_ctx.require(&repo.output.to_string_lossy(), "output", table_span)?;
        repo_ctx.validate_namespace(&repo.namespace)?;
        if let Some(name) = &repo.name {
            repo_ctx.validate_identifier(name, "repository name")?;
        }

        let routine_ctx = ctx.at(format!("routines of repository #{}", index + 1));
        for routine in &repo.routines {
            routine_ctx.require(&routine.proc, "proc", table_span)?;
            if let Some(name) = &routine.name {
                routine_ctx.validate_identifier(name, "routine name")?;
            }
        }
    }

    let mut seen: Vec<String> = Vec::new();
    for repo in &manifest.repositories {
        let name = repo.repository_name();
        if seen.iter().any(|s| s.eq_ignore_ascii_case(&name)) {
            return Err(ctx.source_context().validation_error(
                format!("repository '{}' is defined more than once", name),
                find_value_span(src, &name),
            ));
        }
        seen.push(name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use dagen_core::ShapePolicy;

    use super::*;

    const MINIMAL: &str = r#"
        [[repository]]
        connection = "Server=localhost;Database=Shop"
        schema = "dbo"
        namespace = "Shop.Data"
        output = "Generated"
    "#;

    #[test]
    fn test_parse_minimal_with_defaults() {
        let manifest = Manifest::from_str(MINIMAL).unwrap();
        let repo = &manifest.repositories[0];
        assert_eq!(repo.schema, "dbo");
        assert_eq!(repo.repository_name(), "dboRepository");
        assert!(repo.include_fakes);
        assert!(!repo.allow_execution);
        assert!(repo.routines.is_empty());
    }

    #[test]
    fn test_parse_routines() {
        let manifest = Manifest::from_str(
            r#"
            [[repository]]
            connection = "env:SHOP_DB"
            schema = "sales"
            namespace = "Shop.Sales"
            output = "Sales"
            name = "SalesRepository"
            include_fakes = false
            allow_execution = true

            [[repository.routines]]
            proc = "GetOrder"
            name = "GetOrderById"
            return = "SingleOrDefault"

            [[repository.routines]]
            proc = "ArchiveOrders"
            return = "None"
            lookup_output_types = false
        "#,
        )
        .unwrap();

        let repo = &manifest.repositories[0];
        assert_eq!(repo.repository_name(), "SalesRepository");
        assert!(!repo.include_fakes);
        assert!(repo.allow_execution);
        assert_eq!(repo.routines.len(), 2);
        assert_eq!(repo.routines[0].name.as_deref(), Some("GetOrderById"));
        assert_eq!(repo.routines[0].shape, Some(ShapePolicy::SingleOrDefault));
        assert!(repo.routines[0].lookup_output_types);
        assert_eq!(repo.routines[1].shape, Some(ShapePolicy::None));
        assert!(!repo.routines[1].lookup_output_types);
        assert!(manifest.repository("salesrepository").is_some());
    }

    #[test]
    fn test_no_repositories() {
        let err = Manifest::from_str("").unwrap_err();
        assert!(matches!(*err, Error::Validation { .. }));
    }

    #[test]
    fn test_missing_schema() {
        let err = Manifest::from_str(
            r#"
            [[repository]]
            connection = "x"
            namespace = "Shop.Data"
            output = "Generated"
        "#,
        )
        .unwrap_err();
        match *err {
            Error::MissingField {
                ref field,
                ref context,
                ref span,
                ..
            } => {
                assert_eq!(field, "schema");
                assert_eq!(context, "repository #1");
                assert!(span.is_some());
            }
            ref other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_connection() {
        let err = Manifest::from_str(&MINIMAL.replace("Server=localhost;Database=Shop", " "))
            .unwrap_err();
        assert!(matches!(*err, Error::MissingField { ref field, .. } if field == "connection"));
    }

    #[test]
    fn test_invalid_namespace() {
        let err = Manifest::from_str(&MINIMAL.replace("Shop.Data", "Shop-Data")).unwrap_err();
        assert!(matches!(*err, Error::InvalidNamespace { .. }));
    }

    #[test]
    fn test_invalid_routine_name() {
        let src = format!("{MINIMAL}\n[[repository.routines]]\nproc = \"Get User\"\nname = \"Get User\"\n");
        let err = Manifest::from_str(&src).unwrap_err();
        assert!(matches!(*err, Error::InvalidIdentifier { ref context, .. } if context == "routine name"));
    }

    #[test]
    fn test_empty_proc() {
        let src = format!("{MINIMAL}\n[[repository.routines]]\nname = \"GetUser\"\n");
        let err = Manifest::from_str(&src).unwrap_err();
        assert!(matches!(*err, Error::MissingField { ref field, .. } if field == "proc"));
    }

    #[test]
    fn test_unknown_shape_policy_is_parse_error() {
        let src = format!("{MINIMAL}\n[[repository.routines]]\nproc = \"GetUser\"\nreturn = \"Many\"\n");
        let err = Manifest::from_str(&src).unwrap_err();
        assert!(matches!(*err, Error::Parse { span: Some(_), .. }));
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let err = Manifest::from_str(&format!("{MINIMAL}\nschemas = \"x\"\n")).unwrap_err();
        assert!(matches!(*err, Error::Parse { .. }));
    }

    #[test]
    fn test_duplicate_repository_names() {
        let src = format!("{MINIMAL}\n{MINIMAL}");
        let err = Manifest::from_str(&src).unwrap_err();
        assert!(err.to_string().contains("dboRepository"));
    }

    #[test]
    fn test_resolve_connection_from_env() {
        let manifest = Manifest::from_str(&MINIMAL.replace(
            "Server=localhost;Database=Shop",
            "env:DAGEN_MANIFEST_TEST_UNSET_VARIABLE",
        ))
        .unwrap();
        let err = manifest.repositories[0].resolve_connection().unwrap_err();
        assert!(matches!(*err, Error::MissingEnvVar { ref name, .. } if name == "DAGEN_MANIFEST_TEST_UNSET_VARIABLE"));

        let manifest = Manifest::from_str(MINIMAL).unwrap();
        assert_eq!(
            manifest.repositories[0].resolve_connection().unwrap(),
            "Server=localhost;Database=Shop"
        );
    }

    #[test]
    fn test_output_dir_is_relative_to_manifest() {
        let manifest = Manifest::from_str(MINIMAL).unwrap();
        let dir = manifest.repositories[0].output_dir(Path::new("/work/db"));
        assert_eq!(dir, Path::new("/work/db/Generated"));
    }
}
