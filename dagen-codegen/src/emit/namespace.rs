//! File framing shared by every artifact.

use std::collections::BTreeSet;

use crate::builder::CodeBuilder;

/// Namespaces whose use can be read off the generated text.
const DETECTED_USINGS: &[(&[&str], &[&str])] = &[
    (&["SqlConnection", "SqlCommand"], &["Microsoft.Data.SqlClient"]),
    (&["CommandType"], &["System.Data", "System.Data.SqlTypes"]),
    (&["List<"], &["System.Collections.Generic"]),
    (&["Task<", "Task "], &["System.Threading.Tasks"]),
    (&[".Single(", ".SingleOrDefault(", ".Select("], &["System.Linq"]),
];

/// The sorted `using` directives `content` needs.
pub fn usings_for(content: &str, extra: &[&str]) -> BTreeSet<String> {
    let mut usings: BTreeSet<String> = extra.iter().map(|s| s.to_string()).collect();
    usings.insert("System".to_string());
    for (markers, namespaces) in DETECTED_USINGS {
        if markers.iter().any(|m| content.contains(m)) {
            usings.extend(namespaces.iter().map(|s| s.to_string()));
        }
    }
    usings
}

/// Wrap `content` in a file-scoped namespace with its usings and the generated-file header.
///
/// `version` is only written into the repository base files.
pub fn wrap_in_namespace(
    content: &str,
    namespace: &str,
    version: Option<&str>,
    extra_usings: &[&str],
) -> String {
    let header = match version {
        Some(version) => format!(
            "// This file was generated by dagen {version}. Please do not change manually."
        ),
        None => "// This file was generated by dagen. Please do not change manually.".to_string(),
    };

    CodeBuilder::csharp()
        .line("#nullable enable")
        .each(usings_for(content, extra_usings), |b, using| {
            b.line(&format!("using {using};"))
        })
        .blank()
        .line(&header)
        .block(&format!("namespace {namespace}"), |b| b.lines(content))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_is_always_imported() {
        let usings = usings_for("public partial class A {}", &[]);
        assert_eq!(usings.into_iter().collect::<Vec<_>>(), vec!["System"]);
    }

    #[test]
    fn test_usings_follow_content() {
        let content = "using (SqlCommand cm = new SqlCommand(\"[dbo].[A]\", connection){CommandType = CommandType.StoredProcedure})\nvar results = new List<A_ResultSet>();\nreturn results.Single();\npublic async Task<A_ResultSet> A()";
        let usings: Vec<_> = usings_for(content, &[]).into_iter().collect();
        assert_eq!(
            usings,
            vec![
                "Microsoft.Data.SqlClient",
                "System",
                "System.Collections.Generic",
                "System.Data",
                "System.Data.SqlTypes",
                "System.Linq",
                "System.Threading.Tasks",
            ]
        );
    }

    #[test]
    fn test_extra_usings_are_sorted_in() {
        let usings: Vec<_> = usings_for("public async Task A()", &["Shop.Data"])
            .into_iter()
            .collect();
        assert_eq!(usings, vec!["Shop.Data", "System", "System.Threading.Tasks"]);
    }

    #[test]
    fn test_wrap_in_namespace() {
        let wrapped = wrap_in_namespace("public partial class A\n{\n}", "Shop.Data", None, &[]);
        insta::assert_snapshot!(wrapped, @r"
        #nullable enable
        using System;

        // This file was generated by dagen. Please do not change manually.
        namespace Shop.Data
        {
            public partial class A
            {
            }
        }
        ");
    }

    #[test]
    fn test_versioned_header() {
        let wrapped = wrap_in_namespace("", "Shop.Data", Some("0.3.0"), &[]);
        assert!(wrapped.contains("// This file was generated by dagen 0.3.0. Please do not change manually."));
    }
}
