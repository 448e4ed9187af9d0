//! The ADO.NET implementation of each routine.
//!
//! The same calling method is emitted twice: on the repository itself, where
//! it opens its own connection, and on the nested `TransactionManaged` class,
//! where it joins the connection and transaction handed to `RunTransaction`.

use crate::{
    builder::CodeBuilder,
    emit::{contract, holders},
    model::{Binding, ParameterModel, ResultProperty, RoutineModel},
};

const TRANSACTION_GUARD: &str = "throw new Exception(\"Currently in a transaction. This requires accessing methods from the context repository instance within the RunTransaction call. Please do not use the repository instance defined outside of RunTransaction.\");";

/// Where the calling method gets its connection from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallScope {
    /// Opens a connection per call and refuses to run inside a transaction.
    Standalone,
    /// Uses the `connection` and `transaction` fields of `TransactionManaged`.
    TransactionManaged,
}

fn bind_row_set(b: CodeBuilder, parameter: &ParameterModel, column_types: &[String]) -> CodeBuilder {
    let Some(row_set) = parameter.row_set() else {
        return b;
    };
    let table = format!("dt{}", parameter.property);
    let values: Vec<String> = row_set
        .columns
        .iter()
        .map(|c| format!("(object?)p.{} ?? DBNull.Value", dagen_core::to_identifier(&c.name)))
        .collect();

    b.line(&format!("var {table} = new DataTable();"))
        .each(row_set.columns.iter().zip(column_types), |b, (column, target)| {
            b.line(&format!(
                "{table}.Columns.Add(\"{}\", typeof({target}));",
                column.name
            ))
        })
        .block_with_close(
            &format!(
                "parameters.{}?.ForEach(p => {table}.Rows.Add(new object?[]",
                parameter.property
            ),
            "}));",
            |b| b.lines(&values.join(",\n")),
        )
        .line(&format!(
            "cm.Parameters.Add(new SqlParameter() {{ ParameterName = \"{}\", SqlDbType = SqlDbType.Structured, Value = {table}, TypeName = \"{}.{}\" }});",
            parameter.descriptor.name, parameter.descriptor.type_schema, parameter.descriptor.type_name
        ))
}

fn bind_scalar(b: CodeBuilder, parameter: &ParameterModel, tag: &str) -> CodeBuilder {
    let descriptor = &parameter.descriptor;
    let mut settings = vec![format!(
        "Value = (object?)parameters.{} ?? DBNull.Value",
        parameter.property
    )];
    if descriptor.is_output {
        settings.push("Direction = ParameterDirection.InputOutput".to_string());
    }
    if descriptor.precision != 0 {
        settings.push(format!("Precision = {}", descriptor.precision));
    }
    if descriptor.scale != 0 {
        settings.push(format!("Scale = {}", descriptor.scale));
    }
    if descriptor.max_length != 0 {
        settings.push(format!("Size = {}", descriptor.max_length));
    }

    let add = |b: CodeBuilder| {
        b.block_with_close(
            &format!(
                "cm.Parameters.Add(new SqlParameter(\"{}\", SqlDbType.{tag})",
                descriptor.name
            ),
            "});",
            |b| b.lines(&settings.join(",\n")),
        )
    };

    // out-of-range values fail here rather than inside SqlClient
    let b = b.when(descriptor.type_name.eq_ignore_ascii_case("datetime"), |b| {
        b.line(&format!(
            "SqlDateTime? verify{0} = (SqlDateTime?)parameters.{0};",
            parameter.property
        ))
    });

    if parameter.binds_conditionally() {
        b.block(&format!("if (parameters.{} != null)", parameter.property), add)
    } else {
        add(b)
    }
}

fn assignments(properties: &[ResultProperty], read: impl Fn(&ResultProperty) -> String) -> String {
    properties
        .iter()
        .map(|p| {
            if p.nullable {
                format!("{} = ({}) ConvertDBNullToNull({})", p.name, p.target_type, read(p))
            } else {
                format!("{} = ({}) {}", p.name, p.target_type, read(p))
            }
        })
        .collect::<Vec<_>>()
        .join(",\n")
}

fn read_results(b: CodeBuilder, routine: &RoutineModel) -> CodeBuilder {
    let Some(row_class) = routine.contract.row_class() else {
        return b.line("await cm.ExecuteNonQueryAsync();");
    };

    if routine.contract.reads_rows() {
        let values = assignments(&routine.properties, |p| format!("sdr[\"{}\"]", p.source));
        b.block("using (SqlDataReader sdr = await cm.ExecuteReaderAsync())", |b| {
            b.block("while (await sdr.ReadAsync())", |b| {
                b.block_with_close(&format!("results.Add(new {row_class}()"), "});", |b| {
                    b.lines(&values)
                })
            })
        })
    } else {
        let values = assignments(&routine.properties, |p| {
            format!("cm.Parameters[\"{}\"].Value", p.source)
        });
        b.line("await cm.ExecuteNonQueryAsync();")
            .block_with_close(&format!("results.Add(new {row_class}()"), "});", |b| {
                b.lines(&values)
            })
    }
}

fn command(b: CodeBuilder, routine: &RoutineModel, scope: CallScope) -> CodeBuilder {
    let transaction = match scope {
        CallScope::Standalone => "",
        CallScope::TransactionManaged => ", Transaction = transaction",
    };
    let header = format!(
        "using (SqlCommand cm = new SqlCommand(\"[{}].[{}]\", connection){{CommandType = CommandType.StoredProcedure{transaction}}})",
        routine.schema, routine.proc
    );

    b.block(&header, |b| {
        let b = b.each(&routine.parameters, |b, p| match &p.binding {
            Binding::RowSet { column_types, .. } => bind_row_set(b, p, column_types),
            Binding::Scalar { tag } => bind_scalar(b, p, tag),
        });
        let b = b.line("if (connection.State != ConnectionState.Open) await connection.OpenAsync();");
        read_results(b, routine).each(routine.output_parameters(), |b, p| {
            b.line(&format!(
                "parameters.{} = ({}) ConvertDBNullToNull(cm.Parameters[\"{}\"].Value);",
                p.property, p.target_type, p.descriptor.name
            ))
        })
    })
}

/// The method that calls the stored procedure.
pub fn calling_method(routine: &RoutineModel, scope: CallScope) -> String {
    let standalone = scope == CallScope::Standalone;

    CodeBuilder::csharp()
        .block(
            &format!("public async {}", contract::canonical_signature(routine)),
            |b| {
                b.when(standalone, |b| {
                    b.block("if (_inTransaction)", |b| b.line(TRANSACTION_GUARD))
                })
                .when_some(routine.contract.row_class(), |b, row_class| {
                    b.line(&format!("var results = new List<{row_class}>();"))
                })
                .when(standalone, |b| {
                    b.block(
                        "using (SqlConnection connection = new SqlConnection(_connectionString))",
                        |b| command(b, routine, scope),
                    )
                })
                .when(!standalone, |b| command(b, routine, scope))
                .when_some(routine.contract.return_statement(), |b, s| b.line(&s))
            },
        )
        .build()
}

fn forward_call(routine: &RoutineModel) -> String {
    if routine.contract.has_payload() {
        format!("return await {}(parameters);", routine.class)
    } else {
        format!("await {}(parameters);", routine.class)
    }
}

/// Overloads that build the parameter holder and forward to the canonical method.
pub fn shorthand_methods(routine: &RoutineModel) -> String {
    let positional = contract::shorthand_signature(routine).map(|signature| {
        let assignments: Vec<String> = routine
            .parameters
            .iter()
            .map(|p| format!("{} = {}", p.property, p.argument))
            .collect();
        CodeBuilder::csharp()
            .block(&format!("public async {signature}"), |b| {
                b.block_with_close(
                    &format!("var parameters = new {}()", routine.parameters_class()),
                    "};",
                    |b| b.lines(&assignments.join(",\n")),
                )
                .line(&forward_call(routine))
            })
            .build()
    });

    let row_set = contract::row_set_signature(routine)
        .zip(routine.row_set_shorthand())
        .map(|(signature, shorthand)| {
            CodeBuilder::csharp()
                .block(&format!("public async {signature}"), |b| {
                    b.block_with_close(
                        &format!("var parameters = new {}()", routine.parameters_class()),
                        "};",
                        |b| {
                            b.block_with_close(
                                &format!(
                                    "{} = {}.Select(item => new {}()",
                                    shorthand.parameter.property,
                                    shorthand.parameter.argument,
                                    shorthand.row_class
                                ),
                                "}).ToList()",
                                |b| b.line(&format!("{} = item", shorthand.column_property)),
                            )
                        },
                    )
                    .line(&forward_call(routine))
                })
                .build()
        });

    [positional, row_set]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n")
}

/// Body of `{Name}.generated.cs`.
pub fn routine_file(routine: &RoutineModel) -> String {
    let class_header = format!(
        "public partial class {0} : I{0}",
        routine.repository
    );
    CodeBuilder::csharp()
        .when_some(holders::parameters_class(routine), |b, c| b.lines(&c).blank())
        .when_some(holders::result_set_class(routine), |b, c| b.lines(&c).blank())
        .lines(&contract::interface(routine))
        .blank()
        .block(&class_header, |b| {
            b.lines(&calling_method(routine, CallScope::Standalone))
                .blank()
                .lines(&shorthand_methods(routine))
        })
        .build()
}

/// Body of `{Name}.TransactionManaged.generated.cs`.
pub fn transaction_file(routine: &RoutineModel) -> String {
    let repository = &routine.repository;
    CodeBuilder::csharp()
        .block(&format!("public partial class {repository} : I{repository}"), |b| {
            b.block(
                &format!("public partial class TransactionManaged : I{repository}"),
                |b| {
                    b.lines(&calling_method(routine, CallScope::TransactionManaged))
                        .blank()
                        .lines(&shorthand_methods(routine))
                },
            )
        })
        .build()
}
