//! Plain data classes: parameter holders, result holders and row-set rows.

use dagen_catalog::RowSetType;
use dagen_core::TypeMappingError;

use crate::{
    builder::CodeBuilder,
    model::{ParameterModel, ResultProperty, RoutineModel},
};

fn parameter_summary(b: CodeBuilder, parameter: &ParameterModel) -> CodeBuilder {
    let default = parameter.descriptor.default_value.as_deref();
    if !parameter.is_output() && default.is_none() {
        return b;
    }
    b.xml_doc("<summary>")
        .when(parameter.is_output(), |b| b.xml_doc("Output parameter"))
        .when_some(default, |b, value| b.xml_doc(&format!("Default Value: {value}")))
        .xml_doc("</summary>")
}

/// `{Name}_Parameters`, or `None` for a routine without parameters.
pub fn parameters_class(routine: &RoutineModel) -> Option<String> {
    if !routine.has_parameters() {
        return None;
    }
    let code = CodeBuilder::csharp()
        .block(
            &format!("public partial class {}", routine.parameters_class()),
            |b| {
                b.each(&routine.parameters, |b, p| {
                    parameter_summary(b, p).line(&format!(
                        "public {} {} {{ get; set; }}",
                        p.target_type, p.property
                    ))
                })
            },
        )
        .build();
    Some(code)
}

fn properties_class(class: &str, properties: &[ResultProperty]) -> String {
    CodeBuilder::csharp()
        .block(&format!("public partial class {class}"), |b| {
            b.each(properties, |b, p| b.line(&p.declaration()))
        })
        .build()
}

/// `{Name}_ResultSet`, or `None` when the contract has no payload.
pub fn result_set_class(routine: &RoutineModel) -> Option<String> {
    let class = routine.contract.row_class()?;
    Some(properties_class(class, &routine.properties))
}

/// The row class of a table-valued parameter type.
pub fn row_set_class(row_set: &RowSetType) -> Result<String, TypeMappingError> {
    let properties = row_set
        .columns
        .iter()
        .map(ResultProperty::from_column)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(properties_class(&row_set.class_name(), &properties))
}
