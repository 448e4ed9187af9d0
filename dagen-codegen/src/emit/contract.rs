//! The repository interface and the method signatures it shares with implementations.

use crate::{builder::CodeBuilder, model::RoutineModel};

/// `Task<T> Name(Name_Parameters parameters)`, or `Task<T> Name()` without parameters.
pub fn canonical_signature(routine: &RoutineModel) -> String {
    let task = routine.contract.task_type();
    if routine.has_parameters() {
        format!(
            "{task} {}({} parameters)",
            routine.class,
            routine.parameters_class()
        )
    } else {
        format!("{task} {}()", routine.class)
    }
}

/// Positional overload taking each parameter as an argument.
pub fn shorthand_signature(routine: &RoutineModel) -> Option<String> {
    if !routine.has_shorthand() {
        return None;
    }
    let arguments: Vec<String> = routine
        .parameters
        .iter()
        .map(|p| format!("{} {}", p.target_type, p.argument))
        .collect();
    Some(format!(
        "{} {}({})",
        routine.contract.task_type(),
        routine.class,
        arguments.join(", ")
    ))
}

/// Overload taking a sequence of column values instead of row objects.
pub fn row_set_signature(routine: &RoutineModel) -> Option<String> {
    let shorthand = routine.row_set_shorthand()?;
    Some(format!(
        "{} {}(IEnumerable<{}> {})",
        routine.contract.task_type(),
        routine.class,
        shorthand.element_type,
        shorthand.parameter.argument
    ))
}

/// The routine's slice of the partial `I{Repository}` interface.
pub fn interface(routine: &RoutineModel) -> String {
    CodeBuilder::csharp()
        .block(
            &format!("public partial interface I{}", routine.repository),
            |b| {
                b.line(&format!("{};", canonical_signature(routine)))
                    .when_some(shorthand_signature(routine), |b, s| b.line(&format!("{s};")))
                    .when_some(row_set_signature(routine), |b, s| b.line(&format!("{s};")))
            },
        )
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dagen_catalog::{ParameterDescriptor, ResultColumnDescriptor, RowSetType};

    use super::*;
    use crate::{
        model::{Binding, ParameterModel},
        shape::ReturnContract,
    };

    fn scalar(name: &str, target_type: &str) -> ParameterModel {
        let property = dagen_core::to_identifier(name);
        ParameterModel {
            argument: dagen_core::to_parameter_case(&property),
            property,
            descriptor: ParameterDescriptor::new(name, "int"),
            target_type: target_type.to_string(),
            binding: Binding::Scalar { tag: "Int" },
        }
    }

    fn routine(parameters: Vec<ParameterModel>) -> RoutineModel {
        RoutineModel {
            schema: "dbo".into(),
            proc: "GetOrders".into(),
            class: "GetOrders".into(),
            repository: "ShopRepository".into(),
            parameters,
            contract: ReturnContract::List {
                row_class: "GetOrders_ResultSet".into(),
            },
            properties: vec![],
        }
    }

    #[test]
    fn test_interface_without_parameters() {
        insta::assert_snapshot!(interface(&routine(vec![])), @r"
        public partial interface IShopRepository
        {
            Task<List<GetOrders_ResultSet>> GetOrders();
        }
        ");
    }

    #[test]
    fn test_interface_with_shorthand() {
        let model = routine(vec![scalar("@CustomerID", "int?"), scalar("@Year", "int?")]);
        insta::assert_snapshot!(interface(&model), @r"
        public partial interface IShopRepository
        {
            Task<List<GetOrders_ResultSet>> GetOrders(GetOrders_Parameters parameters);
            Task<List<GetOrders_ResultSet>> GetOrders(int? customerId, int? year);
        }
        ");
    }

    #[test]
    fn test_no_shorthand_from_four_parameters() {
        let model = routine(vec![
            scalar("@A", "int?"),
            scalar("@B", "int?"),
            scalar("@C", "int?"),
            scalar("@D", "int?"),
        ]);
        assert!(shorthand_signature(&model).is_none());
        assert_eq!(interface(&model).matches("GetOrders(").count(), 1);
    }

    #[test]
    fn test_row_set_overload() {
        let row_set = Arc::new(RowSetType::new(
            "dbo",
            "GuidList",
            vec![ResultColumnDescriptor::new("Id", "uniqueidentifier", false)],
        ));
        let parameter = ParameterModel {
            argument: "ids".into(),
            property: "Ids".into(),
            descriptor: ParameterDescriptor::new("@Ids", "GuidList").with_type_schema("dbo"),
            target_type: "List<GuidList>?".into(),
            binding: Binding::RowSet {
                row_set,
                column_types: vec!["Guid".into()],
            },
        };
        let model = routine(vec![parameter]);

        assert_eq!(
            row_set_signature(&model).as_deref(),
            Some("Task<List<GetOrders_ResultSet>> GetOrders(IEnumerable<Guid> ids)")
        );
        assert!(interface(&model).contains("GetOrders(List<GuidList>? ids);"));
    }
}
