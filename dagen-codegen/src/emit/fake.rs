//! In-memory test doubles of the repository.

use dagen_core::default_initializer;

use crate::{
    builder::CodeBuilder,
    emit::{contract, repository},
    model::RoutineModel,
    shape::ReturnContract,
};

/// Value `{Name}_Data` starts out with.
fn initial_data(contract: &ReturnContract) -> Option<String> {
    match contract {
        ReturnContract::List { row_class } => Some(format!("new List<{row_class}>()")),
        ReturnContract::Single { row_class }
        | ReturnContract::SingleOrDefault { row_class }
        | ReturnContract::Output { row_class } => Some(format!("new {row_class}()")),
        ReturnContract::Scalar { property, .. } => Some(
            default_initializer(&property.target_type)
                .unwrap_or("default")
                .to_string(),
        ),
        ReturnContract::None => None,
    }
}

fn with_data(b: CodeBuilder, routine: &RoutineModel, payload: &str) -> CodeBuilder {
    let fake = routine.fake_repository();
    let data = format!("{}_Data", routine.class);
    match &routine.contract {
        ReturnContract::List { row_class } => b
            .block(&format!("public {fake} WithData({row_class} item)"), |b| {
                b.line(&format!("{data}.Add(item);")).line("return this;")
            }),
        _ => b.block(&format!("public {fake} WithData({payload} item)"), |b| {
            b.line(&format!("{data} = item;")).line("return this;")
        }),
    }
}

/// Canned data, the overridable delegate and the method forwarding to it.
pub fn fake_method(routine: &RoutineModel) -> String {
    let class = &routine.class;
    let fake = routine.fake_repository();
    let task = routine.contract.task_type();
    let payload = routine.contract.payload_type();
    let signature = contract::canonical_signature(routine);

    let (delegate_type, lambda_arguments, call_arguments) = if routine.has_parameters() {
        (
            format!("Func<{}, {fake}, {task}>", routine.parameters_class()),
            "(parameters, repository)",
            "parameters, this",
        )
    } else {
        (format!("Func<{fake}, {task}>"), "(repository)", "this")
    };

    match (payload, initial_data(&routine.contract)) {
        (Some(payload), Some(initial)) => CodeBuilder::csharp()
            .line(&format!("public {payload} {class}_Data = {initial};"))
            .blank()
            .line(&format!(
                "public {delegate_type} {class}_Delegate = {lambda_arguments} => Task.FromResult(repository.{class}_Data);"
            ))
            .blank()
            .block(&format!("public async {signature}"), |b| {
                b.line(&format!("return await {class}_Delegate({call_arguments});"))
            })
            .blank()
            .with(|b| with_data(b, routine, &payload))
            .build(),
        _ => CodeBuilder::csharp()
            .line(&format!(
                "public {delegate_type} {class}_Delegate = {lambda_arguments} => Task.CompletedTask;"
            ))
            .blank()
            .block(&format!("public async {signature}"), |b| {
                b.line(&format!("await {class}_Delegate({call_arguments});"))
            })
            .build(),
    }
}

/// Body of `Fake/{Name}.generated.cs`.
pub fn fake_file(routine: &RoutineModel) -> String {
    let header = format!(
        "public partial class {} : I{}",
        routine.fake_repository(),
        routine.repository
    );
    CodeBuilder::csharp()
        .block(&header, |b| {
            b.lines(&fake_method(routine))
                .blank()
                .lines(&repository::shorthand_methods(routine))
        })
        .build()
}

#[cfg(test)]
mod tests {
    use dagen_catalog::{ParameterDescriptor, ResultColumnDescriptor};

    use super::*;
    use crate::model::{Binding, ParameterModel, ResultProperty};

    fn routine(with_parameter: bool, contract: ReturnContract) -> RoutineModel {
        let parameters = if with_parameter {
            vec![ParameterModel {
                argument: "id".into(),
                property: "Id".into(),
                descriptor: ParameterDescriptor::new("@Id", "int"),
                target_type: "int?".into(),
                binding: Binding::Scalar { tag: "Int" },
            }]
        } else {
            vec![]
        };
        RoutineModel {
            schema: "dbo".into(),
            proc: "GetCustomer".into(),
            class: "GetCustomer".into(),
            repository: "ShopRepository".into(),
            parameters,
            contract,
            properties: vec![],
        }
    }

    #[test]
    fn test_list_with_parameters() {
        let model = routine(
            true,
            ReturnContract::List {
                row_class: "GetCustomer_ResultSet".into(),
            },
        );
        insta::assert_snapshot!(fake_method(&model), @r"
        public List<GetCustomer_ResultSet> GetCustomer_Data = new List<GetCustomer_ResultSet>();

        public Func<GetCustomer_Parameters, FakeShopRepository, Task<List<GetCustomer_ResultSet>>> GetCustomer_Delegate = (parameters, repository) => Task.FromResult(repository.GetCustomer_Data);

        public async Task<List<GetCustomer_ResultSet>> GetCustomer(GetCustomer_Parameters parameters)
        {
            return await GetCustomer_Delegate(parameters, this);
        }

        public FakeShopRepository WithData(GetCustomer_ResultSet item)
        {
            GetCustomer_Data.Add(item);
            return this;
        }
        ");
    }

    #[test]
    fn test_single_or_default_strips_optional_marker_from_new() {
        let model = routine(
            false,
            ReturnContract::SingleOrDefault {
                row_class: "GetCustomer_ResultSet".into(),
            },
        );
        let method = fake_method(&model);
        assert!(method.contains(
            "public GetCustomer_ResultSet? GetCustomer_Data = new GetCustomer_ResultSet();"
        ));
        assert!(method.contains(
            "public Func<FakeShopRepository, Task<GetCustomer_ResultSet?>> GetCustomer_Delegate = (repository) => Task.FromResult(repository.GetCustomer_Data);"
        ));
        assert!(method.contains("public FakeShopRepository WithData(GetCustomer_ResultSet? item)"));
        assert!(method.contains("GetCustomer_Data = item;"));
    }

    #[test]
    fn test_scalar_data_defaults() {
        let count = ResultProperty::from_column(&ResultColumnDescriptor::new("Total", "int", false)).unwrap();
        let name = ResultProperty::from_column(&ResultColumnDescriptor::new("Name", "varchar", false)).unwrap();
        let row_class = "GetCustomer_ResultSet".to_string();

        let count_fake = fake_method(&routine(
            false,
            ReturnContract::Scalar {
                row_class: row_class.clone(),
                property: count,
            },
        ));
        let name_fake = fake_method(&routine(
            false,
            ReturnContract::Scalar {
                row_class,
                property: name,
            },
        ));

        assert!(count_fake.contains("public int GetCustomer_Data = default;"));
        assert!(name_fake.contains("public string? GetCustomer_Data = \"\";"));
    }

    #[test]
    fn test_no_payload() {
        let with_parameters = fake_method(&routine(true, ReturnContract::None));
        let without_parameters = fake_method(&routine(false, ReturnContract::None));

        insta::assert_snapshot!(with_parameters, @r"
        public Func<GetCustomer_Parameters, FakeShopRepository, Task> GetCustomer_Delegate = (parameters, repository) => Task.CompletedTask;

        public async Task GetCustomer(GetCustomer_Parameters parameters)
        {
            await GetCustomer_Delegate(parameters, this);
        }
        ");
        assert!(without_parameters.contains(
            "public Func<FakeShopRepository, Task> GetCustomer_Delegate = (repository) => Task.CompletedTask;"
        ));
        assert!(!without_parameters.contains("_Data"));
    }

    #[test]
    fn test_fake_file_includes_shorthands() {
        let file = fake_file(&routine(true, ReturnContract::None));
        assert!(file.starts_with("public partial class FakeShopRepository : IShopRepository"));
        assert!(file.contains("public async Task GetCustomer(int? id)"));
    }
}
