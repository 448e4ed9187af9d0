//! Return contracts: what a generated method hands back to its caller.
//!
//! A routine's [`ShapePolicy`] and its discovered columns and output
//! parameters are reduced to one [`ReturnContract`] by [`resolve_contract`].
//! Every emitter matches on the contract, so a new policy has to be handled
//! everywhere before the crate compiles again.

use dagen_core::ShapePolicy;
use thiserror::Error;

use crate::model::ResultProperty;

/// A policy whose preconditions do not hold for the routine.
///
/// Messages match what users of the generator already search their logs for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error(
        "{routine} has no return columns. Please change the Return setting from {policy} to the appropriate type or update the procedure. It might need to be set to None if there should not be results."
    )]
    NoColumns { routine: String, policy: ShapePolicy },

    #[error(
        "Scalar return type is only valid for procedures with a single return column. Failure on {routine}. Found the following columns: {}",
        .columns.join(", ")
    )]
    ScalarColumns { routine: String, columns: Vec<String> },

    #[error(
        "Output return type is only valid for procedures with output parameters. Failure on {routine}. No output parameters found."
    )]
    NoOutputParameters { routine: String },
}

/// The return side of a generated method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnContract {
    /// Every row, as `List<Row>`.
    List { row_class: String },
    /// Exactly one row.
    Single { row_class: String },
    /// Zero or one row, as `Row?`.
    SingleOrDefault { row_class: String },
    /// The one column of the one row.
    Scalar {
        row_class: String,
        property: ResultProperty,
    },
    /// A row built from the output parameters after the call.
    Output { row_class: String },
    /// Nothing beyond completion.
    None,
}

impl ReturnContract {
    /// The C# type wrapped by the returned `Task`, if any.
    pub fn payload_type(&self) -> Option<String> {
        match self {
            ReturnContract::List { row_class } => Some(format!("List<{row_class}>")),
            ReturnContract::Single { row_class } | ReturnContract::Output { row_class } => {
                Some(row_class.clone())
            }
            ReturnContract::SingleOrDefault { row_class } => Some(format!("{row_class}?")),
            ReturnContract::Scalar { property, .. } => Some(property.target_type.clone()),
            ReturnContract::None => None,
        }
    }

    /// `Task<Payload>`, or `Task` when there is no payload.
    pub fn task_type(&self) -> String {
        match self.payload_type() {
            Some(payload) => format!("Task<{payload}>"),
            None => "Task".to_string(),
        }
    }

    pub fn has_payload(&self) -> bool {
        !matches!(self, ReturnContract::None)
    }

    /// Name of the result-holder class, if one is emitted.
    pub fn row_class(&self) -> Option<&str> {
        match self {
            ReturnContract::List { row_class }
            | ReturnContract::Single { row_class }
            | ReturnContract::SingleOrDefault { row_class }
            | ReturnContract::Scalar { row_class, .. }
            | ReturnContract::Output { row_class } => Some(row_class),
            ReturnContract::None => None,
        }
    }

    /// Whether the call reads rows through a `SqlDataReader`.
    pub fn reads_rows(&self) -> bool {
        match self {
            ReturnContract::List { .. }
            | ReturnContract::Single { .. }
            | ReturnContract::SingleOrDefault { .. }
            | ReturnContract::Scalar { .. } => true,
            ReturnContract::Output { .. } | ReturnContract::None => false,
        }
    }

    /// Final statement of the calling method.
    pub fn return_statement(&self) -> Option<String> {
        match self {
            ReturnContract::List { .. } => Some("return results;".to_string()),
            ReturnContract::Single { .. } | ReturnContract::Output { .. } => {
                Some("return results.Single();".to_string())
            }
            ReturnContract::SingleOrDefault { .. } => {
                Some("return results.SingleOrDefault();".to_string())
            }
            ReturnContract::Scalar { property, .. } => {
                Some(format!("return results.Single().{};", property.name))
            }
            ReturnContract::None => None,
        }
    }

    pub fn policy(&self) -> ShapePolicy {
        match self {
            ReturnContract::List { .. } => ShapePolicy::List,
            ReturnContract::Single { .. } => ShapePolicy::Single,
            ReturnContract::SingleOrDefault { .. } => ShapePolicy::SingleOrDefault,
            ReturnContract::Scalar { .. } => ShapePolicy::Scalar,
            ReturnContract::Output { .. } => ShapePolicy::Output,
            ReturnContract::None => ShapePolicy::None,
        }
    }
}

/// Contract, result-holder properties and the violated precondition, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub contract: ReturnContract,
    pub properties: Vec<ResultProperty>,
    pub error: Option<ShapeError>,
}

impl Resolution {
    fn ok(contract: ReturnContract, properties: Vec<ResultProperty>) -> Self {
        Self {
            contract,
            properties,
            error: None,
        }
    }

    /// A failed precondition degrades the routine to no payload.
    fn failed(error: ShapeError) -> Self {
        Self {
            contract: ReturnContract::None,
            properties: Vec::new(),
            error: Some(error),
        }
    }
}

/// Decide the return contract of `routine`.
///
/// An unset policy behaves like [`ShapePolicy::List`].
pub fn resolve_contract(
    policy: Option<ShapePolicy>,
    routine: &str,
    class: &str,
    columns: Vec<ResultProperty>,
    outputs: Vec<ResultProperty>,
) -> Resolution {
    let row_class = format!("{class}_ResultSet");
    let policy = policy.unwrap_or(ShapePolicy::List);

    let no_columns = || {
        Resolution::failed(ShapeError::NoColumns {
            routine: routine.to_string(),
            policy,
        })
    };

    match policy {
        ShapePolicy::List if columns.is_empty() => no_columns(),
        ShapePolicy::List => Resolution::ok(ReturnContract::List { row_class }, columns),
        ShapePolicy::Single if columns.is_empty() => no_columns(),
        ShapePolicy::Single => Resolution::ok(ReturnContract::Single { row_class }, columns),
        ShapePolicy::SingleOrDefault if columns.is_empty() => no_columns(),
        ShapePolicy::SingleOrDefault => {
            Resolution::ok(ReturnContract::SingleOrDefault { row_class }, columns)
        }
        ShapePolicy::Scalar => match <[ResultProperty; 1]>::try_from(columns) {
            Ok([property]) => Resolution::ok(
                ReturnContract::Scalar {
                    row_class,
                    property: property.clone(),
                },
                vec![property],
            ),
            Err(columns) => Resolution::failed(ShapeError::ScalarColumns {
                routine: routine.to_string(),
                columns: columns.into_iter().map(|c| c.source).collect(),
            }),
        },
        ShapePolicy::Output if outputs.is_empty() => {
            Resolution::failed(ShapeError::NoOutputParameters {
                routine: routine.to_string(),
            })
        }
        ShapePolicy::Output => Resolution::ok(ReturnContract::Output { row_class }, outputs),
        ShapePolicy::None => Resolution::ok(ReturnContract::None, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, target_type: &str) -> ResultProperty {
        ResultProperty {
            name: name.to_string(),
            source: name.to_string(),
            target_type: target_type.to_string(),
            nullable: true,
            initializer: None,
        }
    }

    #[test]
    fn test_unset_policy_is_list() {
        let resolution = resolve_contract(None, "GetOrders", "GetOrders", vec![column("Id", "int?")], vec![]);
        assert_eq!(resolution.contract.policy(), ShapePolicy::List);
        assert_eq!(
            resolution.contract.task_type(),
            "Task<List<GetOrders_ResultSet>>"
        );
        assert!(resolution.error.is_none());
    }

    #[test]
    fn test_list_without_columns_is_an_error() {
        let resolution = resolve_contract(None, "usp_Touch", "Touch", vec![], vec![]);
        assert_eq!(resolution.contract, ReturnContract::None);
        assert_eq!(
            resolution.error.unwrap().to_string(),
            "usp_Touch has no return columns. Please change the Return setting from List to the appropriate type or update the procedure. It might need to be set to None if there should not be results."
        );
    }

    #[test]
    fn test_single_or_default_payload_is_optional() {
        let resolution = resolve_contract(
            Some(ShapePolicy::SingleOrDefault),
            "GetCustomer",
            "GetCustomer",
            vec![column("Name", "string?")],
            vec![],
        );
        assert_eq!(
            resolution.contract.payload_type().as_deref(),
            Some("GetCustomer_ResultSet?")
        );
        assert_eq!(
            resolution.contract.return_statement().as_deref(),
            Some("return results.SingleOrDefault();")
        );
    }

    #[test]
    fn test_scalar_uses_the_column_type() {
        let resolution = resolve_contract(
            Some(ShapePolicy::Scalar),
            "CountOrders",
            "CountOrders",
            vec![column("Total", "int")],
            vec![],
        );
        assert_eq!(resolution.contract.task_type(), "Task<int>");
        assert_eq!(
            resolution.contract.return_statement().as_deref(),
            Some("return results.Single().Total;")
        );
        assert_eq!(resolution.properties.len(), 1);
    }

    #[test]
    fn test_scalar_with_two_columns_fails() {
        let resolution = resolve_contract(
            Some(ShapePolicy::Scalar),
            "GetPair",
            "GetPair",
            vec![column("A", "int?"), column("B", "int?")],
            vec![],
        );
        assert_eq!(resolution.contract, ReturnContract::None);
        assert!(resolution.properties.is_empty());
        assert_eq!(
            resolution.error.unwrap().to_string(),
            "Scalar return type is only valid for procedures with a single return column. Failure on GetPair. Found the following columns: A, B"
        );
    }

    #[test]
    fn test_output_requires_output_parameters() {
        let resolution =
            resolve_contract(Some(ShapePolicy::Output), "Save", "Save", vec![], vec![]);
        assert_eq!(
            resolution.error,
            Some(ShapeError::NoOutputParameters {
                routine: "Save".to_string()
            })
        );
        assert!(!resolution.contract.has_payload());
    }

    #[test]
    fn test_output_ignores_result_columns() {
        let resolution = resolve_contract(
            Some(ShapePolicy::Output),
            "Save",
            "Save",
            vec![column("Ignored", "int?")],
            vec![column("ID", "int?")],
        );
        assert!(!resolution.contract.reads_rows());
        assert_eq!(resolution.properties[0].name, "ID");
        assert_eq!(
            resolution.contract.return_statement().as_deref(),
            Some("return results.Single();")
        );
    }

    #[test]
    fn test_none_never_fails() {
        let resolution = resolve_contract(Some(ShapePolicy::None), "Touch", "Touch", vec![column("X", "int?")], vec![]);
        assert_eq!(resolution.contract.task_type(), "Task");
        assert!(resolution.contract.return_statement().is_none());
        assert!(resolution.properties.is_empty());
        assert!(resolution.error.is_none());
    }
}
