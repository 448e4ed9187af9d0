//! Resolved view of a routine, ready for emission.
//!
//! Catalog descriptors carry SQL names and types. The models here carry the
//! C# names and types derived from them, so emitters only concatenate text.

use std::sync::Arc;

use dagen_catalog::{ParameterDescriptor, ResultColumnDescriptor, RowSetType, SchemaIntrospector};
use dagen_core::{
    default_initializer, is_reference_type, to_binding_tag, to_identifier, to_parameter_case,
    to_target_type,
};

use crate::{error::GenerationError, shape::ReturnContract};

/// One property of a result holder or row-set class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultProperty {
    /// C# property name
    pub name: String,
    /// Column or parameter name the value is read from
    pub source: String,
    /// Declared C# type, including any `?`
    pub target_type: String,
    /// Whether the database may hand back `NULL`
    pub nullable: bool,
    pub initializer: Option<&'static str>,
}

impl ResultProperty {
    /// Property for a result or row-set column.
    ///
    /// Reference types are always declared nullable. A non-nullable `string`
    /// or `byte[]` column also gets an initializer.
    pub fn from_column(column: &ResultColumnDescriptor) -> Result<Self, dagen_core::TypeMappingError> {
        let base = to_target_type(&column.type_name, false, None)?;
        let target_type = if column.nullable || is_reference_type(&base) {
            format!("{base}?")
        } else {
            base.clone()
        };
        Ok(Self {
            name: to_identifier(&column.name),
            source: column.name.clone(),
            target_type,
            nullable: column.nullable,
            initializer: if column.nullable {
                None
            } else {
                default_initializer(&base)
            },
        })
    }

    /// Property of an Output result holder, read back from a parameter.
    pub fn from_output(parameter: &ParameterModel) -> Self {
        Self {
            name: parameter.property.clone(),
            source: parameter.descriptor.name.clone(),
            target_type: parameter.target_type.clone(),
            nullable: true,
            initializer: None,
        }
    }

    /// `public T Name { get; set; }`, with the initializer if there is one.
    pub fn declaration(&self) -> String {
        match self.initializer {
            Some(value) => format!(
                "public {} {} {{ get; set; }} = {};",
                self.target_type, self.name, value
            ),
            None => format!("public {} {} {{ get; set; }}", self.target_type, self.name),
        }
    }
}

/// How a parameter is bound on the `SqlCommand`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A plain value with its `SqlDbType` member name.
    Scalar { tag: &'static str },
    /// A table-valued parameter sent as a `DataTable`.
    RowSet {
        row_set: Arc<RowSetType>,
        /// Non-nullable C# type of each column, in column order
        column_types: Vec<String>,
    },
}

/// A routine parameter with its C# surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterModel {
    pub descriptor: ParameterDescriptor,
    /// Property on `{Name}_Parameters`
    pub property: String,
    /// Argument name in shorthand overloads
    pub argument: String,
    /// Always nullable
    pub target_type: String,
    pub binding: Binding,
}

impl ParameterModel {
    /// Resolve the C# type and binding of a parameter.
    ///
    /// Row-set types are looked up first, which marks them as used.
    pub fn resolve(
        routine: &str,
        descriptor: ParameterDescriptor,
        introspector: &dyn SchemaIntrospector,
    ) -> Result<Self, GenerationError> {
        let property = to_identifier(&descriptor.name);
        let argument = to_parameter_case(&property);
        let row_set = introspector.user_defined_type(&descriptor.type_schema, &descriptor.type_name)?;

        let (target_type, binding) = match row_set {
            Some(row_set) => {
                let target = to_target_type(&descriptor.type_name, true, Some(&row_set.class_name()))
                    .map_err(|e| GenerationError::type_mapping(routine, e))?;
                let column_types = row_set
                    .columns
                    .iter()
                    .map(|c| to_target_type(&c.type_name, false, None))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| GenerationError::type_mapping(routine, e))?;
                (
                    target,
                    Binding::RowSet {
                        row_set,
                        column_types,
                    },
                )
            }
            None => {
                let tag = to_binding_tag(&descriptor.type_name)
                    .map_err(|e| GenerationError::type_mapping(routine, e))?;
                let target = to_target_type(&descriptor.type_name, true, None)
                    .map_err(|e| GenerationError::type_mapping(routine, e))?;
                (target, Binding::Scalar { tag })
            }
        };

        Ok(Self {
            descriptor,
            property,
            argument,
            target_type,
            binding,
        })
    }

    pub fn is_output(&self) -> bool {
        self.descriptor.is_output
    }

    /// Only bound when a value is supplied, so the database default applies.
    pub fn binds_conditionally(&self) -> bool {
        self.descriptor.default_value.is_some() && !self.descriptor.is_output
    }

    pub fn row_set(&self) -> Option<&Arc<RowSetType>> {
        match &self.binding {
            Binding::RowSet { row_set, .. } => Some(row_set),
            Binding::Scalar { .. } => None,
        }
    }
}

/// The `IEnumerable<T>` overload of a routine taking one single-column row set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSetShorthand<'a> {
    pub parameter: &'a ParameterModel,
    pub row_class: String,
    /// Property the sequence items are assigned to
    pub column_property: String,
    pub element_type: String,
}

/// Everything needed to emit the artifacts of one routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineModel {
    pub schema: String,
    /// Catalog name, used in the `SqlCommand` text
    pub proc: String,
    /// Generated method and class-name prefix
    pub class: String,
    pub repository: String,
    pub parameters: Vec<ParameterModel>,
    pub contract: ReturnContract,
    /// Properties of `{class}_ResultSet`
    pub properties: Vec<ResultProperty>,
}

impl RoutineModel {
    pub fn parameters_class(&self) -> String {
        format!("{}_Parameters", self.class)
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn output_parameters(&self) -> impl Iterator<Item = &ParameterModel> {
        self.parameters.iter().filter(|p| p.is_output())
    }

    pub fn fake_repository(&self) -> String {
        format!("Fake{}", self.repository)
    }

    /// Positional overloads are only offered for short parameter lists.
    pub fn has_shorthand(&self) -> bool {
        (1..4).contains(&self.parameters.len())
    }

    /// The lone parameter when it is a one-column row-set type.
    pub fn row_set_shorthand(&self) -> Option<RowSetShorthand<'_>> {
        let [parameter] = self.parameters.as_slice() else {
            return None;
        };
        let Binding::RowSet {
            row_set,
            column_types,
        } = &parameter.binding
        else {
            return None;
        };
        let column = row_set.single_column()?;
        Some(RowSetShorthand {
            parameter,
            row_class: row_set.class_name(),
            column_property: to_identifier(&column.name),
            element_type: column_types.first()?.clone(),
        })
    }
}
