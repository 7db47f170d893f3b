//! Variable substitution: validate supplied values against declared types
//! and splice literal nodes in place of every variable use.

use serde_json::{Map as JsonMap, Value as Json};

use crate::error::RewriteError;
use crate::schema::unwrap_type;
use crate::syntax::ast::{Document, Operation, Selection, Value};

/// Substitute caller-supplied values into every operation of `document`.
///
/// Validation is fatal: the first mismatch aborts before compilation starts.
pub fn substitute(
    document: Document,
    variables: &JsonMap<String, Json>,
) -> Result<Document, RewriteError> {
    let mut operations = Vec::with_capacity(document.operations.len());
    for operation in document.operations {
        operations.push(substitute_operation(operation, variables)?);
    }
    Ok(Document {
        operations,
        fragments: document.fragments,
    })
}

fn substitute_operation(
    mut operation: Operation,
    variables: &JsonMap<String, Json>,
) -> Result<Operation, RewriteError> {
    let resolver = Resolver {
        definitions: &operation.variable_definitions,
        variables,
    };
    operation.selection_set = resolver.selections(operation.selection_set)?;
    operation.directives = operation
        .directives
        .into_iter()
        .map(|mut directive| {
            for argument in &mut directive.arguments {
                argument.value = resolver.value(std::mem::replace(&mut argument.value, Value::Null))?;
            }
            Ok(directive)
        })
        .collect::<Result<Vec<_>, RewriteError>>()?;
    Ok(operation)
}

struct Resolver<'a> {
    definitions: &'a [crate::syntax::ast::VariableDef],
    variables: &'a JsonMap<String, Json>,
}

impl Resolver<'_> {
    fn selections(&self, selections: Vec<Selection>) -> Result<Vec<Selection>, RewriteError> {
        selections
            .into_iter()
            .map(|selection| match selection {
                Selection::Field(mut field) => {
                    for argument in &mut field.arguments {
                        argument.value =
                            self.value(std::mem::replace(&mut argument.value, Value::Null))?;
                    }
                    for directive in &mut field.directives {
                        for argument in &mut directive.arguments {
                            argument.value =
                                self.value(std::mem::replace(&mut argument.value, Value::Null))?;
                        }
                    }
                    field.selection_set = self.selections(field.selection_set)?;
                    Ok(Selection::Field(field))
                }
                Selection::InlineFragment(mut fragment) => {
                    fragment.selection_set = self.selections(fragment.selection_set)?;
                    Ok(Selection::InlineFragment(fragment))
                }
                spread @ Selection::FragmentSpread(_) => Ok(spread),
            })
            .collect()
    }

    fn value(&self, value: Value) -> Result<Value, RewriteError> {
        match value {
            Value::Variable(name) => self.resolve(&name),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Ok(other),
        }
    }

    fn resolve(&self, name: &str) -> Result<Value, RewriteError> {
        let definition = self
            .definitions
            .iter()
            .find(|definition| definition.name == name)
            .ok_or_else(|| {
                RewriteError::variable_type(format!("Variable '{name}' was never declared"))
            })?;

        let unwrapped = unwrap_type(&definition.ty).map_err(|_| {
            RewriteError::variable_type(format!(
                "Multi-dimensional list types not supported; Only flat scalar types allowed in variable types at '${name}' variable"
            ))
        })?;

        // Nullability at the outer level.
        let supplied = match self.variables.get(name) {
            None | Some(Json::Null) => {
                if unwrapped.nonnull {
                    return Err(RewriteError::variable_type(format!(
                        "Variable '{name}' expects a non-nullable type but a null value was provided"
                    )));
                }
                return Ok(definition.default.clone().unwrap_or(Value::Null));
            }
            Some(value) => value,
        };

        if unwrapped.plural {
            if !is_testable(unwrapped.name) {
                return Err(RewriteError::variable_type(format!(
                    "Variable '{name}' cannot use {} type because the server does not know how to apply the provided value(s)",
                    unwrapped.name
                )));
            }
            let Json::Array(items) = supplied else {
                return Err(RewriteError::variable_type(format!(
                    "Variable '{name}' expects a list type but a non-array value was provided"
                )));
            };
            if unwrapped.plural_nonnull && items.iter().any(Json::is_null) {
                return Err(RewriteError::variable_type(format!(
                    "Variable '{name}' expects a list of non-nullable {} but at least one null value was passed in the provided list",
                    unwrapped.name
                )));
            }
            let values = items
                .iter()
                .map(|item| {
                    if item.is_null() {
                        Ok(Value::Null)
                    } else {
                        coerce(unwrapped.name, item).ok_or_else(|| {
                            RewriteError::variable_type(format!(
                                "Variable '{name}' expects a list of {} but not every value provided in the list was of the correct type",
                                unwrapped.name
                            ))
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::List(values));
        }

        coerce(unwrapped.name, supplied).ok_or_else(|| {
            if is_testable(unwrapped.name) {
                RewriteError::variable_type(format!(
                    "Variable '{name}' expects a {} but the provided value was not of the correct type",
                    unwrapped.name
                ))
            } else {
                RewriteError::variable_type(format!(
                    "Variable '{name}' cannot use {} type because the server does not know how to apply the provided value(s)",
                    unwrapped.name
                ))
            }
        })
    }
}

fn is_testable(type_name: &str) -> bool {
    matches!(type_name, "String" | "Int" | "Float" | "Boolean")
}

/// Check a JSON value against a declared scalar type and convert it.
fn coerce(type_name: &str, value: &Json) -> Option<Value> {
    match type_name {
        "String" => value.as_str().map(|s| Value::String(s.to_string())),
        "Int" => value.as_i64().map(Value::Int),
        "Float" => value.as_f64().map(Value::Float),
        "Boolean" => value.as_bool().map(Value::Boolean),
        _ => None,
    }
}
