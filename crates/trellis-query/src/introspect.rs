//! Schema meta-query responder.
//!
//! Queries whose root selections are only `__schema`/`__type` never reach
//! the store: they are answered from the registry built over the
//! filter-transformed schema, so clients see the filterable argument surface
//! without per-field declaration. Everything else returns `None` and flows
//! to the compiler.

use serde_json::{json, Map as JsonMap, Value as Json};

use crate::schema::filters::{add_object_filters, add_scalar_filters};
use crate::schema::{TypeEntry, TypeRegistry};
use crate::syntax::ast::{Field, FieldDefinition, SchemaDocument, Selection, Value};
use crate::syntax::parse_document;

/// Answers `__schema` / `__type` name-listing queries.
#[derive(Debug, Clone)]
pub struct Introspection {
    registry: TypeRegistry,
}

impl Introspection {
    /// Build the responder over the filter-transformed schema.
    pub fn new(document: &SchemaDocument) -> Self {
        let transformed = add_scalar_filters(add_object_filters(document.clone()));
        Self {
            registry: TypeRegistry::from_document(&transformed),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Answer a meta-query, or `None` when the query must go to the compiler.
    ///
    /// Parse failures also return `None`: the compiler owns error reporting.
    pub fn respond(&self, query: &str) -> Option<Json> {
        let document = parse_document(query).ok()?;
        let operation = document.operations.first()?;

        let mut roots = Vec::new();
        for selection in &operation.selection_set {
            match selection {
                Selection::Field(field)
                    if field.name == "__schema" || field.name == "__type" =>
                {
                    roots.push(field);
                }
                _ => return None,
            }
        }
        if roots.is_empty() {
            return None;
        }

        let mut data = JsonMap::new();
        for field in roots {
            let value = if field.name == "__schema" {
                self.schema_value(&field.selection_set)
            } else {
                let name = field.arguments.iter().find_map(|argument| {
                    match (&argument.name[..], &argument.value) {
                        ("name", Value::String(name)) => Some(name.as_str()),
                        _ => None,
                    }
                });
                match name.and_then(|name| self.registry.get(name)) {
                    Some(entry) => self.type_value(entry, &field.selection_set),
                    None => Json::Null,
                }
            };
            data.insert(field.label().to_string(), value);
        }
        tracing::debug!("answered introspection query from the registry");
        Some(Json::Object(data))
    }

    fn schema_value(&self, selections: &[Selection]) -> Json {
        let mut out = JsonMap::new();
        for field in fields_of(selections) {
            let value = match field.name.as_str() {
                "types" => Json::Array(
                    self.registry
                        .iter()
                        .map(|(_, entry)| self.type_value(entry, &field.selection_set))
                        .collect(),
                ),
                "queryType" => match self.registry.get("Query") {
                    Some(entry) => self.type_value(entry, &field.selection_set),
                    None => Json::Null,
                },
                _ => Json::Null,
            };
            out.insert(field.label().to_string(), value);
        }
        Json::Object(out)
    }

    fn type_value(&self, entry: &TypeEntry, selections: &[Selection]) -> Json {
        let mut out = JsonMap::new();
        for field in fields_of(selections) {
            let value = match field.name.as_str() {
                "name" => json!(entry.label),
                "fields" => Json::Array(
                    entry
                        .fields
                        .values()
                        .map(|definition| field_value(definition, &field.selection_set))
                        .collect(),
                ),
                _ => Json::Null,
            };
            out.insert(field.label().to_string(), value);
        }
        Json::Object(out)
    }
}

fn field_value(definition: &FieldDefinition, selections: &[Selection]) -> Json {
    let mut out = JsonMap::new();
    for field in fields_of(selections) {
        let value = match field.name.as_str() {
            "name" => json!(definition.name),
            "args" => Json::Array(
                definition
                    .arguments
                    .iter()
                    .map(|argument| {
                        let mut arg = JsonMap::new();
                        for inner in fields_of(&field.selection_set) {
                            let value = if inner.name == "name" {
                                json!(argument.name)
                            } else {
                                Json::Null
                            };
                            arg.insert(inner.label().to_string(), value);
                        }
                        Json::Object(arg)
                    })
                    .collect(),
            ),
            _ => Json::Null,
        };
        out.insert(field.label().to_string(), value);
    }
    Json::Object(out)
}

fn fields_of(selections: &[Selection]) -> impl Iterator<Item = &Field> {
    selections.iter().filter_map(|selection| match selection {
        Selection::Field(field) => Some(field),
        _ => None,
    })
}
