//! Ahead-of-time schema transforms that attach filter arguments.
//!
//! Applied to the parsed schema before it feeds the introspection responder,
//! so every flat scalar field and every object-referencing field advertises
//! its filterable surface without per-field declaration in the source schema.

use indexmap::IndexMap;

use super::unwrap_type;
use crate::operators::scalar_filter_arguments;
use crate::syntax::ast::{InputValueDefinition, SchemaDocument, TypeRef};
use crate::vocab::is_scalar_type;

/// Give every argument-less flat scalar field the filter argument set of its
/// scalar type.
pub fn add_scalar_filters(mut document: SchemaDocument) -> SchemaDocument {
    for definition in &mut document.definitions {
        for field in &mut definition.fields {
            let Ok(unwrapped) = unwrap_type(&field.ty) else {
                continue;
            };
            if field.arguments.is_empty() && !unwrapped.plural && is_scalar_type(unwrapped.name) {
                field.arguments = scalar_filter_arguments(unwrapped.name);
            }
        }
    }
    document
}

/// Give every argument-less field that references an object type that
/// object's flat scalar fields as arguments.
pub fn add_object_filters(mut document: SchemaDocument) -> SchemaDocument {
    // Collect each object type's flat scalar fields first.
    let mut object_arguments: IndexMap<String, Vec<InputValueDefinition>> = IndexMap::new();
    for definition in &document.definitions {
        let mut scalar_arguments = Vec::new();
        for field in &definition.fields {
            let Ok(unwrapped) = unwrap_type(&field.ty) else {
                continue;
            };
            if is_scalar_type(unwrapped.name) && !unwrapped.plural && field.arguments.is_empty() {
                scalar_arguments.push(InputValueDefinition {
                    name: field.name.clone(),
                    ty: TypeRef::Named(unwrapped.name.to_string()),
                    default: None,
                });
            }
        }
        object_arguments.insert(definition.name.clone(), scalar_arguments);
    }

    for definition in &mut document.definitions {
        for field in &mut definition.fields {
            let Ok(unwrapped) = unwrap_type(&field.ty) else {
                continue;
            };
            if field.arguments.is_empty() {
                if let Some(arguments) = object_arguments.get(unwrapped.name) {
                    field.arguments = arguments.clone();
                }
            }
        }
    }
    document
}
