//! The type registry: object and interface definitions by name.
//!
//! Built once when a rewriter is constructed and read-only afterwards, so a
//! single registry is safely shared across concurrent requests.

pub mod filters;

use indexmap::IndexMap;

use crate::error::RewriteError;
use crate::syntax::ast::{
    Directive, FieldDefinition, SchemaDocument, TypeRef,
};

/// One object or interface type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeEntry {
    pub label: String,
    pub fields: IndexMap<String, FieldDefinition>,
    pub directives: IndexMap<String, Directive>,
}

/// All object/interface types of a schema, keyed by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeEntry>,
}

impl TypeRegistry {
    /// Extract every object and interface definition. Other definition kinds
    /// were already dropped by the schema parser.
    pub fn from_document(document: &SchemaDocument) -> Self {
        let mut types = IndexMap::new();
        for definition in &document.definitions {
            let mut fields = IndexMap::new();
            for field in &definition.fields {
                fields.insert(field.name.clone(), field.clone());
            }
            let mut directives = IndexMap::new();
            for directive in &definition.directives {
                directives.insert(directive.name.clone(), directive.clone());
            }
            types.insert(
                definition.name.clone(),
                TypeEntry {
                    label: definition.name.clone(),
                    fields,
                    directives,
                },
            );
        }
        Self { types }
    }

    pub fn get(&self, name: &str) -> Option<&TypeEntry> {
        self.types.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TypeEntry)> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A type reference with its wrappers unwrapped: one optional non-null
/// wrapper, one optional list level, and the inner non-null wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwrappedType<'a> {
    pub name: &'a str,
    pub nonnull: bool,
    pub plural: bool,
    pub plural_nonnull: bool,
}

/// Unwrap a type reference. Multi-dimensional lists are rejected.
pub fn unwrap_type(ty: &TypeRef) -> Result<UnwrappedType<'_>, RewriteError> {
    let mut nonnull = false;
    let mut plural = false;
    let mut plural_nonnull = false;

    let mut current = ty;
    if let TypeRef::NonNull(inner) = current {
        nonnull = true;
        current = inner;
    }
    if let TypeRef::List(inner) = current {
        plural = true;
        current = inner;
        if let TypeRef::NonNull(inner) = current {
            plural_nonnull = true;
            current = inner;
        }
    }
    match current {
        TypeRef::Named(name) => Ok(UnwrappedType {
            name,
            nonnull,
            plural,
            plural_nonnull,
        }),
        _ => Err(RewriteError::unsupported("Nested list type not allowed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_schema;

    fn registry(schema: &str) -> TypeRegistry {
        TypeRegistry::from_document(&parse_schema(schema).unwrap())
    }

    #[test]
    fn registers_objects_and_interfaces() {
        let registry = registry(
            "type Query { items: [Item] }\n\
             interface Named { name: String }\n\
             type Item @object { name: String }\n\
             scalar DateTime",
        );
        assert_eq!(registry.len(), 3);
        assert!(registry.get("Query").is_some());
        assert!(registry.get("Named").is_some());
        let item = registry.get("Item").unwrap();
        assert_eq!(item.label, "Item");
        assert!(item.directives.contains_key("object"));
        assert!(item.fields.contains_key("name"));
        assert!(registry.get("DateTime").is_none());
    }

    #[test]
    fn unwrap_plain_named_type() {
        let ty = TypeRef::Named("Item".to_string());
        let unwrapped = unwrap_type(&ty).unwrap();
        assert_eq!(unwrapped.name, "Item");
        assert!(!unwrapped.nonnull);
        assert!(!unwrapped.plural);
    }

    #[test]
    fn unwrap_nonnull_list_of_nonnull() {
        let ty = TypeRef::NonNull(Box::new(TypeRef::List(Box::new(TypeRef::NonNull(
            Box::new(TypeRef::Named("Item".to_string())),
        )))));
        let unwrapped = unwrap_type(&ty).unwrap();
        assert_eq!(unwrapped.name, "Item");
        assert!(unwrapped.nonnull);
        assert!(unwrapped.plural);
        assert!(unwrapped.plural_nonnull);
    }

    #[test]
    fn unwrap_rejects_nested_lists() {
        let ty = TypeRef::List(Box::new(TypeRef::List(Box::new(TypeRef::Named(
            "Item".to_string(),
        )))));
        assert!(unwrap_type(&ty).is_err());
    }
}
