//! Starter client-query generation from a schema document.
//!
//! For every type carrying the `@object` directive: one fragment of its flat
//! scalar fields, a `GetAll<Type>s` query, and one lookup query per scalar
//! field — `At` for `ID`/`@unique` fields, `Only` for booleans, `Having` for
//! the rest.

use trellis_query::syntax::ast::{SchemaDocument, TypeKind, TypeRef};
use trellis_query::vocab::is_scalar_type;

pub fn generate(document: &SchemaDocument) -> String {
    let mut out = String::new();

    for definition in &document.definitions {
        if definition.kind != TypeKind::Object
            || !definition.directives.iter().any(|d| d.name == "object")
        {
            continue;
        }

        let type_name = definition.name.as_str();
        let fragment = format!("{}Info", camel(type_name));

        let scalars: Vec<String> = definition
            .fields
            .iter()
            .filter(|field| matches!(&field.ty, TypeRef::Named(name) if is_scalar_type(name)))
            .map(|field| field.name.clone())
            .collect();
        out.push_str(&group(
            &format!("fragment {fragment} on {type_name}"),
            &scalars,
        ));

        out.push_str(&group(
            &format!("query GetAll{type_name}s"),
            &[format!("{}s {{ ...{fragment} }}", camel(type_name))],
        ));

        for field in &definition.fields {
            // One list level is looked through; deeper wrappers are skipped.
            let ty = match &field.ty {
                TypeRef::List(inner) => inner.as_ref(),
                other => other,
            };
            let TypeRef::Named(scalar) = ty else {
                continue;
            };
            if !is_scalar_type(scalar) {
                continue;
            }

            let field_name = field.name.as_str();
            if scalar == "Boolean" {
                out.push_str(&group(
                    &format!(
                        "query GetOnly{}{}s(${field_name}: Boolean = true)",
                        pascal(field_name),
                        type_name
                    ),
                    &[format!(
                        "{}s({field_name}: ${field_name}) {{ ...{fragment} }}",
                        camel(type_name)
                    )],
                ));
                continue;
            }

            let unique = scalar == "ID" || field.directive("unique").is_some();
            let (plurality, predicate) = if unique { ("", "At") } else { ("s", "Having") };
            out.push_str(&group(
                &format!(
                    "query Get{type_name}{plurality}{predicate}{}(${field_name}: {scalar})",
                    pascal(field_name)
                ),
                &[format!(
                    "{}{plurality}({field_name}: ${field_name}) {{ ...{fragment} }}",
                    camel(type_name)
                )],
            ));
        }
    }

    out
}

fn group(declaration: &str, statements: &[String]) -> String {
    let mut block = format!("{declaration} {{");
    for statement in statements {
        block.push_str("\n  ");
        block.push_str(statement);
    }
    block.push_str("\n}\n\n");
    block
}

fn camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn pascal(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
