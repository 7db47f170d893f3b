//! `@skip` / `@include` elision.
//!
//! Runs after variable substitution, so the `if:` arguments are literal
//! booleans. Dropped fields disappear entirely; surviving fields lose both
//! directives.

use crate::syntax::ast::{Document, Field, Selection, Value};

/// Apply skip/include elision to every operation.
pub fn elide(mut document: Document) -> Document {
    for operation in &mut document.operations {
        operation.selection_set = elide_selections(std::mem::take(&mut operation.selection_set));
    }
    document
}

fn elide_selections(selections: Vec<Selection>) -> Vec<Selection> {
    selections
        .into_iter()
        .filter_map(|selection| match selection {
            Selection::Field(field) => elide_field(field).map(Selection::Field),
            Selection::InlineFragment(mut fragment) => {
                fragment.selection_set = elide_selections(fragment.selection_set);
                Some(Selection::InlineFragment(fragment))
            }
            spread @ Selection::FragmentSpread(_) => Some(spread),
        })
        .collect()
}

fn elide_field(mut field: Field) -> Option<Field> {
    if let Some(skip) = field.directive("skip") {
        // An argument-less @skip drops the field too.
        match skip.argument("if") {
            None | Some(Value::Boolean(true)) => return None,
            _ => {}
        }
    }
    if let Some(include) = field.directive("include") {
        if include.argument("if") == Some(&Value::Boolean(false)) {
            return None;
        }
    }

    field
        .directives
        .retain(|directive| directive.name != "skip" && directive.name != "include");
    field.selection_set = elide_selections(field.selection_set);
    Some(field)
}
