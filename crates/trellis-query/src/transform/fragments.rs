//! Fragment inlining: replace every spread with its fragment's selections.

use indexmap::IndexMap;

use crate::error::RewriteError;
use crate::syntax::ast::{Document, FragmentDef, Selection};

/// Collect named fragment definitions, drop them from the document, and
/// splice each spread's selections in place.
pub fn inline(document: Document) -> Result<Document, RewriteError> {
    let mut fragments: IndexMap<String, FragmentDef> = IndexMap::new();
    for fragment in document.fragments {
        fragments.insert(fragment.name.clone(), fragment);
    }

    let mut operations = Vec::with_capacity(document.operations.len());
    for mut operation in document.operations {
        let mut active = Vec::new();
        operation.selection_set = splice(operation.selection_set, &fragments, &mut active)?;
        operations.push(operation);
    }

    Ok(Document {
        operations,
        fragments: Vec::new(),
    })
}

fn splice(
    selections: Vec<Selection>,
    fragments: &IndexMap<String, FragmentDef>,
    active: &mut Vec<String>,
) -> Result<Vec<Selection>, RewriteError> {
    let mut out = Vec::with_capacity(selections.len());
    for selection in selections {
        match selection {
            Selection::FragmentSpread(spread) => {
                let fragment = fragments.get(&spread.name).ok_or_else(|| {
                    RewriteError::schema(format!(
                        "No such fragment was defined in query: \"{}\"",
                        spread.name
                    ))
                })?;
                if active.contains(&spread.name) {
                    return Err(RewriteError::schema(format!(
                        "Fragment cycle detected at \"{}\"",
                        spread.name
                    )));
                }
                active.push(spread.name.clone());
                let inlined = splice(fragment.selection_set.clone(), fragments, active)?;
                active.pop();
                out.extend(inlined);
            }
            Selection::Field(mut field) => {
                field.selection_set = splice(field.selection_set, fragments, active)?;
                out.push(Selection::Field(field));
            }
            Selection::InlineFragment(mut fragment) => {
                fragment.selection_set = splice(fragment.selection_set, fragments, active)?;
                out.push(Selection::InlineFragment(fragment));
            }
        }
    }
    Ok(out)
}
