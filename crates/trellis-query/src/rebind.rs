//! The result materializer: flat solution rows back into nested output.
//!
//! Walks the shape descriptor three passes deep at every level: scalar
//! leaves first (coerce, deduplicate, detect divergence), then array nodes
//! (bucket rows by the grouping variable), then object nodes (recurse with
//! the full row set). A multiplicity error aborts its own subtree and
//! propagates upward; sibling keys that were already materialized stay in
//! the output.

use serde_json::{Map as JsonMap, Value as Json};

use crate::error::EvalError;
use crate::shape::{ObjectShape, ShapeNode};
use crate::sparql::results::{RdfTerm, SolutionRow};
use crate::vocab::{local_name, XSD_BOOLEAN, XSD_INTEGER};

/// Materialize `rows` against `shape`.
///
/// Returns the (possibly partial) output object; divergence failures are
/// appended to `errors` with their binding path.
pub fn materialize(rows: &[SolutionRow], shape: &ObjectShape, errors: &mut Vec<EvalError>) -> Json {
    let borrowed: Vec<&SolutionRow> = rows.iter().collect();
    let mut out = JsonMap::new();
    rebind(&borrowed, shape, true, &mut out, &[], errors);
    tracing::debug!(rows = rows.len(), errors = errors.len(), "materialized result");
    Json::Object(out)
}

/// One level of reconstruction. Returns `true` to abort the caller's walk.
fn rebind(
    rows: &[&SolutionRow],
    shape: &ObjectShape,
    emit_group: bool,
    out: &mut JsonMap<String, Json>,
    path: &[String],
    errors: &mut Vec<EvalError>,
) -> bool {
    // Scalar pass. The bookkeeping variables materialize like ordinary
    // leaves: `$any` carries the matched predicate, `$iri` the node identity.
    let mut scalars: Vec<(&str, &str, bool)> = Vec::new();
    if let Some(any) = &shape.any_var {
        scalars.push(("$any", any.as_str(), false));
    }
    if emit_group {
        if let Some(group) = &shape.group_var {
            scalars.push(("$iri", group.as_str(), false));
        }
    }
    for (key, node) in &shape.entries {
        if let ShapeNode::Scalar { var, hidden } = node {
            scalars.push((key.as_str(), var.as_str(), *hidden));
        }
    }

    for (key, var, hidden) in scalars {
        let mut values: Vec<Json> = Vec::new();
        for row in rows {
            let Some(term) = row.get(var) else {
                continue;
            };
            let mut value = term_to_json(term);
            // `__typename` answers with the class IRI's local name.
            if key == "__typename" {
                if let Json::String(iri) = &value {
                    value = Json::String(local_name(iri).to_string());
                }
            }
            if !values.contains(&value) {
                values.push(value);
            }
        }

        if values.len() > 1 {
            errors.push(EvalError::at_path(divergence_message(path, key), path));
            return true;
        }
        if hidden {
            push_hidden(out, key);
            continue;
        }
        if let Some(value) = values.pop() {
            out.insert(key.to_string(), value);
        }
    }

    // Array pass: one output entry per distinct grouping value, in
    // first-seen order, each materialized only from its bucket's rows.
    for (key, node) in &shape.entries {
        let ShapeNode::Array(template) = node else {
            continue;
        };
        if template.hidden {
            push_hidden(out, key);
            continue;
        }
        let Some(group) = &template.group_var else {
            // No grouping variable: behaves like a single nested object.
            let mut nested = JsonMap::new();
            let subpath = extend_path(path, key.clone());
            let aborted = rebind(rows, template, true, &mut nested, &subpath, errors);
            out.insert(key.clone(), Json::Array(vec![Json::Object(nested)]));
            if aborted {
                return true;
            }
            continue;
        };

        let mut buckets: indexmap::IndexMap<String, Vec<&SolutionRow>> =
            indexmap::IndexMap::new();
        for row in rows {
            if let Some(term) = row.get(group) {
                buckets
                    .entry(term.value().to_string())
                    .or_default()
                    .push(row);
            }
        }

        let mut entries = Vec::with_capacity(buckets.len());
        for (iri, bucket) in &buckets {
            let mut object = JsonMap::new();
            object.insert("$iri".to_string(), Json::String(iri.clone()));
            let subpath = extend_path(path, format!("{key}[\"{iri}\"]"));
            if rebind(bucket, template, false, &mut object, &subpath, errors) {
                return true;
            }
            entries.push(Json::Object(object));
        }
        out.insert(key.clone(), Json::Array(entries));
    }

    // Object pass: nested objects see the same full row set.
    for (key, node) in &shape.entries {
        let ShapeNode::Object(nested_shape) = node else {
            continue;
        };
        if nested_shape.hidden {
            push_hidden(out, key);
            continue;
        }
        let mut nested = JsonMap::new();
        let subpath = extend_path(path, key.clone());
        let aborted = rebind(rows, nested_shape, true, &mut nested, &subpath, errors);
        out.insert(key.clone(), Json::Object(nested));
        if aborted {
            return true;
        }
    }

    false
}

fn divergence_message(path: &[String], key: &str) -> String {
    if path.len() <= 1 {
        let selector = path.first().map(String::as_str).unwrap_or(key);
        format!(
            "Multiple results encountered for top-level selector; did you mean to use `{selector}s` instead?"
        )
    } else {
        // Unwrap is safe: the branch above covers the empty path.
        let field = path.last().map(String::as_str).unwrap_or(key);
        format!(
            "Multiple divergent bindings encountered; try adding the `@many` directive to the `{field}` field in order to collate results."
        )
    }
}

fn extend_path(path: &[String], segment: String) -> Vec<String> {
    let mut subpath = Vec::with_capacity(path.len() + 1);
    subpath.extend_from_slice(path);
    subpath.push(segment);
    subpath
}

fn push_hidden(out: &mut JsonMap<String, Json>, key: &str) {
    let list = out
        .entry("@hidden".to_string())
        .or_insert_with(|| Json::Array(Vec::new()));
    if let Json::Array(keys) = list {
        keys.push(Json::String(key.to_string()));
    }
}

/// Coerce one bound term into its output value: URIs pass through as
/// identifier strings, booleans and integers by datatype, everything else
/// keeps its lexical form.
fn term_to_json(term: &RdfTerm) -> Json {
    match term {
        RdfTerm::Uri { value } | RdfTerm::Bnode { value } => Json::String(value.clone()),
        RdfTerm::Literal {
            value, datatype, ..
        } => match datatype.as_deref() {
            Some(XSD_BOOLEAN) => Json::Bool(value == "true"),
            Some(XSD_INTEGER) => match value.parse::<i64>() {
                Ok(number) => Json::Number(number.into()),
                Err(_) => Json::String(value.clone()),
            },
            _ => Json::String(value.clone()),
        },
    }
}
