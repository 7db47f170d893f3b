//! The shape descriptor: how solution rows map back into nested output.
//!
//! A shape tree mirrors the query's selection structure and is built in
//! lockstep with the graph pattern, so every variable it references appears
//! in the emitted pattern. The JSON projection ([`ObjectShape::to_json`])
//! uses the compact binder notation (`$iri`, `$any`, `@`-prefixed hidden
//! scalars, `@hide`) and exists for diagnostics and snapshot tests.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::{json, Value as Json};

/// One node of the shape tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeNode {
    /// Leaf bound to a result variable.
    Scalar { var: String, hidden: bool },
    /// Nested object materialized from the same row set.
    Object(ObjectShape),
    /// Repeated context: rows are bucketed by the template's grouping
    /// variable and the template is materialized once per bucket.
    Array(ObjectShape),
}

/// An object-shaped node: output keys plus the bookkeeping variables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    /// Variable whose binding identifies this object (`$iri`).
    pub group_var: Option<String>,
    /// Variable bound to a wildcard predicate (`$any`).
    pub any_var: Option<String>,
    /// Whole subtree suppressed from output.
    pub hidden: bool,
    pub entries: IndexMap<String, ShapeNode>,
}

impl ObjectShape {
    /// JSON projection in the compact binder notation.
    pub fn to_json(&self) -> Json {
        let mut out = serde_json::Map::new();
        if let Some(any) = &self.any_var {
            out.insert("$any".to_string(), json!(any));
        }
        if let Some(group) = &self.group_var {
            out.insert("$iri".to_string(), json!(group));
        }
        if self.hidden {
            out.insert("@hide".to_string(), json!(true));
        }
        for (key, node) in &self.entries {
            let value = match node {
                ShapeNode::Scalar { var, hidden } => {
                    if *hidden {
                        json!(format!("@{var}"))
                    } else {
                        json!(var)
                    }
                }
                ShapeNode::Object(shape) => shape.to_json(),
                ShapeNode::Array(shape) => Json::Array(vec![shape.to_json()]),
            };
            out.insert(key.clone(), value);
        }
        Json::Object(out)
    }

    /// Every result variable this shape references.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        if let Some(group) = &self.group_var {
            vars.insert(group.clone());
        }
        if let Some(any) = &self.any_var {
            vars.insert(any.clone());
        }
        for node in self.entries.values() {
            match node {
                ShapeNode::Scalar { var, .. } => {
                    vars.insert(var.clone());
                }
                ShapeNode::Object(shape) | ShapeNode::Array(shape) => {
                    shape.collect_variables(vars);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shape() -> ObjectShape {
        let mut inner = ObjectShape {
            group_var: Some("items_node".to_string()),
            ..Default::default()
        };
        inner.entries.insert(
            "name".to_string(),
            ShapeNode::Scalar {
                var: "name_value".to_string(),
                hidden: false,
            },
        );
        inner.entries.insert(
            "secret".to_string(),
            ShapeNode::Scalar {
                var: "secret_value".to_string(),
                hidden: true,
            },
        );

        let mut root = ObjectShape::default();
        root.entries.insert("items".to_string(), ShapeNode::Array(inner));
        root
    }

    #[test]
    fn json_projection_uses_binder_notation() {
        let json = sample_shape().to_json();
        assert_eq!(
            json,
            json!({
                "items": [{
                    "$iri": "items_node",
                    "name": "name_value",
                    "secret": "@secret_value"
                }]
            })
        );
    }

    #[test]
    fn variables_walks_the_whole_tree() {
        let vars = sample_shape().variables();
        assert!(vars.contains("items_node"));
        assert!(vars.contains("name_value"));
        assert!(vars.contains("secret_value"));
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn hidden_object_carries_hide_flag() {
        let mut root = ObjectShape::default();
        root.entries.insert(
            "internal".to_string(),
            ShapeNode::Object(ObjectShape {
                group_var: Some("internal_node".to_string()),
                hidden: true,
                ..Default::default()
            }),
        );
        assert_eq!(
            root.to_json(),
            json!({ "internal": { "$iri": "internal_node", "@hide": true } })
        );
    }
}
