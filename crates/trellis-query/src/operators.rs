//! Filter operator tables and translation into filter expressions.
//!
//! Operator names come from the query surface (`@filter(startsWith: ...)`,
//! scalar filter calls); each maps to a fixed SPARQL operator. A name not in
//! the table but spelled `not<Operator>` is rewritten to the positive
//! operator wrapped in a negation. `regex` always matches against the
//! string-cast form of the bound variable.

use crate::error::RewriteError;
use crate::sparql::{Expr, Literal, Operator};
use crate::syntax::ast::{InputValueDefinition, TypeRef, Value};

/// Operators available on any scalar kind.
const ANY_OPS: &[&str] = &["is", "not"];

/// Operators available on numeric kinds.
const NUMERIC_OPS: &[&str] = &[
    "is",
    "not",
    "lessThan",
    "greaterThan",
    "lessThanOrEqualTo",
    "greaterThanOrEqualTo",
];

/// Operators available on textual kinds.
const STRING_OPS: &[&str] = &["is", "not", "contains", "startsWith", "endsWith", "regex"];

/// List-membership operators, available on every kind.
const LIST_OPS: &[&str] = &["in", "notIn"];

/// Full operator-name table used by the `@filter` directive.
fn lookup(name: &str) -> Option<Operator> {
    match name {
        "is" | "equals" => Some(Operator::Eq),
        "not" | "notEquals" => Some(Operator::Ne),
        "in" => Some(Operator::In),
        "notIn" => Some(Operator::NotIn),
        "lessThan" => Some(Operator::Lt),
        "greaterThan" => Some(Operator::Gt),
        "lessThanOrEqualTo" => Some(Operator::Le),
        "greaterThanOrEqualTo" => Some(Operator::Ge),
        "contains" => Some(Operator::Contains),
        "startsWith" => Some(Operator::StrStarts),
        "endsWith" => Some(Operator::StrEnds),
        "regex" => Some(Operator::Regex),
        _ => None,
    }
}

/// Flat (non-list) operator names for a built-in scalar type.
pub fn flat_operators(scalar_type: &str) -> Option<&'static [&'static str]> {
    match scalar_type {
        "Boolean" => Some(ANY_OPS),
        "Int" | "Float" => Some(NUMERIC_OPS),
        "String" | "ID" => Some(STRING_OPS),
        _ => None,
    }
}

pub fn list_operators() -> &'static [&'static str] {
    LIST_OPS
}

/// Resolve an operator name, applying the `not`-prefix rewrite.
fn resolve(
    name: &str,
    permitted: impl Fn(&str) -> bool,
) -> Result<(Operator, bool), RewriteError> {
    if permitted(name) {
        if let Some(op) = lookup(name) {
            return Ok((op, false));
        }
    }
    if let Some(rest) = name.strip_prefix("not") {
        if let Some(first) = rest.chars().next() {
            let positive = format!(
                "{}{}",
                first.to_ascii_lowercase(),
                &rest[first.len_utf8()..]
            );
            if permitted(&positive) {
                if let Some(op) = lookup(&positive) {
                    return Ok((op, true));
                }
            }
        }
    }
    Err(RewriteError::translation(format!(
        "Unknown operator \"{name}\""
    )))
}

fn assemble(op: Operator, negate: bool, var: &str, value: &Value) -> Result<Expr, RewriteError> {
    let target = if op == Operator::Regex {
        Expr::Str(Box::new(Expr::Var(var.to_string())))
    } else {
        Expr::Var(var.to_string())
    };
    let expr = Expr::Call {
        op,
        args: vec![target, value_expr(value)?],
    };
    Ok(if negate {
        Expr::Not(Box::new(expr))
    } else {
        expr
    })
}

/// Translate one `@filter` argument into an expression on `var`.
pub fn build_filter(operator_name: &str, var: &str, value: &Value) -> Result<Expr, RewriteError> {
    let (op, negate) = resolve(operator_name, |name| lookup(name).is_some())?;
    assemble(op, negate, var, value)
}

/// Translate one scalar filter-call argument, restricted to the operator set
/// of the field's declared scalar type.
pub fn build_scalar_filter(
    scalar_type: &str,
    operator_name: &str,
    var: &str,
    value: &Value,
) -> Result<Expr, RewriteError> {
    let flat = flat_operators(scalar_type).ok_or_else(|| {
        RewriteError::translation(format!(
            "Type {scalar_type} does not support filter arguments"
        ))
    })?;
    let (op, negate) = resolve(operator_name, |name| {
        flat.contains(&name) || LIST_OPS.contains(&name)
    })?;
    assemble(op, negate, var, value)
}

fn value_expr(value: &Value) -> Result<Expr, RewriteError> {
    match value {
        Value::List(items) => items
            .iter()
            .map(value_expr)
            .collect::<Result<Vec<_>, _>>()
            .map(Expr::List),
        other => literal_from_value(other).map(Expr::Literal),
    }
}

/// Literal construction for argument values.
pub fn literal_from_value(value: &Value) -> Result<Literal, RewriteError> {
    match value {
        Value::String(s) => Ok(Literal::plain(s.clone())),
        Value::Boolean(b) => Ok(Literal::boolean(*b)),
        Value::Int(i) => Ok(Literal::integer(*i)),
        Value::Float(f) => Ok(Literal::decimal(*f)),
        other => Err(RewriteError::unsupported(format!(
            "Unhandled argument value type: {}",
            other.kind_name()
        ))),
    }
}

/// The filter argument set a flat scalar field of `scalar_type` exposes.
pub fn scalar_filter_arguments(scalar_type: &str) -> Vec<InputValueDefinition> {
    let mut arguments = Vec::new();
    if let Some(flat) = flat_operators(scalar_type) {
        for op in flat {
            arguments.push(InputValueDefinition {
                name: (*op).to_string(),
                ty: TypeRef::Named(scalar_type.to_string()),
                default: None,
            });
        }
        for op in LIST_OPS {
            arguments.push(InputValueDefinition {
                name: (*op).to_string(),
                ty: TypeRef::List(Box::new(TypeRef::Named(scalar_type.to_string()))),
                default: None,
            });
        }
    }
    arguments
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("is", Operator::Eq; "is maps to equality")]
    #[test_case("equals", Operator::Eq; "equals maps to equality")]
    #[test_case("not", Operator::Ne; "not maps to inequality")]
    #[test_case("notEquals", Operator::Ne; "notEquals maps to inequality")]
    #[test_case("lessThan", Operator::Lt; "lessThan")]
    #[test_case("greaterThan", Operator::Gt; "greaterThan")]
    #[test_case("lessThanOrEqualTo", Operator::Le; "lessThanOrEqualTo")]
    #[test_case("greaterThanOrEqualTo", Operator::Ge; "greaterThanOrEqualTo")]
    #[test_case("contains", Operator::Contains; "contains")]
    #[test_case("startsWith", Operator::StrStarts; "startsWith")]
    #[test_case("endsWith", Operator::StrEnds; "endsWith")]
    #[test_case("in", Operator::In; "list membership")]
    #[test_case("notIn", Operator::NotIn; "negated list membership")]
    fn operator_table(name: &str, expected: Operator) {
        assert_eq!(lookup(name), Some(expected));
    }

    #[test]
    fn build_filter_simple_comparison() {
        let expr = build_filter("startsWith", "name_value", &Value::String("A".into())).unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                op: Operator::StrStarts,
                args: vec![
                    Expr::Var("name_value".to_string()),
                    Expr::Literal(Literal::plain("A")),
                ],
            }
        );
    }

    #[test]
    fn build_filter_not_prefix_negates() {
        let expr = build_filter("notContains", "v", &Value::String("x".into())).unwrap();
        match expr {
            Expr::Not(inner) => match *inner {
                Expr::Call { op, .. } => assert_eq!(op, Operator::Contains),
                other => panic!("expected call, got {:?}", other),
            },
            other => panic!("expected negation, got {:?}", other),
        }
    }

    #[test]
    fn build_filter_regex_casts_to_string() {
        let expr = build_filter("regex", "v", &Value::String("^a".into())).unwrap();
        match expr {
            Expr::Call { op, args } => {
                assert_eq!(op, Operator::Regex);
                assert_eq!(args[0], Expr::Str(Box::new(Expr::Var("v".to_string()))));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn build_filter_unknown_operator() {
        let err = build_filter("sounds", "v", &Value::String("x".into())).unwrap_err();
        assert_eq!(err.to_string(), "Unknown operator \"sounds\"");
    }

    #[test]
    fn build_filter_list_values() {
        let expr = build_filter(
            "in",
            "v",
            &Value::List(vec![Value::String("a".into()), Value::Int(2)]),
        )
        .unwrap();
        match expr {
            Expr::Call { op, args } => {
                assert_eq!(op, Operator::In);
                assert_eq!(
                    args[1],
                    Expr::List(vec![
                        Expr::Literal(Literal::plain("a")),
                        Expr::Literal(Literal::integer(2)),
                    ])
                );
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn scalar_filter_respects_declared_kind() {
        // Numeric comparisons are not in the Boolean set.
        assert!(build_scalar_filter("Boolean", "lessThan", "v", &Value::Int(1)).is_err());
        assert!(build_scalar_filter("Int", "lessThan", "v", &Value::Int(1)).is_ok());
        assert!(build_scalar_filter("String", "notContains", "v", &Value::String("x".into())).is_ok());
        assert!(build_scalar_filter("Int", "in", "v", &Value::List(vec![Value::Int(1)])).is_ok());
    }

    #[test]
    fn scalar_filter_arguments_cover_flat_and_list_operators() {
        let arguments = scalar_filter_arguments("String");
        let names: Vec<&str> = arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["is", "not", "contains", "startsWith", "endsWith", "regex", "in", "notIn"]
        );
        let in_arg = arguments.iter().find(|a| a.name == "in").unwrap();
        assert_eq!(
            in_arg.ty,
            TypeRef::List(Box::new(TypeRef::Named("String".to_string())))
        );
    }

    #[test]
    fn literal_construction() {
        assert_eq!(
            literal_from_value(&Value::Float(1.5)).unwrap(),
            Literal::decimal(1.5)
        );
        assert!(literal_from_value(&Value::Null).is_err());
        assert!(literal_from_value(&Value::Enum("RED".into())).is_err());
    }
}
