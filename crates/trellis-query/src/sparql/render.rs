//! Serialize a [`SparqlPlan`] into SPARQL query text.
//!
//! Rendering is deterministic: the same plan always yields the same text.
//! Well-known namespaces are compacted through the prefix block; every other
//! IRI is emitted in full bracket form.

use super::{Expr, Literal, Modifiers, Operator, Pattern, Predicate, SparqlPlan, Term};
use crate::vocab::{RDF_NS, XSD_NS};

/// Render a complete `SELECT * WHERE { ... }` query with modifiers.
pub fn render(plan: &SparqlPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("PREFIX rdf: <{RDF_NS}>\n"));
    out.push_str(&format!("PREFIX xsd: <{XSD_NS}>\n"));
    out.push_str("SELECT * WHERE {\n");
    for clause in &plan.where_clauses {
        match clause {
            Pattern::Bgp(triples) => {
                for triple in triples {
                    out.push_str("  ");
                    out.push_str(&render_term(&triple.subject));
                    out.push(' ');
                    out.push_str(&render_predicate(&triple.predicate));
                    out.push(' ');
                    out.push_str(&render_term(&triple.object));
                    out.push_str(" .\n");
                }
            }
            Pattern::Filter(expr) => {
                out.push_str("  FILTER(");
                out.push_str(&render_expr(expr));
                out.push_str(")\n");
            }
        }
    }
    out.push('}');
    out.push_str(&render_modifiers(&plan.modifiers));
    out
}

fn render_modifiers(modifiers: &Modifiers) -> String {
    let mut out = String::new();
    if !modifiers.order.is_empty() {
        let keys = modifiers
            .order
            .iter()
            .map(|key| {
                if key.descending {
                    format!("DESC(?{})", key.variable)
                } else {
                    format!("?{}", key.variable)
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!("\nORDER BY {keys}"));
    }
    if let Some(limit) = modifiers.limit {
        out.push_str(&format!("\nLIMIT {limit}"));
    }
    if let Some(offset) = modifiers.offset {
        out.push_str(&format!("\nOFFSET {offset}"));
    }
    out
}

fn render_term(term: &Term) -> String {
    match term {
        Term::Var(name) => format!("?{name}"),
        Term::Iri(iri) => render_iri(iri),
        Term::Literal(literal) => render_literal(literal),
    }
}

fn render_predicate(predicate: &Predicate) -> String {
    match predicate {
        Predicate::Iri(iri) => render_iri(iri),
        Predicate::Inverse(iri) => format!("^{}", render_iri(iri)),
        Predicate::Var(name) => format!("?{name}"),
    }
}

fn render_iri(iri: &str) -> String {
    if let Some(local) = iri.strip_prefix(RDF_NS) {
        return format!("rdf:{local}");
    }
    if let Some(local) = iri.strip_prefix(XSD_NS) {
        return format!("xsd:{local}");
    }
    format!("<{iri}>")
}

fn render_literal(literal: &Literal) -> String {
    let quoted = format!("\"{}\"", escape(&literal.lexical));
    match &literal.datatype {
        Some(datatype) => format!("{quoted}^^{}", render_iri(datatype)),
        None => quoted,
    }
}

fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Var(name) => format!("?{name}"),
        Expr::Literal(literal) => render_literal(literal),
        Expr::List(items) => {
            let rendered = items.iter().map(render_expr).collect::<Vec<_>>();
            format!("({})", rendered.join(", "))
        }
        Expr::Call { op, args } => render_call(*op, args),
        Expr::Not(inner) => format!("!({})", render_expr(inner)),
        Expr::Str(inner) => format!("STR({})", render_expr(inner)),
    }
}

fn render_call(op: Operator, args: &[Expr]) -> String {
    let rendered = args.iter().map(render_expr).collect::<Vec<_>>();
    match op {
        Operator::Eq => infix("=", &rendered),
        Operator::Ne => infix("!=", &rendered),
        Operator::Lt => infix("<", &rendered),
        Operator::Gt => infix(">", &rendered),
        Operator::Le => infix("<=", &rendered),
        Operator::Ge => infix(">=", &rendered),
        Operator::In => infix("IN", &rendered),
        Operator::NotIn => infix("NOT IN", &rendered),
        Operator::Contains => format!("CONTAINS({})", rendered.join(", ")),
        Operator::StrStarts => format!("STRSTARTS({})", rendered.join(", ")),
        Operator::StrEnds => format!("STRENDS({})", rendered.join(", ")),
        Operator::Regex => format!("REGEX({})", rendered.join(", ")),
    }
}

fn infix(token: &str, args: &[String]) -> String {
    match args {
        [left, right] => format!("{left} {token} {right}"),
        _ => args.join(&format!(" {token} ")),
    }
}

fn escape(lexical: &str) -> String {
    let mut out = String::with_capacity(lexical.len());
    for c in lexical.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
