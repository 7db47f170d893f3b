//! The graph-pattern plan: closed AST for the generated SPARQL query.
//!
//! The compiler builds these values; [`render`](crate::sparql::render) turns
//! them into query text. Every node kind is a variant here and the renderer
//! matches them exhaustively, so adding a pattern kind without a rendering
//! rule fails to build.

pub mod render;
pub mod results;

use std::collections::BTreeSet;

use crate::shape::ObjectShape;
use crate::vocab::{XSD_BOOLEAN, XSD_DECIMAL, XSD_INTEGER};

/// A term in a triple pattern position.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Var(String),
    Iri(String),
    Literal(Literal),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }
}

/// An RDF literal with optional datatype.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<String>,
}

impl Literal {
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            lexical: if value { "true" } else { "false" }.to_string(),
            datatype: Some(XSD_BOOLEAN.to_string()),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self {
            lexical: value.to_string(),
            datatype: Some(XSD_INTEGER.to_string()),
        }
    }

    pub fn decimal(value: f64) -> Self {
        Self {
            lexical: value.to_string(),
            datatype: Some(XSD_DECIMAL.to_string()),
        }
    }
}

/// Predicate position: a named property, its inverse path, or a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Iri(String),
    /// Property path traversed in the reverse direction (`^<iri>`).
    Inverse(String),
    Var(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Predicate,
    pub object: Term,
}

/// One clause of the WHERE block, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Bgp(Vec<TriplePattern>),
    Filter(Expr),
}

/// Filter operators, each with a fixed SPARQL spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    In,
    NotIn,
    Contains,
    StrStarts,
    StrEnds,
    Regex,
}

/// Filter expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Var(String),
    Literal(Literal),
    List(Vec<Expr>),
    Call { op: Operator, args: Vec<Expr> },
    Not(Box<Expr>),
    /// `STR(...)` cast, used so regex matching always sees a textual form.
    Str(Box<Expr>),
}

/// Result-set modifiers derived from the operation's pagination directive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Modifiers {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub order: Vec<OrderKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub variable: String,
    pub descending: bool,
}

/// Compiler output: WHERE clauses, the shape descriptor built in lockstep,
/// and result-set modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct SparqlPlan {
    pub where_clauses: Vec<Pattern>,
    pub shape: ObjectShape,
    pub modifiers: Modifiers,
}

impl SparqlPlan {
    /// Every variable name appearing anywhere in the pattern.
    pub fn pattern_variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        for clause in &self.where_clauses {
            match clause {
                Pattern::Bgp(triples) => {
                    for triple in triples {
                        collect_term(&triple.subject, &mut vars);
                        if let Predicate::Var(name) = &triple.predicate {
                            vars.insert(name.clone());
                        }
                        collect_term(&triple.object, &mut vars);
                    }
                }
                Pattern::Filter(expr) => collect_expr(expr, &mut vars),
            }
        }
        vars
    }
}

fn collect_term(term: &Term, vars: &mut BTreeSet<String>) {
    if let Term::Var(name) = term {
        vars.insert(name.clone());
    }
}

fn collect_expr(expr: &Expr, vars: &mut BTreeSet<String>) {
    match expr {
        Expr::Var(name) => {
            vars.insert(name.clone());
        }
        Expr::Literal(_) => {}
        Expr::List(items) => {
            for item in items {
                collect_expr(item, vars);
            }
        }
        Expr::Call { args, .. } => {
            for arg in args {
                collect_expr(arg, vars);
            }
        }
        Expr::Not(inner) | Expr::Str(inner) => collect_expr(inner, vars),
    }
}
