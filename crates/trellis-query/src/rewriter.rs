//! The query compiler: a normalized selection tree in, a SPARQL plan out.
//!
//! One recursive descent over the operation builds the basic graph pattern
//! and the shape descriptor in lockstep, so every variable the shape refers
//! to exists in the emitted pattern. Compilation state (symbol issuer,
//! accumulating triples and filters) is scoped to a single [`Rewriter::rewrite`]
//! call; the registry and translator are read-only and shared across requests.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map as JsonMap, Value as Json};

use crate::context::{FieldTranslator, ScalarKind};
use crate::error::{RewriteError, SetupError};
use crate::operators::{build_filter, build_scalar_filter, literal_from_value};
use crate::schema::{unwrap_type, TypeEntry, TypeRegistry};
use crate::shape::{ObjectShape, ShapeNode};
use crate::sparql::{
    Modifiers, OrderKey, Pattern, Predicate, SparqlPlan, Term, TriplePattern,
};
use crate::syntax::ast::{Field, Operation, Selection, Value};
use crate::syntax::parse_document;
use crate::transform::{fragments, skip_include, variables};
use crate::vocab::{is_scalar_type, RDF_TYPE};

/// Reserved field name whose predicate is itself a variable.
const WILDCARD_FIELD: &str = "_any";

/// Field-name prefix denoting reverse-direction traversal.
const INVERSE_PREFIX: &str = "_inv_";

static VARIABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Issues request-scoped variable names, disambiguating repeated labels.
///
/// The first use of a label is returned verbatim; the nth use yields
/// `<label>_n`.
#[derive(Debug, Default)]
pub struct SymbolIssuer {
    counts: indexmap::IndexMap<String, u32>,
}

impl SymbolIssuer {
    pub fn next(&mut self, label: &str) -> String {
        let count = self.counts.entry(label.to_string()).or_insert(0);
        *count += 1;
        if *count > 1 {
            format!("{label}_{count}")
        } else {
            label.to_string()
        }
    }
}

/// Per-request compilation state.
#[derive(Debug, Default)]
struct Compilation {
    symbols: SymbolIssuer,
    bgp: Vec<TriplePattern>,
    filters: Vec<Pattern>,
}

impl Compilation {
    fn next_symbol(&mut self, label: &str) -> String {
        self.symbols.next(label)
    }

    fn push_triple(&mut self, subject: Term, predicate: Predicate, object: Term) {
        self.bgp.push(TriplePattern {
            subject,
            predicate,
            object,
        });
    }
}

/// Translates query documents into SPARQL plans against one schema/context.
#[derive(Debug, Clone)]
pub struct Rewriter {
    registry: TypeRegistry,
    translator: FieldTranslator,
}

impl Rewriter {
    pub fn new(registry: TypeRegistry, translator: FieldTranslator) -> Self {
        Self {
            registry,
            translator,
        }
    }

    /// Build a rewriter straight from schema text and a context document or
    /// base IRI.
    pub fn from_sources(
        schema: &str,
        context: Option<&Json>,
        base: Option<&str>,
    ) -> Result<Self, SetupError> {
        let document = crate::syntax::parse_schema(schema)
            .map_err(|error| SetupError::Schema(error.to_string()))?;
        let registry = TypeRegistry::from_document(&document);
        let translator = FieldTranslator::new(context, base)?;
        Ok(Self::new(registry, translator))
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Compile `query` with caller-supplied `variables` into a plan.
    ///
    /// The first validation failure aborts compilation; no partial plan is
    /// ever returned.
    pub fn rewrite(
        &self,
        query: &str,
        variables: &JsonMap<String, Json>,
    ) -> Result<SparqlPlan, RewriteError> {
        let document = parse_document(query)?;
        let document = fragments::inline(document)?;
        let document = variables::substitute(document, variables)?;
        let document = skip_include::elide(document);

        let operation = document.operations.first().ok_or_else(|| {
            RewriteError::parse("Document contains no executable operation")
        })?;

        let modifiers = parse_paginate(operation)?;

        let mut compilation = Compilation::default();
        let mut shape = ObjectShape::default();
        for selection in &operation.selection_set {
            match selection {
                Selection::Field(field) => {
                    self.compile_root(field, &mut shape, &mut compilation)?;
                }
                Selection::InlineFragment(_) => {
                    return Err(RewriteError::unsupported(
                        "Inline fragments are not supported at the operation root",
                    ));
                }
                Selection::FragmentSpread(spread) => {
                    return Err(RewriteError::schema(format!(
                        "No such fragment was defined in query: \"{}\"",
                        spread.name
                    )));
                }
            }
        }

        tracing::debug!(
            triples = compilation.bgp.len(),
            filters = compilation.filters.len(),
            "compiled query"
        );

        let mut where_clauses = vec![Pattern::Bgp(compilation.bgp)];
        where_clauses.extend(compilation.filters);

        Ok(SparqlPlan {
            where_clauses,
            shape,
            modifiers,
        })
    }

    /// A root selection: resolved against the schema's `Query` type, minting
    /// a fresh subject bound by a class-membership triple.
    fn compile_root(
        &self,
        field: &Field,
        shape: &mut ObjectShape,
        compilation: &mut Compilation,
    ) -> Result<(), RewriteError> {
        let label = field.label().to_string();

        if !field.arguments.is_empty() {
            return Err(RewriteError::unsupported(format!(
                "Arguments on root query field \"{}\" are not implemented",
                field.name
            )));
        }

        let query_type = self
            .registry
            .get("Query")
            .ok_or_else(|| RewriteError::schema("Schema does not define a Query type"))?;

        let definition = query_type.fields.get(&field.name).ok_or_else(|| {
            let expected = query_type
                .fields
                .keys()
                .map(|name| format!("\"{name}\""))
                .collect::<Vec<_>>()
                .join(", ");
            RewriteError::schema(format!(
                "No such root query \"{}\". Expected one of: [{expected}]",
                field.name
            ))
        })?;

        let unwrapped = unwrap_type(&definition.ty)?;
        let entry = self.registry.get(unwrapped.name).ok_or_else(|| {
            RewriteError::schema(format!(
                "Fatal error; no type definition was found for {}",
                unwrapped.name
            ))
        })?;

        let subject = compilation.next_symbol(&format!("{label}_node"));

        // The class triple always leads the patterns of this selection.
        let class = class_name(&field.name, unwrapped.plural);
        let class_iri = self.translator.translate(&class)?.iri;
        compilation.push_triple(
            Term::var(&subject),
            Predicate::Iri(RDF_TYPE.to_string()),
            Term::Iri(class_iri),
        );

        let mut node = ObjectShape {
            group_var: Some(subject.clone()),
            hidden: field.directive("hide").is_some(),
            ..Default::default()
        };
        self.compile_selection_set(
            &field.selection_set,
            &subject,
            Some(entry),
            &mut node,
            compilation,
        )?;

        let shape_node = if unwrapped.plural {
            ShapeNode::Array(node)
        } else {
            ShapeNode::Object(node)
        };
        shape.entries.insert(label, shape_node);
        Ok(())
    }

    /// Compile the selections of one scope: at most one inline fragment type
    /// (its class triple is asserted on `subject` and its type threads to the
    /// fragment's own fields), every plain field against `object_type`.
    fn compile_selection_set(
        &self,
        selections: &[Selection],
        subject: &str,
        object_type: Option<&TypeEntry>,
        node: &mut ObjectShape,
        compilation: &mut Compilation,
    ) -> Result<(), RewriteError> {
        let mut fragment_type = None;
        for selection in selections {
            let Selection::InlineFragment(fragment) = selection else {
                continue;
            };
            if fragment_type.is_some() {
                return Err(RewriteError::unsupported(
                    "Union of inline fragment types not yet implemented",
                ));
            }
            let condition = fragment.type_condition.as_deref().ok_or_else(|| {
                RewriteError::schema("Inline fragment must specify a type condition")
            })?;
            let class_iri = self.translator.translate(condition)?.iri;
            let entry = self.registry.get(condition).ok_or_else(|| {
                RewriteError::schema(format!(
                    "No such object type \"{condition}\" defined."
                ))
            })?;
            compilation.push_triple(
                Term::var(subject),
                Predicate::Iri(RDF_TYPE.to_string()),
                Term::Iri(class_iri),
            );
            fragment_type = Some(entry);
        }

        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    self.compile_field(field, subject, object_type, node, compilation)?;
                }
                Selection::InlineFragment(fragment) => {
                    self.compile_selection_set(
                        &fragment.selection_set,
                        subject,
                        fragment_type,
                        node,
                        compilation,
                    )?;
                }
                Selection::FragmentSpread(spread) => {
                    return Err(RewriteError::schema(format!(
                        "No such fragment was defined in query: \"{}\"",
                        spread.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn compile_field(
        &self,
        field: &Field,
        subject: &str,
        object_type: Option<&TypeEntry>,
        parent: &mut ObjectShape,
        compilation: &mut Compilation,
    ) -> Result<(), RewriteError> {
        let label = field.label().to_string();
        let hidden = field.directive("hide").is_some();

        // Wildcard predicate: the predicate itself is a fresh variable.
        if field.name == WILDCARD_FIELD {
            let symbol = compilation.next_symbol(field.alias.as_deref().unwrap_or("any"));
            let predicate_var = format!("{symbol}_any");
            let target = format!("{symbol}_node");
            compilation.push_triple(
                Term::var(subject),
                Predicate::Var(predicate_var.clone()),
                Term::var(&target),
            );
            let mut node = ObjectShape {
                group_var: Some(target.clone()),
                any_var: Some(predicate_var),
                hidden,
                ..Default::default()
            };
            self.compile_selection_set(
                &field.selection_set,
                &target,
                None,
                &mut node,
                compilation,
            )?;
            parent.entries.insert(label, ShapeNode::Object(node));
            return Ok(());
        }

        // Reserved type-name probe: bound through the class-membership
        // predicate; the materializer later maps the IRI to its local name.
        if field.name == "__typename" {
            let target = format!("{subject}_typename");
            compilation.push_triple(
                Term::var(subject),
                Predicate::Iri(RDF_TYPE.to_string()),
                Term::var(&target),
            );
            parent
                .entries
                .insert("__typename".to_string(), ShapeNode::Scalar { var: target, hidden });
            return Ok(());
        }

        let inverse = field.name.starts_with(INVERSE_PREFIX);
        let predicate_name = if inverse {
            &field.name[INVERSE_PREFIX.len()..]
        } else {
            field.name.as_str()
        };

        // Schema lookup on the current object type: the declared type decides
        // between a reference to another object and a flat scalar.
        let mut reference_type = None;
        let mut declared_scalar = None;
        if let Some(owner) = object_type {
            let definition = owner.fields.get(&field.name).ok_or_else(|| {
                RewriteError::schema(format!(
                    "No such property \"{}\" defined on {} object type",
                    field.name, owner.label
                ))
            })?;
            let unwrapped = unwrap_type(&definition.ty)?;
            if is_scalar_type(unwrapped.name) {
                if !unwrapped.plural {
                    declared_scalar = Some(unwrapped.name.to_string());
                }
            } else {
                reference_type = self.registry.get(unwrapped.name);
            }
        }

        let has_arguments = !field.arguments.is_empty();
        let has_selections = !field.selection_set.is_empty();

        // Scalar filter call: arguments on a flat scalar field are filters on
        // the field's own bound variable, not object-constructing arguments.
        if has_arguments && !has_selections {
            if let Some(scalar_type) = &declared_scalar {
                let symbol = compilation.next_symbol(&label);
                let target = format!("{symbol}_value");
                let predicate = self.predicate(predicate_name, inverse)?;
                compilation.push_triple(Term::var(subject), predicate, Term::var(&target));
                for argument in &field.arguments {
                    let expression =
                        build_scalar_filter(scalar_type, &argument.name, &target, &argument.value)?;
                    compilation.filters.push(Pattern::Filter(expression));
                }
                apply_filter_directive(field, &target, compilation)?;
                parent
                    .entries
                    .insert(label, ShapeNode::Scalar { var: target, hidden });
                return Ok(());
            }
        }

        let symbol = compilation.next_symbol(&label);
        let suffix = if has_arguments || has_selections {
            "node"
        } else {
            "value"
        };
        let target = format!("{symbol}_{suffix}");
        let predicate = self.predicate(predicate_name, inverse)?;
        compilation.push_triple(Term::var(subject), predicate, Term::var(&target));

        let many = field.directive("many").is_some();

        if has_arguments {
            // Argument-bearing relation: every argument is checked before any
            // of its triples are emitted.
            for argument in &field.arguments {
                if let Some(reference) = reference_type {
                    if !reference.fields.contains_key(&argument.name) {
                        return Err(RewriteError::schema(format!(
                            "No such property \"{}\" defined on {} object type",
                            argument.name, reference.label
                        )));
                    }
                }
                let translated = self.translator.translate(&argument.name)?;
                check_argument_kind(&argument.name, &argument.value, translated.kind)?;
            }
            for argument in &field.arguments {
                let property = self.translator.translate(&argument.name)?.iri;
                let literal = literal_from_value(&argument.value)?;
                compilation.push_triple(
                    Term::var(&target),
                    Predicate::Iri(property),
                    Term::Literal(literal),
                );
            }

            let mut node = ObjectShape {
                group_var: Some(target.clone()),
                hidden,
                ..Default::default()
            };
            self.compile_selection_set(
                &field.selection_set,
                &target,
                reference_type,
                &mut node,
                compilation,
            )?;
            let shape_node = if many {
                ShapeNode::Array(node)
            } else {
                ShapeNode::Object(node)
            };
            parent.entries.insert(label, shape_node);
        } else if has_selections {
            // Selection-bearing relation: the target becomes the subject for
            // the nested fields.
            let mut node = ObjectShape {
                group_var: Some(target.clone()),
                hidden,
                ..Default::default()
            };
            self.compile_selection_set(
                &field.selection_set,
                &target,
                reference_type,
                &mut node,
                compilation,
            )?;
            let shape_node = if many {
                ShapeNode::Array(node)
            } else {
                ShapeNode::Object(node)
            };
            parent.entries.insert(label, shape_node);
        } else {
            // Terminal scalar.
            apply_filter_directive(field, &target, compilation)?;
            parent
                .entries
                .insert(label, ShapeNode::Scalar { var: target, hidden });
        }
        Ok(())
    }

    fn predicate(&self, name: &str, inverse: bool) -> Result<Predicate, RewriteError> {
        let iri = self.translator.translate(name)?.iri;
        Ok(if inverse {
            Predicate::Inverse(iri)
        } else {
            Predicate::Iri(iri)
        })
    }
}

/// Translate an attached `@filter` directive into filter clauses on `target`.
fn apply_filter_directive(
    field: &Field,
    target: &str,
    compilation: &mut Compilation,
) -> Result<(), RewriteError> {
    if let Some(filter) = field.directive("filter") {
        for argument in &filter.arguments {
            let expression = build_filter(&argument.name, target, &argument.value)?;
            compilation.filters.push(Pattern::Filter(expression));
        }
    }
    Ok(())
}

/// The argument's value kind must match the translated predicate's declared
/// scalar kind.
fn check_argument_kind(
    name: &str,
    value: &Value,
    expected: ScalarKind,
) -> Result<(), RewriteError> {
    match expected {
        ScalarKind::Node => Err(RewriteError::translation(format!(
            "Cannot use '{name}' as a parameter since its corresponding value type is a node"
        ))),
        ScalarKind::Unknown => Ok(()),
        _ => {
            let actual = match value {
                Value::Boolean(_) => Some(ScalarKind::Boolean),
                Value::Int(_) => Some(ScalarKind::Integer),
                Value::Float(_) => Some(ScalarKind::Decimal),
                Value::String(_) => Some(ScalarKind::String),
                _ => None,
            };
            match actual {
                Some(actual) if actual == expected => Ok(()),
                Some(actual) => Err(RewriteError::translation(format!(
                    "Value passed to parameter '{name}' is of type {}, but that predicate expects a type of {}",
                    actual.label(),
                    expected.label()
                ))),
                None => Err(RewriteError::translation(format!(
                    "Value passed to parameter '{name}' is of kind {}, but that kind is not yet supported",
                    value.kind_name()
                ))),
            }
        }
    }
}

/// Singularize a plural root field name and capitalize it into a class name.
fn class_name(field: &str, plural: bool) -> String {
    let singular = if plural {
        field.strip_suffix('s').unwrap_or(field)
    } else {
        field
    };
    let mut chars = singular.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Parse the operation's optional `@paginate` directive into modifiers.
fn parse_paginate(operation: &Operation) -> Result<Modifiers, RewriteError> {
    let Some(directive) = operation.directives.iter().find(|d| d.name == "paginate") else {
        return Ok(Modifiers::default());
    };

    let mut modifiers = Modifiers::default();
    let mut order = None;
    let mut descending = false;
    for argument in &directive.arguments {
        match (argument.name.as_str(), &argument.value) {
            ("limit", Value::Int(limit)) if *limit >= 0 => {
                modifiers.limit = Some(*limit as u64);
            }
            ("limit", _) => {
                return Err(RewriteError::translation(
                    "@paginate 'limit' expects a non-negative integer",
                ));
            }
            ("offset", Value::Int(offset)) if *offset >= 0 => {
                modifiers.offset = Some(*offset as u64);
            }
            ("offset", _) => {
                return Err(RewriteError::translation(
                    "@paginate 'offset' expects a non-negative integer",
                ));
            }
            ("order", Value::String(variable)) if VARIABLE_NAME_RE.is_match(variable) => {
                order = Some(variable.clone());
            }
            ("order", _) => {
                return Err(RewriteError::translation(
                    "@paginate 'order' expects a result variable name",
                ));
            }
            ("desc", Value::Boolean(desc)) => descending = *desc,
            ("desc", _) => {
                return Err(RewriteError::translation(
                    "@paginate 'desc' expects a boolean",
                ));
            }
            (other, _) => {
                return Err(RewriteError::translation(format!(
                    "Unknown @paginate argument \"{other}\""
                )));
            }
        }
    }
    if let Some(variable) = order {
        modifiers.order.push(OrderKey {
            variable,
            descending,
        });
    }
    Ok(modifiers)
}
