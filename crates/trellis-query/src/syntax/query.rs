//! Parser for the executable query grammar.
//!
//! Covers the subset the compiler understands: `query` operations (named or
//! shorthand) with variable definitions and directives, fields with aliases,
//! arguments and directives, named fragment definitions and spreads, and
//! inline fragments with a type condition. Mutations and subscriptions are
//! not part of the grammar.

use chumsky::prelude::*;

use super::ast::{
    Argument, Directive, Document, Field, FragmentDef, FragmentSpread, InlineFragment, Operation,
    Selection, Value, VariableDef,
};
use super::common::{format_errors, kw, name, number, string_literal, trivia, type_ref, Extra};
use crate::error::RewriteError;

pub(super) fn value<'src>() -> impl Parser<'src, &'src str, Value, Extra<'src>> + Clone {
    recursive(|value| {
        let variable = just('$').ignore_then(name()).map(Value::Variable);
        let string = string_literal().map(Value::String);
        let boolean = choice((
            kw("true").to(Value::Boolean(true)),
            kw("false").to(Value::Boolean(false)),
        ));
        let null = kw("null").to(Value::Null);
        let list = just('[')
            .ignore_then(value.padded_by(trivia()).repeated().collect::<Vec<_>>())
            .then_ignore(just(']'))
            .map(Value::List);
        let enum_value = name().map(Value::Enum);

        choice((variable, string, number(), boolean, null, list, enum_value))
    })
    .labelled("value")
}

pub(super) fn arguments<'src>() -> impl Parser<'src, &'src str, Vec<Argument>, Extra<'src>> + Clone {
    let argument = name()
        .then_ignore(just(':').padded_by(trivia()))
        .then(value())
        .map(|(name, value)| Argument { name, value });

    just('(')
        .ignore_then(
            argument
                .padded_by(trivia())
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(just(')'))
        .labelled("arguments")
}

fn directive<'src>() -> impl Parser<'src, &'src str, Directive, Extra<'src>> + Clone {
    just('@')
        .ignore_then(name())
        .then(arguments().or_not())
        .map(|(name, arguments)| Directive {
            name,
            arguments: arguments.unwrap_or_default(),
        })
        .labelled("directive")
}

pub(super) fn directives<'src>() -> impl Parser<'src, &'src str, Vec<Directive>, Extra<'src>> + Clone {
    directive().padded_by(trivia()).repeated().collect::<Vec<_>>()
}

fn selection_set<'src>() -> impl Parser<'src, &'src str, Vec<Selection>, Extra<'src>> + Clone {
    recursive(|selection_set| {
        let field = name()
            .then(just(':').padded_by(trivia()).ignore_then(name()).or_not())
            .then(arguments().padded_by(trivia()).or_not())
            .then(directives())
            .then(selection_set.clone().or_not())
            .map(|((((first, renamed), arguments), directives), selections)| {
                let (alias, name) = match renamed {
                    Some(actual) => (Some(first), actual),
                    None => (None, first),
                };
                Selection::Field(Field {
                    alias,
                    name,
                    arguments: arguments.unwrap_or_default(),
                    directives,
                    selection_set: selections.unwrap_or_default(),
                })
            });

        let inline_with_condition = kw("on")
            .padded_by(trivia())
            .ignore_then(name())
            .then(selection_set.clone())
            .map(|(type_condition, selections)| {
                Selection::InlineFragment(InlineFragment {
                    type_condition: Some(type_condition),
                    selection_set: selections,
                })
            });

        let inline_bare = selection_set.clone().map(|selections| {
            Selection::InlineFragment(InlineFragment {
                type_condition: None,
                selection_set: selections,
            })
        });

        let spread = name()
            .try_map(|spread_name: String, span| {
                if spread_name == "on" {
                    Err(Rich::custom(span, "expected fragment name"))
                } else {
                    Ok(spread_name)
                }
            })
            .map(|name| Selection::FragmentSpread(FragmentSpread { name }));

        let fragment = just("...")
            .padded_by(trivia())
            .ignore_then(choice((inline_with_condition, spread, inline_bare)));

        let selection = choice((fragment, field)).padded_by(trivia());

        just('{')
            .padded_by(trivia())
            .ignore_then(selection.repeated().at_least(1).collect::<Vec<_>>())
            .then_ignore(just('}').padded_by(trivia()))
    })
    .labelled("selection set")
}

fn variable_definitions<'src>() -> impl Parser<'src, &'src str, Vec<VariableDef>, Extra<'src>> + Clone
{
    let definition = just('$')
        .ignore_then(name())
        .then_ignore(just(':').padded_by(trivia()))
        .then(type_ref())
        .then(just('=').padded_by(trivia()).ignore_then(value()).or_not())
        .map(|((name, ty), default)| VariableDef { name, ty, default });

    just('(')
        .ignore_then(
            definition
                .padded_by(trivia())
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(just(')'))
        .labelled("variable definitions")
}

fn operation<'src>() -> impl Parser<'src, &'src str, Operation, Extra<'src>> + Clone {
    let header = kw("query")
        .ignore_then(name().padded_by(trivia()).or_not())
        .then(variable_definitions().padded_by(trivia()).or_not())
        .then(directives());

    header
        .or_not()
        .then(selection_set())
        .map(|(header, selection_set)| match header {
            Some(((name, variable_definitions), directives)) => Operation {
                name,
                variable_definitions: variable_definitions.unwrap_or_default(),
                directives,
                selection_set,
            },
            None => Operation {
                name: None,
                variable_definitions: Vec::new(),
                directives: Vec::new(),
                selection_set,
            },
        })
}

fn fragment_definition<'src>() -> impl Parser<'src, &'src str, FragmentDef, Extra<'src>> + Clone {
    kw("fragment")
        .ignore_then(name().padded_by(trivia()))
        .then_ignore(kw("on"))
        .then(name().padded_by(trivia()))
        .then(selection_set())
        .map(|((name, type_condition), selection_set)| FragmentDef {
            name,
            type_condition,
            selection_set,
        })
}

enum Definition {
    Operation(Operation),
    Fragment(FragmentDef),
}

fn document_parser<'src>() -> impl Parser<'src, &'src str, Document, Extra<'src>> {
    let definition = choice((
        fragment_definition().map(Definition::Fragment),
        operation().map(Definition::Operation),
    ));

    definition
        .padded_by(trivia())
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|definitions| {
            let mut operations = Vec::new();
            let mut fragments = Vec::new();
            for definition in definitions {
                match definition {
                    Definition::Operation(op) => operations.push(op),
                    Definition::Fragment(frag) => fragments.push(frag),
                }
            }
            Document {
                operations,
                fragments,
            }
        })
}

/// Parse an executable document.
pub fn parse_document(input: &str) -> Result<Document, RewriteError> {
    document_parser()
        .parse(input)
        .into_result()
        .map_err(|errs| RewriteError::parse(format_errors(&errs, input)))
}
