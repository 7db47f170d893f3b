//! Parser for the schema grammar.
//!
//! Object and interface definitions are parsed in full. Scalar, enum, union,
//! input and directive definitions plus the `schema` block are recognized and
//! consumed so real-world schema files load, but they carry no meaning here
//! and are dropped before the document is returned.

use chumsky::prelude::*;

use super::ast::{
    FieldDefinition, InputValueDefinition, SchemaDocument, TypeDefinition, TypeKind,
};
use super::common::{block_string, format_errors, kw, name, string_literal, trivia, type_ref, Extra};
use super::query::{directives, value};
use crate::error::RewriteError;

/// Optional description string preceding a definition.
fn description<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    choice((block_string(), string_literal()))
        .padded_by(trivia())
        .or_not()
        .ignored()
}

fn input_value_definition<'src>(
) -> impl Parser<'src, &'src str, InputValueDefinition, Extra<'src>> + Clone {
    description()
        .ignore_then(name())
        .then_ignore(just(':').padded_by(trivia()))
        .then(type_ref())
        .then(just('=').padded_by(trivia()).ignore_then(value()).or_not())
        .then_ignore(directives())
        .map(|((name, ty), default)| InputValueDefinition { name, ty, default })
}

fn arguments_definition<'src>(
) -> impl Parser<'src, &'src str, Vec<InputValueDefinition>, Extra<'src>> + Clone {
    just('(')
        .ignore_then(
            input_value_definition()
                .padded_by(trivia())
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(just(')'))
}

fn field_definition<'src>() -> impl Parser<'src, &'src str, FieldDefinition, Extra<'src>> + Clone {
    description()
        .ignore_then(name())
        .then(arguments_definition().padded_by(trivia()).or_not())
        .then_ignore(just(':').padded_by(trivia()))
        .then(type_ref())
        .then(directives())
        .map(|(((name, arguments), ty), directives)| FieldDefinition {
            name,
            arguments: arguments.unwrap_or_default(),
            ty,
            directives,
        })
}

fn fields_block<'src>() -> impl Parser<'src, &'src str, Vec<FieldDefinition>, Extra<'src>> + Clone {
    just('{')
        .padded_by(trivia())
        .ignore_then(
            field_definition()
                .padded_by(trivia())
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(just('}').padded_by(trivia()))
}

fn implements<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    kw("implements")
        .padded_by(trivia())
        .ignore_then(
            name()
                .padded_by(trivia())
                .separated_by(just('&').padded_by(trivia()))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .ignored()
}

fn object_definition<'src>() -> impl Parser<'src, &'src str, TypeDefinition, Extra<'src>> + Clone {
    let kind = choice((
        kw("type").to(TypeKind::Object),
        kw("interface").to(TypeKind::Interface),
    ));

    description()
        .ignore_then(kind)
        .then(name().padded_by(trivia()))
        .then_ignore(implements().or_not())
        .then(directives())
        .then(fields_block())
        .map(|(((kind, name), directives), fields)| TypeDefinition {
            kind,
            name,
            directives,
            fields,
        })
}

/// Definition kinds the registry ignores; consumed so schema files load.
fn ignored_definition<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    let scalar = kw("scalar")
        .ignore_then(name().padded_by(trivia()))
        .then_ignore(directives())
        .ignored();

    let enum_values = just('{')
        .padded_by(trivia())
        .ignore_then(
            description()
                .ignore_then(name())
                .then_ignore(directives())
                .padded_by(trivia())
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(just('}').padded_by(trivia()));
    let enum_def = kw("enum")
        .ignore_then(name().padded_by(trivia()))
        .then_ignore(directives())
        .then_ignore(enum_values)
        .ignored();

    let union_def = kw("union")
        .ignore_then(name().padded_by(trivia()))
        .then_ignore(directives())
        .then_ignore(just('=').padded_by(trivia()))
        .then_ignore(just('|').padded_by(trivia()).or_not())
        .then_ignore(
            name()
                .padded_by(trivia())
                .separated_by(just('|').padded_by(trivia()))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .ignored();

    let input_fields = just('{')
        .padded_by(trivia())
        .ignore_then(
            input_value_definition()
                .padded_by(trivia())
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(just('}').padded_by(trivia()));
    let input_def = kw("input")
        .ignore_then(name().padded_by(trivia()))
        .then_ignore(directives())
        .then_ignore(input_fields)
        .ignored();

    let directive_def = kw("directive")
        .padded_by(trivia())
        .ignore_then(just('@'))
        .ignore_then(name())
        .then_ignore(arguments_definition().padded_by(trivia()).or_not())
        .then_ignore(kw("repeatable").padded_by(trivia()).or_not())
        .then_ignore(kw("on").padded_by(trivia()))
        .then_ignore(just('|').padded_by(trivia()).or_not())
        .then_ignore(
            name()
                .padded_by(trivia())
                .separated_by(just('|').padded_by(trivia()))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .ignored();

    let root_operations = just('{')
        .padded_by(trivia())
        .ignore_then(
            name()
                .then_ignore(just(':').padded_by(trivia()))
                .then_ignore(name())
                .padded_by(trivia())
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(just('}').padded_by(trivia()));
    let schema_def = kw("schema")
        .ignore_then(directives())
        .then_ignore(root_operations)
        .ignored();

    description().ignore_then(choice((
        scalar,
        enum_def,
        union_def,
        input_def,
        directive_def,
        schema_def,
    )))
}

fn schema_parser<'src>() -> impl Parser<'src, &'src str, SchemaDocument, Extra<'src>> {
    let definition = choice((
        object_definition().map(Some),
        ignored_definition().map(|_| None),
    ));

    definition
        .padded_by(trivia())
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|definitions| SchemaDocument {
            definitions: definitions.into_iter().flatten().collect(),
        })
}

/// Parse a schema document.
pub fn parse_schema(input: &str) -> Result<SchemaDocument, RewriteError> {
    schema_parser()
        .parse(input)
        .into_result()
        .map_err(|errs| RewriteError::parse(format_errors(&errs, input)))
}
