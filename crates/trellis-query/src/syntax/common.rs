//! Shared parser primitives for the query and schema grammars.

use chumsky::extra;
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use super::ast::{TypeRef, Value};

/// Extra type for parsers - uses Rich errors for better messages
pub type Extra<'src> = extra::Err<Rich<'src, char>>;

/// Trivia between tokens: whitespace, commas, and `#` line comments.
pub fn trivia<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    let comment = just('#').then(none_of("\n").repeated()).ignored();
    let blank = any()
        .filter(|c: &char| c.is_whitespace() || *c == ',')
        .ignored();
    choice((blank, comment)).repeated().ignored()
}

/// Parser for names: `[_A-Za-z][_0-9A-Za-z]*`
pub fn name<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_ascii_alphabetic() || *c == '_')
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
                .repeated(),
        )
        .to_slice()
        .map(|s: &str| s.to_string())
        .labelled("name")
}

/// Keyword parser: matches `keyword` as a whole word.
pub fn kw<'src>(keyword: &'static str) -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    text::keyword::<&str, _, Extra<'src>>(keyword).ignored()
}

/// Parser for double-quoted string literals with the usual escapes.
pub fn string_literal<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    let escape = just('\\').ignore_then(choice((
        just('"').to('"'),
        just('\\').to('\\'),
        just('/').to('/'),
        just('b').to('\u{0008}'),
        just('f').to('\u{000C}'),
        just('n').to('\n'),
        just('r').to('\r'),
        just('t').to('\t'),
    )));

    just('"')
        .ignore_then(none_of("\"\\").or(escape).repeated().collect::<String>())
        .then_ignore(just('"'))
        .labelled("string literal")
}

/// Parser for triple-quoted block strings: `"""..."""`
pub fn block_string<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    just("\"\"\"")
        .ignore_then(
            any()
                .and_is(just("\"\"\"").not())
                .repeated()
                .collect::<String>(),
        )
        .then_ignore(just("\"\"\""))
        .labelled("block string")
}

/// Parser for numeric literals (integer or float) - with proper error handling
pub fn number<'src>() -> impl Parser<'src, &'src str, Value, Extra<'src>> + Clone {
    just('-')
        .or_not()
        .then(
            any()
                .filter(|c: &char| c.is_ascii_digit())
                .repeated()
                .at_least(1),
        )
        .then(
            just('.')
                .then(any().filter(|c: &char| c.is_ascii_digit()).repeated())
                .or_not(),
        )
        .to_slice()
        .try_map(|s: &str, span: SimpleSpan| {
            if s.contains('.') {
                s.parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| Rich::custom(span, "invalid float literal"))
            } else {
                s.parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| Rich::custom(span, "integer overflow"))
            }
        })
        .labelled("number")
}

/// Parser for type references: `Name`, `[Name]`, with `!` wrappers.
pub fn type_ref<'src>() -> impl Parser<'src, &'src str, TypeRef, Extra<'src>> + Clone {
    recursive(|ty| {
        let named = name().map(TypeRef::Named);
        let list = just('[')
            .ignore_then(ty.padded_by(trivia()))
            .then_ignore(just(']'))
            .map(|inner| TypeRef::List(Box::new(inner)));

        choice((list, named))
            .then(just('!').or_not())
            .map(|(base, bang)| {
                if bang.is_some() {
                    TypeRef::NonNull(Box::new(base))
                } else {
                    base
                }
            })
    })
    .labelled("type")
}

/// Format chumsky errors for human consumption
pub fn format_errors(errs: &[Rich<'_, char>], input: &str) -> String {
    errs.iter()
        .map(|e| {
            let span = e.span();
            let start = span.start;
            let line = input[..start].lines().count().max(1);
            let col = start - input[..start].rfind('\n').map_or(0, |i| i + 1);

            let found = e
                .found()
                .map_or("end of input".to_string(), |c| format!("'{}'", c));

            let reason = format!("{}", e.reason());

            format!(
                "Line {}, column {}: {} (found {})",
                line,
                col + 1,
                reason,
                found
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_simple() {
        let result = name().parse("pickList").into_result();
        assert_eq!(result.unwrap(), "pickList");
    }

    #[test]
    fn name_with_leading_underscore() {
        let result = name().parse("_inv_pickList").into_result();
        assert_eq!(result.unwrap(), "_inv_pickList");
    }

    #[test]
    fn name_rejects_leading_digit() {
        assert!(name().parse("2fast").into_result().is_err());
    }

    #[test]
    fn string_plain() {
        let result = string_literal().parse("\"hello\"").into_result();
        assert_eq!(result.unwrap(), "hello");
    }

    #[test]
    fn string_with_escapes() {
        let result = string_literal().parse(r#""a\"b\\c\nd""#).into_result();
        assert_eq!(result.unwrap(), "a\"b\\c\nd");
    }

    #[test]
    fn block_string_spans_lines() {
        let result = block_string()
            .parse("\"\"\"line one\nline \"two\" end\"\"\"")
            .into_result();
        assert_eq!(result.unwrap(), "line one\nline \"two\" end");
    }

    #[test]
    fn number_integer() {
        assert_eq!(number().parse("42").into_result().unwrap(), Value::Int(42));
    }

    #[test]
    fn number_negative() {
        assert_eq!(number().parse("-7").into_result().unwrap(), Value::Int(-7));
    }

    #[test]
    fn number_float() {
        assert_eq!(
            number().parse("2.5").into_result().unwrap(),
            Value::Float(2.5)
        );
    }

    #[test]
    fn number_integer_overflow() {
        assert!(number().parse("9223372036854775808").into_result().is_err());
    }

    #[test]
    fn type_ref_wrappers() {
        assert_eq!(
            type_ref().parse("String").into_result().unwrap(),
            TypeRef::Named("String".to_string())
        );
        assert_eq!(
            type_ref().parse("Int!").into_result().unwrap(),
            TypeRef::NonNull(Box::new(TypeRef::Named("Int".to_string())))
        );
        assert_eq!(
            type_ref().parse("[String]").into_result().unwrap(),
            TypeRef::List(Box::new(TypeRef::Named("String".to_string())))
        );
        assert_eq!(
            type_ref().parse("[Item!]!").into_result().unwrap(),
            TypeRef::NonNull(Box::new(TypeRef::List(Box::new(TypeRef::NonNull(
                Box::new(TypeRef::Named("Item".to_string()))
            )))))
        );
    }

    #[test]
    fn trivia_eats_comments_and_commas() {
        let parser = trivia().ignore_then(name());
        let result = parser.parse("  , # a comment\n  foo").into_result();
        assert_eq!(result.unwrap(), "foo");
    }
}
