//! Query and schema syntax: closed AST types plus chumsky parsers.

pub mod ast;
mod common;
mod query;
mod sdl;

pub use common::format_errors;
pub use query::parse_document;
pub use sdl::parse_schema;
