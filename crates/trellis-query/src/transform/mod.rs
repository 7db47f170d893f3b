//! AST preprocessing pipeline.
//!
//! Three order-sensitive passes run before compilation: fragment inlining,
//! variable substitution, then `@skip`/`@include` elision. Each pass returns
//! a rewritten document; the first failure aborts the whole pipeline.

pub mod fragments;
pub mod skip_include;
pub mod variables;
