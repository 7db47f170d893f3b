//! GraphQL-to-SPARQL translation pipeline.
//!
//! A query document travels through four stages: parsing ([`syntax`]),
//! preprocessing ([`transform`]: fragment inlining, variable substitution,
//! `@skip`/`@include` elision), compilation ([`rewriter`]: one traversal
//! producing a SPARQL plan plus a [`shape`] descriptor), and — once the store
//! has answered — materialization ([`rebind`]: flat solution rows back into
//! nested output). The [`schema`] registry and [`context`] translator are
//! built once and shared read-only across requests.

pub mod context;
pub mod error;
pub mod introspect;
pub mod operators;
pub mod rebind;
pub mod rewriter;
pub mod schema;
pub mod shape;
pub mod sparql;
pub mod syntax;
pub mod transform;
pub mod vocab;

pub use context::{FieldTranslator, ScalarKind, TranslatedField};
pub use error::{ContextError, EvalError, RewriteError, SetupError};
pub use introspect::Introspection;
pub use rebind::materialize;
pub use rewriter::Rewriter;
pub use schema::TypeRegistry;
pub use shape::{ObjectShape, ShapeNode};
pub use sparql::render::render;
pub use sparql::results::{RdfTerm, SolutionRow};
pub use sparql::{Modifiers, SparqlPlan};
