//! HTTP facade: accepts GraphQL requests, answers from the triple store.
//!
//! Per-request flow: introspection short-circuit, compile, execute against
//! the store, materialize. The rewriter, introspection registry and store
//! client live in shared state and are read-only; everything request-scoped
//! stays on the handler's stack, so concurrent requests never contend.

pub mod routes;
pub mod server;

mod error;

pub use error::WebError;
pub use server::{router, serve, AppState};
