//! Error types for the translation pipeline.

use serde::Serialize;
use thiserror::Error;

/// One entry in the `errors` list of a response.
///
/// `binding_path` localizes materialization errors to the output key whose
/// rows diverged; compile-time errors carry only a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvalError {
    pub message: String,
    #[serde(rename = "bindingPath", skip_serializing_if = "Option::is_none")]
    pub binding_path: Option<String>,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            binding_path: None,
        }
    }

    pub fn at_path(message: impl Into<String>, path: &[String]) -> Self {
        Self {
            message: message.into(),
            binding_path: Some(path.join(".")),
        }
    }
}

/// Fatal, first-error-wins failures raised while turning a query into a plan.
///
/// Any of these aborts compilation before a plan is produced; the response
/// carries `data: null` plus the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// The query text did not parse.
    #[error("{0}")]
    Parse(String),

    /// Unknown root field, unknown property, or unknown type reference.
    #[error("{0}")]
    Schema(String),

    /// A field or argument name could not be resolved to an IRI, or resolved
    /// to a kind that cannot be used in this position.
    #[error("{0}")]
    Translation(String),

    /// A declared variable type and the supplied value disagree.
    #[error("{0}")]
    VariableType(String),

    /// A recognized construct the compiler does not implement.
    #[error("{0}")]
    Unsupported(String),
}

impl RewriteError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation(message.into())
    }

    pub fn variable_type(message: impl Into<String>) -> Self {
        Self::VariableType(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub fn to_eval_error(&self) -> EvalError {
        EvalError::new(self.to_string())
    }
}

/// Startup failures while loading the field-name context.
///
/// These are configuration errors: they abort process startup rather than a
/// single query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("Must supply one of 'context' or 'base' to the field translator")]
    MissingSource,

    #[error("Resolved context key definition not allowed to have more than one type: \"{key}\"")]
    MultipleTypes { key: String },

    #[error("Resolved context type not supported: {iri}")]
    UnsupportedType { iri: String },

    #[error("Invalid context entry \"{key}\": {reason}")]
    InvalidEntry { key: String, reason: String },
}

/// Failures while building a [`crate::Rewriter`] from schema and context.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to parse schema: {0}")]
    Schema(String),

    #[error(transparent)]
    Context(#[from] ContextError),
}
