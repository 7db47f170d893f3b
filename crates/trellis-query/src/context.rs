//! Field-name translation: query names to canonical IRIs and scalar kinds.
//!
//! Translation is driven either by a JSON-LD-style context document or by a
//! plain base-IRI prefix. The context cache is populated once at startup by
//! expanding each entry in isolation; queries only ever read it.

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::error::{ContextError, RewriteError};
use crate::vocab::{XSD_BOOLEAN, XSD_DECIMAL, XSD_INTEGER, XSD_STRING};

/// Value categories a translated field can take in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Boolean,
    Integer,
    Decimal,
    String,
    /// A node reference rather than a literal value.
    Node,
    /// No type information available (plain-string context entry or base IRI).
    Unknown,
}

impl ScalarKind {
    fn from_datatype(iri: &str) -> Option<Self> {
        match iri {
            "@id" => Some(Self::Node),
            XSD_BOOLEAN => Some(Self::Boolean),
            XSD_INTEGER => Some(Self::Integer),
            XSD_DECIMAL => Some(Self::Decimal),
            XSD_STRING => Some(Self::String),
            _ => None,
        }
    }

    /// Lowercase label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Node => "node",
            Self::Unknown => "unknown",
        }
    }
}

/// A query name resolved to its canonical identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedField {
    pub iri: String,
    pub kind: ScalarKind,
}

/// Resolves field and argument names, either through a context cache built at
/// startup or through a base-IRI fallback.
#[derive(Debug, Clone)]
pub struct FieldTranslator {
    cache: Option<IndexMap<String, TranslatedField>>,
    base: Option<String>,
}

impl FieldTranslator {
    /// Build a translator; at least one of `context` and `base` is required.
    pub fn new(context: Option<&Json>, base: Option<&str>) -> Result<Self, ContextError> {
        match (context, base) {
            (Some(context), _) => Ok(Self {
                cache: Some(expand_context(context)?),
                base: base.map(str::to_string),
            }),
            (None, Some(base)) => Ok(Self {
                cache: None,
                base: Some(base.to_string()),
            }),
            (None, None) => Err(ContextError::MissingSource),
        }
    }

    pub fn from_context(context: &Json) -> Result<Self, ContextError> {
        Self::new(Some(context), None)
    }

    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            cache: None,
            base: Some(base.into()),
        }
    }

    /// Resolve `key` to an IRI and scalar kind.
    pub fn translate(&self, key: &str) -> Result<TranslatedField, RewriteError> {
        if let Some(cache) = &self.cache {
            return cache.get(key).cloned().ok_or_else(|| {
                RewriteError::translation(format!("No such field key \"{key}\""))
            });
        }
        if let Some(base) = &self.base {
            return Ok(TranslatedField {
                iri: format!("{base}{key}"),
                kind: ScalarKind::Unknown,
            });
        }
        Err(RewriteError::translation("Unable to translate field key"))
    }
}

/// Expand every context entry in isolation and classify its scalar kind.
fn expand_context(context: &Json) -> Result<IndexMap<String, TranslatedField>, ContextError> {
    let entries = context.as_object().ok_or_else(|| ContextError::InvalidEntry {
        key: "@context".to_string(),
        reason: "context document must be a JSON object".to_string(),
    })?;

    let mut cache = IndexMap::new();
    for (key, definition) in entries {
        if key.starts_with('@') {
            continue;
        }
        cache.insert(key.clone(), expand_entry(entries, key, definition)?);
    }
    Ok(cache)
}

fn expand_entry(
    entries: &serde_json::Map<String, Json>,
    key: &str,
    definition: &Json,
) -> Result<TranslatedField, ContextError> {
    match definition {
        // Plain-string entries carry no type information.
        Json::String(value) => Ok(TranslatedField {
            iri: expand_iri(entries, value),
            kind: ScalarKind::Unknown,
        }),
        Json::Object(node) => {
            let id = node
                .get("@id")
                .and_then(Json::as_str)
                .ok_or_else(|| ContextError::InvalidEntry {
                    key: key.to_string(),
                    reason: "expanded entry has no '@id'".to_string(),
                })?;
            let iri = expand_iri(entries, id);

            let kind = match node.get("@type") {
                None => ScalarKind::Unknown,
                Some(ty) => {
                    let datatype = match ty {
                        Json::String(single) => single.clone(),
                        Json::Array(types) if types.len() == 1 => types[0]
                            .as_str()
                            .map(str::to_string)
                            .ok_or_else(|| ContextError::InvalidEntry {
                                key: key.to_string(),
                                reason: "'@type' entries must be strings".to_string(),
                            })?,
                        Json::Array(_) => {
                            return Err(ContextError::MultipleTypes {
                                key: key.to_string(),
                            })
                        }
                        _ => {
                            return Err(ContextError::InvalidEntry {
                                key: key.to_string(),
                                reason: "'@type' must be a string or a singleton array"
                                    .to_string(),
                            })
                        }
                    };
                    let expanded = if datatype == "@id" {
                        datatype
                    } else {
                        expand_iri(entries, &datatype)
                    };
                    ScalarKind::from_datatype(&expanded)
                        .ok_or(ContextError::UnsupportedType { iri: expanded })?
                }
            };

            Ok(TranslatedField {
                iri,
                kind,
            })
        }
        _ => Err(ContextError::InvalidEntry {
            key: key.to_string(),
            reason: "entry must be a string or an object".to_string(),
        }),
    }
}

/// Compact-IRI expansion against the context's own prefix entries, with an
/// `@vocab` fallback for bare terms.
fn expand_iri(entries: &serde_json::Map<String, Json>, term: &str) -> String {
    if let Some((prefix, suffix)) = term.split_once(':') {
        if let Some(Json::String(expansion)) = entries.get(prefix) {
            return format!("{expansion}{suffix}");
        }
        // Absolute IRI or unknown prefix; pass through.
        return term.to_string();
    }
    if let Some(Json::String(vocab)) = entries.get("@vocab") {
        return format!("{vocab}{term}");
    }
    term.to_string()
}
