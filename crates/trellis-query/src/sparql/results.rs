//! Solution rows as returned by a store's SPARQL JSON results document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One bound value in a solution row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RdfTerm {
    Uri {
        value: String,
    },
    Literal {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(
            rename = "xml:lang",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        lang: Option<String>,
    },
    Bnode {
        value: String,
    },
}

impl RdfTerm {
    /// The raw lexical value, used as the identity key when bucketing rows.
    pub fn value(&self) -> &str {
        match self {
            RdfTerm::Uri { value } | RdfTerm::Literal { value, .. } | RdfTerm::Bnode { value } => {
                value
            }
        }
    }
}

/// One flat variable-binding row.
pub type SolutionRow = IndexMap<String, RdfTerm>;

/// The `application/sparql-results+json` document shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsDocument {
    #[serde(default)]
    pub head: ResultsHead,
    pub results: ResultsBindings,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResultsHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultsBindings {
    pub bindings: Vec<SolutionRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_results_document() {
        let body = r#"{
            "head": { "vars": ["items_node", "name_value"] },
            "results": { "bindings": [
                {
                    "items_node": { "type": "uri", "value": "https://example.org/items/1" },
                    "name_value": { "type": "literal", "value": "A" }
                },
                {
                    "items_node": { "type": "uri", "value": "https://example.org/items/2" },
                    "name_value": {
                        "type": "literal",
                        "value": "7",
                        "datatype": "http://www.w3.org/2001/XMLSchema#integer"
                    }
                }
            ] }
        }"#;

        let doc: ResultsDocument = serde_json::from_str(body).unwrap();
        assert_eq!(doc.head.vars.len(), 2);
        assert_eq!(doc.results.bindings.len(), 2);
        assert_eq!(
            doc.results.bindings[0]["items_node"],
            RdfTerm::Uri {
                value: "https://example.org/items/1".to_string()
            }
        );
        match &doc.results.bindings[1]["name_value"] {
            RdfTerm::Literal { value, datatype, .. } => {
                assert_eq!(value, "7");
                assert_eq!(
                    datatype.as_deref(),
                    Some("http://www.w3.org/2001/XMLSchema#integer")
                );
            }
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn parses_language_tagged_literal() {
        let body = r#"{ "type": "literal", "value": "chat", "xml:lang": "fr" }"#;
        let term: RdfTerm = serde_json::from_str(body).unwrap();
        match term {
            RdfTerm::Literal { ref lang, .. } => assert_eq!(lang.as_deref(), Some("fr")),
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn value_is_lexical_form() {
        let term = RdfTerm::Uri {
            value: "https://example.org/x".to_string(),
        };
        assert_eq!(term.value(), "https://example.org/x");
    }
}
