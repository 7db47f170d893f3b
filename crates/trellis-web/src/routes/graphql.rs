//! The `POST /graphql` endpoint: the whole translation pipeline per request.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{HeaderMap, HeaderName};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use trellis_query::{materialize, render, EvalError};

use crate::server::AppState;
use crate::WebError;

const MIME_JSON: &str = "application/json";
const MIME_GRAPHQL_RESPONSE: &str = "application/graphql-response+json";

/// Headers never forwarded to the store: content negotiation is owned by the
/// client, the rest are hop-by-hop.
const SCRUBBED_HEADERS: [&str; 7] = [
    "accept",
    "content-type",
    "content-length",
    "host",
    "origin",
    "referer",
    "connection",
];

/// The response envelope: data, errors, and the generated query text for
/// diagnostics whenever the store was (or would have been) consulted.
#[derive(Debug, Serialize)]
pub struct GraphqlResponse {
    pub data: JsonValue,
    pub errors: Vec<EvalError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparql: Option<String>,
}

pub fn graphql_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .with_state(state)
}

async fn graphql_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GraphqlResponse>, WebError> {
    check_content_type(&headers)?;
    check_accept(&headers)?;

    let body: JsonValue = serde_json::from_slice(&body)
        .map_err(|error| WebError::InvalidBody(error.to_string()))?;
    let query = body
        .get("query")
        .and_then(JsonValue::as_str)
        .ok_or(WebError::MissingQuery)?;
    let variables = body
        .get("variables")
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_else(JsonMap::new);

    // Schema meta-queries never reach the compiler or the store.
    if let Some(data) = state.introspection.respond(query) {
        return Ok(Json(GraphqlResponse {
            data,
            errors: Vec::new(),
            sparql: None,
        }));
    }

    let plan = match state.rewriter.rewrite(query, &variables) {
        Ok(plan) => plan,
        Err(error) => {
            tracing::debug!(%error, "query rejected during compilation");
            return Ok(Json(GraphqlResponse {
                data: JsonValue::Null,
                errors: vec![error.to_eval_error()],
                sparql: None,
            }));
        }
    };

    let sparql = render(&plan);
    let rows = match state.client.execute(&sparql, scrub_headers(&headers)).await {
        Ok(rows) => rows,
        Err(error) => {
            tracing::warn!(%error, "store call failed");
            return Ok(Json(GraphqlResponse {
                data: JsonValue::Null,
                errors: vec![EvalError::new(error.to_string())],
                sparql: Some(sparql),
            }));
        }
    };

    let mut errors = Vec::new();
    let data = materialize(&rows, &plan.shape, &mut errors);
    let data = if errors.is_empty() {
        data
    } else {
        JsonValue::Null
    };
    Ok(Json(GraphqlResponse {
        data,
        errors,
        sparql: Some(sparql),
    }))
}

fn check_content_type(headers: &HeaderMap) -> Result<(), WebError> {
    let mime = headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or("").trim().to_ascii_lowercase());
    match mime.as_deref() {
        Some(MIME_JSON) => Ok(()),
        _ => Err(WebError::UnsupportedMediaType),
    }
}

/// An absent Accept header accepts everything; a present one must admit JSON
/// or the GraphQL response type.
fn check_accept(headers: &HeaderMap) -> Result<(), WebError> {
    let Some(accept) = headers.get("accept").and_then(|value| value.to_str().ok()) else {
        return Ok(());
    };
    let acceptable = accept.split(',').any(|part| {
        let mime = part.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        matches!(
            mime.as_str(),
            "*/*" | "application/*" | MIME_JSON | MIME_GRAPHQL_RESPONSE
        )
    });
    if acceptable {
        Ok(())
    } else {
        Err(WebError::NotAcceptable)
    }
}

/// Forward everything the caller sent except the scrubbed set.
fn scrub_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for (name, value) in headers {
        if SCRUBBED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let Ok(name) = name.as_str().parse::<HeaderName>() {
            forwarded.append(name, value.clone());
        }
    }
    forwarded
}
