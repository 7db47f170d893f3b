use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value as Json;
use tracing::info;

use trellis_client::StoreClient;
use trellis_query::schema::TypeRegistry;
use trellis_query::syntax::parse_schema;
use trellis_query::{FieldTranslator, Introspection, Rewriter};

mod cli;
mod gen_client;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "trellis=debug,tower_http=debug"
    } else {
        "trellis=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Serve {
            schema,
            context,
            base,
            host,
            port,
        } => serve(schema, context, base, host, port).await,
        Commands::GenClient => gen_client(),
    }
}

async fn serve(
    schema: PathBuf,
    context: Option<PathBuf>,
    base: Option<String>,
    host: String,
    port: u16,
) -> Result<()> {
    if context.is_none() && base.is_none() {
        bail!("must supply one of --context or --base");
    }

    let endpoint = std::env::var("SPARQL_ENDPOINT")
        .map_err(|_| anyhow::anyhow!("Must define environment variable SPARQL_ENDPOINT"))?;

    let schema_text = std::fs::read_to_string(&schema)
        .with_context(|| format!("failed to read schema file {}", schema.display()))?;
    let document = parse_schema(&schema_text)
        .map_err(|error| anyhow::anyhow!("failed to parse schema: {error}"))?;

    let context_value = context.as_deref().map(load_context).transpose()?;

    let registry = TypeRegistry::from_document(&document);
    let translator = FieldTranslator::new(context_value.as_ref(), base.as_deref())?;

    let state = trellis_web::AppState {
        rewriter: Rewriter::new(registry, translator),
        introspection: Introspection::new(&document),
        client: StoreClient::new(endpoint),
    };

    info!(types = state.rewriter.registry().len(), "schema loaded");

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;
    trellis_web::serve(Arc::new(state), addr).await?;
    Ok(())
}

/// Load a JSON-LD context file; a wrapping `@context` document is unwrapped.
fn load_context(path: &Path) -> Result<Json> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read context file {}", path.display()))?;
    let document: Json = serde_json::from_str(&text)
        .with_context(|| format!("context file {} is not valid JSON", path.display()))?;
    Ok(document
        .get("@context")
        .cloned()
        .unwrap_or(document))
}

fn gen_client() -> Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read schema from stdin")?;
    let document = parse_schema(&input)
        .map_err(|error| anyhow::anyhow!("failed to parse schema: {error}"))?;
    print!("{}", gen_client::generate(&document));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_context_unwraps_the_context_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "@context": {{ "def": "https://example.org/definitions/" }} }}"#
        )
        .unwrap();
        let context = load_context(file.path()).unwrap();
        assert_eq!(
            context["def"],
            Json::String("https://example.org/definitions/".to_string())
        );
    }

    #[test]
    fn load_context_accepts_a_bare_mapping() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "def": "https://example.org/definitions/" }}"#).unwrap();
        let context = load_context(file.path()).unwrap();
        assert!(context.get("def").is_some());
    }

    #[test]
    fn load_context_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_context(file.path()).is_err());
    }
}
