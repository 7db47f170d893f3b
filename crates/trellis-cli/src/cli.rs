use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "trellis - a GraphQL facade for SPARQL triple stores")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the GraphQL endpoint (reads SPARQL_ENDPOINT from the environment)
    Serve {
        /// Path to the GraphQL schema file
        #[arg(short = 's', long)]
        schema: PathBuf,

        /// Path to the JSON-LD context file mapping field names to IRIs
        #[arg(short = 'c', long)]
        context: Option<PathBuf>,

        /// Base IRI fallback used when no context file is given
        #[arg(short = 'b', long)]
        base: Option<String>,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port number to bind
        #[arg(short = 'p', long, default_value_t = 3001)]
        port: u16,
    },

    /// Read a schema on stdin and print a starter client query document
    GenClient,
}
