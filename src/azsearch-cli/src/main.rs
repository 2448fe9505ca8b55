//! azsearch - command line client for Azure Search indexes
//!
//! Every subcommand maps to one client operation and prints its JSON result
//! on stdout. Connection settings come from `azsearch.json` and can be
//! overridden with flags or `AZSEARCH_*` environment variables.

use anyhow::Result;
use azsearch_rs::{ClientError, SearchIndexClient};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod telemetry;

use commands::{Overrides, SearchArgs, UploadAction};

/// Exit status telling scripts to back off and retry (EX_TEMPFAIL)
const EXIT_RETRIABLE: u8 = 75;

#[derive(Parser)]
#[command(name = "azsearch")]
#[command(version)]
#[command(about = "Manage and query an Azure Search index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the JSON configuration file
    #[arg(short, long, global = true, default_value = "azsearch.json")]
    config: String,

    /// Search service name
    #[arg(long, global = true, env = "AZSEARCH_SERVICE")]
    service: Option<String>,

    /// Index name
    #[arg(long, global = true, env = "AZSEARCH_INDEX")]
    index: Option<String>,

    /// Admin or query API key
    #[arg(long, global = true, env = "AZSEARCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL override (defaults to https://<service>.search.windows.net)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Also write JSON logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the index exists
    Exists,

    /// Create the index from a JSON schema file
    Create {
        schema: String,
    },

    /// Create the index, or update its definition if it exists
    CreateOrUpdate {
        schema: String,
    },

    /// Delete the index
    DeleteIndex,

    /// Upload documents from a JSON file
    Upload {
        path: String,

        #[arg(long, value_enum, default_value = "upload")]
        action: UploadAction,

        /// Documents per request (at most 1000)
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Delete documents by key
    DeleteDocs {
        key_field: String,

        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Search the index
    Search(SearchArgs),

    /// Fetch one document by key
    Lookup {
        key: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match telemetry::init_telemetry(cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            let retriable = e
                .downcast_ref::<ClientError>()
                .is_some_and(ClientError::is_retriable);
            if retriable {
                ExitCode::from(EXIT_RETRIABLE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config = commands::resolve_config(
        &cli.config,
        Overrides {
            service: cli.service,
            index: cli.index,
            api_key: cli.api_key,
            endpoint: cli.endpoint,
        },
    )?;

    tracing::debug!(
        "Using service {} index {} (api-version {})",
        config.service_name,
        config.index_name,
        config.api_version
    );

    let client = SearchIndexClient::from_config(&config)?;

    let output = match &cli.command {
        Commands::Exists => commands::exists(&client).await?,
        Commands::Create { schema } => commands::create(&client, schema).await?,
        Commands::CreateOrUpdate { schema } => commands::create_or_update(&client, schema).await?,
        Commands::DeleteIndex => commands::delete_index(&client).await?,
        Commands::Upload {
            path,
            action,
            chunk_size,
        } => commands::upload(&client, path, *action, *chunk_size).await?,
        Commands::DeleteDocs { key_field, keys } => {
            commands::delete_docs(&client, key_field, keys).await?
        }
        Commands::Search(args) => commands::search(&client, args).await?,
        Commands::Lookup { key } => commands::lookup(&client, key).await?,
    };

    Ok(serde_json::to_string_pretty(&output)?)
}
