use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use ezdoc::{
    config, logging,
    remote::{Credentials, DocumentClient, UploadOptions, parse_yes_no},
    store::ResponseStore,
    workflow::{FlowPlan, run_flow},
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "ezdoc",
    version,
    about = "Index a document on the document service and ask it questions"
)]
struct Cli {
    /// Account name; overrides EZDOC_USERNAME.
    #[arg(short, long)]
    username: Option<String>,
    /// API key; overrides EZDOC_API_KEY.
    #[arg(short = 'p', long)]
    api_key: Option<String>,
    /// Password; overrides EZDOC_PASSWORD and takes precedence over the API key.
    #[arg(long)]
    password: Option<String>,
    /// Configuration file uploaded right after authentication.
    #[arg(short = 'g', long)]
    config_file: Option<PathBuf>,
    /// Document to index.
    #[arg(short = 'd', long)]
    document: Option<PathBuf>,
    /// Index that receives the document and answers the query.
    #[arg(short, long)]
    index_name: Option<String>,
    /// Overwrite the embeddings already stored for the index (yes/no).
    #[arg(short, long, action = ArgAction::Set, default_value = "no", value_parser = parse_yes_no)]
    overwrite: bool,
    /// Question to ask against the index.
    #[arg(short, long)]
    query: Option<String>,
    /// List the account's indices at the end of the run.
    #[arg(short = 'l', long, action = ArgAction::SetTrue)]
    list_indices: bool,
    /// File name prefix for stored responses.
    #[arg(short = 'x', long, default_value = "ezdoc")]
    prefix: String,
    /// Directory for stored responses; overrides EZDOC_OUTPUT_DIR.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Answer upload and extract steps from stored responses when present.
    #[arg(long, action = ArgAction::SetTrue)]
    reuse_cached: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    // `.env` must be loaded before tracing reads RUST_LOG and EZDOC_LOG_FILE.
    let config = config::init_config().context("failed to load configuration")?;
    logging::init_tracing();
    tracing::debug!(?config, "Loaded configuration");

    let Some(credentials) = Credentials::resolve(
        cli.username.or_else(|| config.username.clone()),
        cli.api_key.or_else(|| config.api_key.clone()),
        cli.password.or_else(|| config.password.clone()),
    ) else {
        bail!("credentials required: set a username and an API key or password");
    };

    let store = ResponseStore::new(
        cli.output_dir.unwrap_or_else(|| config.output_dir.clone()),
        cli.prefix,
    );
    if !cli.reuse_cached {
        store.clear().context("failed to clear stored responses")?;
    }

    let plan = FlowPlan {
        credentials,
        config_file: cli.config_file,
        document: cli.document,
        index_name: cli.index_name,
        options: UploadOptions {
            overwrite: cli.overwrite,
        },
        query: cli.query,
        inspect_indices: cli.list_indices,
        reuse_cached: cli.reuse_cached,
    };

    let client = DocumentClient::new().context("failed to build client")?;
    let report = run_flow(&client, Some(&store), &plan).await?;

    let rendered = serde_json::to_string_pretty(&report).context("failed to render report")?;
    println!("{rendered}");
    Ok(())
}
