use anyhow::{anyhow, Context};
use clap::{CommandFactory, Parser};
use std::{path::PathBuf, sync::Arc};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use whois_chase::{Config, LookupQuery, ServerTable, WhoisClient};

/// WHOIS client that follows registrar referrals
#[derive(Parser, Debug)]
#[command(name = "whois-chase", version, about, disable_help_flag = true)]
struct Cli {
    /// Server to ask, as host or host:port (RDAP base URL for IP queries)
    #[arg(short = 'h', long = "host")]
    host: Option<String>,

    /// Server table to load instead of the built-in one
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// Write the built-in server table to this path and exit
    #[arg(short = 'c', long = "create")]
    create: Option<PathBuf>,

    /// Log connection progress to stderr
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,

    /// Domain name, IP address, or URL to look up
    query: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "whois_chase=debug" } else { "whois_chase=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Some(path) = &cli.create {
        ServerTable::write_default(path)
            .with_context(|| format!("Failed to create config {}", path.display()))?;
        eprintln!("Created config: {}", path.display());
        return Ok(());
    }

    let Some(raw_query) = cli.query.as_deref() else {
        eprintln!("{}", Cli::command().render_help());
        return Ok(());
    };
    let query = host_of_url(raw_query)?;

    let table = match &cli.file {
        Some(path) => ServerTable::load(path)
            .with_context(|| format!("Failed to load server table {}", path.display()))?,
        None => ServerTable::builtin().context("Built-in server table is invalid")?,
    };
    let config = Config::load().context("Failed to load settings")?;
    debug!("Settings: {:?}", config);

    let client = WhoisClient::new(Arc::new(config), Arc::new(table))?;
    let lookup = LookupQuery::new(query, cli.host.clone());
    let result = client
        .lookup(&lookup)
        .await
        .with_context(|| format!("Lookup of {} failed", lookup.query()))?;

    println!("{}", result.text);
    Ok(())
}

/// Reduces `scheme://host/...` to its host; any other query is kept as is.
fn host_of_url(query: &str) -> anyhow::Result<String> {
    if !query.contains("://") {
        return Ok(query.to_string());
    }
    let url = url::Url::parse(query).with_context(|| format!("Invalid URL {}", query))?;
    url.host_str()
        .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())
        .ok_or_else(|| anyhow!("URL {} has no host", query))
}
