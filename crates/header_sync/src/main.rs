use std::path::PathBuf;

use clap::Parser;
use colored::*;
use figlet_rs::FIGfont;
use tracing::info;
use tracing_subscriber::EnvFilter;

use header_sync::net::rpc::RpcClient;
use header_sync::render::format_header;
use header_sync::store::file::CsvStore;
use header_sync::sync::sync_chain;

/// Hash of the Bitcoin genesis block, the default starting point.
const GENESIS_HASH: &str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";

fn print_banner() {
    let font = FIGfont::standard().unwrap();
    let figure = font.convert("Header Sync").unwrap();

    println!(
        "{}",
        "═══════════════════════════════════════════════════════════════════════════════"
            .bright_magenta()
    );
    println!("{}", figure.to_string().bright_cyan().bold());
    println!(
        "{}",
        "═══════════════════════════════════════════════════════════════════════════════"
            .bright_magenta()
    );
    println!(
        "{}",
        "Block header chain walker with a resumable cache".bright_yellow()
    );
    println!(
        "{}",
        "═══════════════════════════════════════════════════════════════════════════════"
            .bright_magenta()
    );
    println!();
}

#[derive(Parser, Debug)]
#[command(name = "header-sync")]
#[command(about = "Walks a node's block header chain and caches it locally", long_about = None)]
struct Args {
    /// Node RPC host
    #[arg(long)]
    host: String,

    /// Node RPC port
    #[arg(long, default_value_t = 8332)]
    port: u16,

    /// RPC username
    #[arg(long)]
    user: String,

    /// RPC password
    #[arg(long)]
    password: String,

    /// CSV cache file; omit to run without persistence
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Block hash to start walking from
    #[arg(long, default_value = GENESIS_HASH)]
    start_hash: String,

    /// Maximum number of headers fetched per run
    #[arg(long, default_value_t = 10)]
    max_blocks: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    print_banner();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let url = format!("http://{}:{}", args.host, args.port);
    let client = RpcClient::new(&url)?.with_basic_auth(args.user, args.password);

    let height = client.get_block_count().await?;
    let best = client.get_best_block_hash().await?;
    info!("node reports height {height}, best block {best}");

    let store = args.cache_file.as_ref().map(CsvStore::new);
    let walk = sync_chain(&client, store.as_ref(), &args.start_hash, args.max_blocks).await?;

    for header in &walk.new_headers {
        println!("{}", format_header(header));
    }
    if let Some(tip) = &walk.tip {
        println!("{}", format_header(tip));
        println!("{}", "Reached the chain tip.".bright_yellow());
    }

    Ok(())
}
