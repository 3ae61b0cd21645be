//! unisync CLI: mirror Unigraph notes into a Markdown vault.
//!
//! Usage:
//!   unisync sync [--config path] [--host name] [--port n] [--vault dir]
//!   unisync render <entity.json> [--out dir]
//!   unisync embeds <file.md>

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use unisync::{
    find_embeds, translate, write_or_update, FsVault, GraphEntity, SyncConfig, SyncOrchestrator,
    UnigraphClient, WriteOutcome,
};

#[derive(Parser)]
#[command(
    name = "unisync",
    version,
    about = "Sync Unigraph notes into a Markdown vault"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for backend updates and write changed notes into the vault
    Sync {
        /// Path to the YAML config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Backend hostname (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Backend port (overrides config)
        #[arg(long)]
        port: Option<u16>,
        /// Vault directory (overrides config)
        #[arg(long)]
        vault: Option<PathBuf>,
    },
    /// Render entity JSON (as returned by get_object) to Markdown pages
    Render {
        /// File containing one entity or an array of entities
        input: PathBuf,
        /// Write pages into this vault directory instead of printing them
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the entity embeds in a Markdown file
    Embeds {
        /// Markdown file to scan
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("unisync=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(
    path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    vault: Option<PathBuf>,
) -> Result<SyncConfig, String> {
    let path = path.unwrap_or_else(SyncConfig::default_path);
    let mut config = SyncConfig::load(&path)
        .map_err(|e| format!("Failed to load config {}: {}", path.display(), e))?;
    if let Some(host) = host {
        config.set_hostname(host);
    }
    if let Some(port) = port {
        config.set_port(port);
    }
    if let Some(vault) = vault {
        config.vault = vault;
    }
    Ok(config)
}

async fn cmd_sync(config: SyncConfig) -> i32 {
    let vault = match FsVault::open(&config.vault) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: failed to open vault {}: {}", config.vault.display(), e);
            return 1;
        }
    };

    let url = config.server_url();
    tracing::info!(url = %url, vault = %config.vault.display(), "starting sync");
    let client = UnigraphClient::spawn(url);
    let orchestrator = SyncOrchestrator::new(Arc::new(client), Arc::new(vault), config.sync_options());

    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
            cancel.cancel();
        }
    });

    match orchestrator.run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn read_entities(input: &Path) -> Result<Vec<GraphEntity>, String> {
    let text = std::fs::read_to_string(input)
        .map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| format!("Invalid JSON in {}: {}", input.display(), e))?;
    GraphEntity::from_batch(&value).map_err(|e| format!("Invalid entity in {}: {}", input.display(), e))
}

async fn cmd_render(input: &Path, out: Option<&Path>) -> i32 {
    let entities = match read_entities(input) {
        Ok(entities) => entities,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let documents = translate(&entities);

    let Some(out) = out else {
        for doc in &documents {
            println!("==> {} <==", doc.path);
            println!("{}", doc.content);
        }
        return 0;
    };

    let vault = match FsVault::open(out) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: failed to open vault {}: {}", out.display(), e);
            return 1;
        }
    };
    let mut code = 0;
    for doc in &documents {
        match write_or_update(&vault, &doc.path, &doc.content).await {
            Ok(WriteOutcome::Created) => println!("Created {}", doc.path),
            Ok(WriteOutcome::Modified) => println!("Updated {}", doc.path),
            Err(e) => {
                eprintln!("Error: {}: {}", doc.path, e);
                code = 1;
            }
        }
    }
    code
}

fn cmd_embeds(file: &Path) -> i32 {
    let markdown = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", file.display(), e);
            return 1;
        }
    };
    let embeds = find_embeds(&markdown);
    if embeds.is_empty() {
        println!("No embeds found.");
        return 0;
    }
    for embed in &embeds {
        println!("{}  #{}", embed.uid, embed.container_id());
    }
    0
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Sync { config, host, port, vault } => match load_config(config, host, port, vault) {
            Ok(config) => cmd_sync(config).await,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Render { input, out } => cmd_render(&input, out.as_deref()).await,
        Commands::Embeds { file } => cmd_embeds(&file),
    };
    std::process::exit(code);
}
