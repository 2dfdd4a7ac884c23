use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slots_application::SlotService;
use slots_infrastructure::{SlotsConfig, StorageBackend};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit;

#[derive(Parser, Debug)]
#[command(name = "slots")]
#[command(about = "Slots - balance ledger and payout engine", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/slots/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding ledger.toml; overrides the config file
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Keep the ledger in memory for this invocation only
    #[arg(long, global = true, conflicts_with = "data_dir")]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create and inspect accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Open a session by moving funds out of an account
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Spin the live session of an account
    Roll {
        id: String,
        /// Number of spins; stops early when the session runs dry
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        times: u32,
    },
    /// Close the live session and return its balance to the account
    Cashout { id: String },
}

#[derive(Subcommand, Debug)]
enum AccountAction {
    /// Create an account
    Create {
        id: String,
        /// Starting balance (default from config, normally 10)
        #[arg(long)]
        balance: Option<u64>,
    },
    /// Show account and session balances
    Show { id: String },
}

#[derive(Subcommand, Debug)]
enum SessionAction {
    /// Open a session
    Open {
        id: String,
        /// Amount to move into the session (default: the whole balance)
        #[arg(long)]
        amount: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{:#}", err);
            let failure = exit::Failure::from_error(&err);
            println!("{}", failure.to_json());
            ExitCode::from(failure.code)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slots=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<SlotsConfig> {
    let mut config = match &cli.config {
        Some(path) => SlotsConfig::load(path),
        None => SlotsConfig::load_default(),
    }
    .context("Failed to load configuration")?;

    if cli.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    if let Some(dir) = &cli.data_dir {
        config.storage.backend = StorageBackend::Toml;
        config.storage.data_dir = Some(dir.clone());
    }

    Ok(config)
}

async fn run(cli: Cli) -> Result<String> {
    let config = load_config(&cli)?;
    let service = SlotService::from_config(&config).context("Failed to open the ledger")?;

    let value = match cli.command {
        Commands::Account { action } => match action {
            AccountAction::Create { id, balance } => {
                commands::account::create(&service, &id, balance).await?
            }
            AccountAction::Show { id } => commands::account::show(&service, &id).await?,
        },
        Commands::Session { action } => match action {
            SessionAction::Open { id, amount } => {
                commands::session::open(&service, &id, amount).await?
            }
        },
        Commands::Roll { id, times } => commands::play::roll(&service, &id, times).await?,
        Commands::Cashout { id } => commands::play::cashout(&service, &id).await?,
    };

    Ok(serde_json::to_string_pretty(&value)?)
}
