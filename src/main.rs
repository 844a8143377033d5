use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use contract_ledger::application::service::LedgerService;
use contract_ledger::config::{LedgerConfig, ReportsConfig};
use contract_ledger::domain::ports::LedgerStoreRef;
use contract_ledger::domain::report::DateRange;
use contract_ledger::error::{LedgerError, Result as LedgerResult, ValidationError};
use contract_ledger::infrastructure::in_memory::InMemoryLedgerStore;
#[cfg(feature = "storage-rocksdb")]
use contract_ledger::infrastructure::rocksdb::RocksDbLedgerStore;
use contract_ledger::interfaces::csv::seed_reader::Dataset;
use contract_ledger::telemetry;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
#[cfg(not(feature = "storage-rocksdb"))]
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding profiles.csv, contracts.csv and jobs.csv to load first
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// TOML file overriding ledger policy and store settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pay for a job as the client of its contract
    Pay {
        #[arg(long)]
        job: u32,
        /// Calling profile
        #[arg(long)]
        profile: u32,
    },
    /// Deposit into the calling client's balance
    Deposit {
        #[arg(long)]
        profile: u32,
        #[arg(long)]
        amount: Decimal,
    },
    /// List unpaid jobs on the caller's active contracts
    Unpaid {
        #[arg(long)]
        profile: u32,
    },
    /// Show one contract, or list the caller's active contracts
    Contracts {
        #[arg(long)]
        profile: u32,
        #[arg(long)]
        id: Option<u32>,
    },
    /// Profession that earned the most between two dates (inclusive)
    BestProfession {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Clients that paid the most between two dates (inclusive)
    BestClients {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print every profile balance
    Balances,
}

enum Reply {
    Json(Value),
    NoData(&'static str),
}

#[cfg_attr(not(feature = "storage-rocksdb"), allow(unused_variables))]
fn open_store(db_path: Option<&Path>, config: &LedgerConfig) -> Result<LedgerStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = RocksDbLedgerStore::open(path, config.store.lock_timeout_ms)
                .into_diagnostic()?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Arc::new(InMemoryLedgerStore::new()))
        }
        None => Ok(Arc::new(InMemoryLedgerStore::new())),
    }
}

async fn execute(
    service: &LedgerService,
    reports: &ReportsConfig,
    command: Command,
) -> LedgerResult<Reply> {
    let value = match command {
        Command::Pay { job, profile } => {
            service.profile(profile).await?;
            serde_json::to_value(service.pay_job(job, profile).await?)?
        }
        Command::Deposit { profile, amount } => {
            service.profile(profile).await?;
            serde_json::to_value(service.deposit(profile, amount).await?)?
        }
        Command::Unpaid { profile } => {
            service.profile(profile).await?;
            serde_json::to_value(service.unpaid_jobs(profile).await?)?
        }
        Command::Contracts { profile, id } => {
            service.profile(profile).await?;
            match id {
                Some(id) => serde_json::to_value(service.contract(profile, id).await?)?,
                None => serde_json::to_value(service.contracts(profile).await?)?,
            }
        }
        Command::BestProfession { start, end } => {
            let range = DateRange::from_days(start, end)?;
            let rows = service.best_profession(range).await?;
            match rows.as_slice() {
                [] => return Ok(Reply::NoData("No payments in range")),
                [top] if reports.profession_top_only => serde_json::to_value(top)?,
                _ => serde_json::to_value(&rows)?,
            }
        }
        Command::BestClients { start, end, limit } => {
            let range = DateRange::from_days(start, end)?;
            if limit == Some(0) {
                return Err(ValidationError::InvalidLimit.into());
            }
            serde_json::to_value(service.best_clients(range, limit).await?)?
        }
        Command::Balances => serde_json::to_value(service.balances().await?)?,
    };
    Ok(Reply::Json(value))
}

fn reject(status: u16, message: &str) -> ExitCode {
    eprintln!("{}", json!({ "status": status, "error": message }));
    ExitCode::from(2)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => LedgerConfig::load(path).into_diagnostic()?,
        None => LedgerConfig::default(),
    };

    let store = open_store(cli.db_path.as_deref(), &config)?;
    let service = LedgerService::new(store, &config);

    if let Some(dir) = &cli.seed {
        let dataset = Dataset::from_dir(dir).into_diagnostic()?;
        service.load(dataset).await.into_diagnostic()?;
    }

    match execute(&service, &config.reports, cli.command).await {
        Ok(Reply::Json(value)) => {
            println!("{}", serde_json::to_string_pretty(&value).into_diagnostic()?);
            Ok(ExitCode::SUCCESS)
        }
        Ok(Reply::NoData(message)) => Ok(reject(404, message)),
        Err(e) if e.is_rejection() => Ok(reject(e.status(), &e.to_string())),
        Err(e) => Err::<ExitCode, LedgerError>(e).into_diagnostic(),
    }
}
