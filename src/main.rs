use clap::Parser;
use coinup::application::coordinator::OrderCoordinator;
use coinup::config::GatewayConfig;
use coinup::domain::account::{Amount, CoinAmount, CoinBalance, UserAccount, UserId};
use coinup::domain::ports::{PaymentGatewayBox, PaymentSdkBox, TransactionLogArc, UserStoreArc};
use coinup::infrastructure::in_memory::{InMemoryTransactionLog, InMemoryUserStore};
use coinup::infrastructure::sandbox::{SandboxProvider, ScriptedOutcome};
use coinup::interfaces::csv::account_writer::AccountWriter;
use coinup::interfaces::csv::order_reader::{OrderReader, PurchaseRequest};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input order script CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Starting coin balance for a user, as USER=COINS. Repeatable.
    /// Users named only in the script start at zero coins.
    #[arg(long, value_parser = parse_seed)]
    seed: Vec<(String, u64)>,
}

/// A script row validated into domain types, plus the outcome the
/// sandbox provider plays for it.
struct ScriptedOrder {
    user: UserId,
    amount: Amount,
    coins: CoinAmount,
    outcome: ScriptedOutcome,
}

fn parse_seed(s: &str) -> std::result::Result<(String, u64), String> {
    let Some((user, coins)) = s.split_once('=') else {
        return Err(format!("expected USER=COINS, got '{s}'"));
    };
    let coins = coins
        .parse()
        .map_err(|e| format!("invalid coin count '{coins}': {e}"))?;
    Ok((user.to_string(), coins))
}

fn validate(row: PurchaseRequest) -> coinup::error::Result<ScriptedOrder> {
    Ok(ScriptedOrder {
        user: UserId::from(row.user),
        amount: Amount::try_from(row.amount)?,
        coins: CoinAmount::try_from(row.coins)?,
        outcome: row.outcome,
    })
}

fn init_tracing() {
    // Logs go to stderr; stdout carries only the final report.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_stores(db_path: Option<PathBuf>) -> Result<(UserStoreArc, TransactionLogArc)> {
    if let Some(path) = db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            let store =
                coinup::infrastructure::rocksdb::RocksDBStore::open(path).into_diagnostic()?;
            return Ok((Arc::new(store.clone()), Arc::new(store)));
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = path;
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
    }
    Ok((
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryTransactionLog::new()),
    ))
}

/// Creates the accounts the run refers to, without touching ones that
/// already exist in the store.
async fn seed_accounts(
    users: &UserStoreArc,
    seeds: &[(String, u64)],
    orders: &[ScriptedOrder],
) -> Result<()> {
    for (user, coins) in seeds {
        let id = UserId::from(user.as_str());
        if users.get(&id).await.into_diagnostic()?.is_none() {
            let account =
                UserAccount::new(id, user.as_str()).with_balance(CoinBalance::new(*coins));
            users.put(account).await.into_diagnostic()?;
        }
    }
    for order in orders {
        if users.get(&order.user).await.into_diagnostic()?.is_none() {
            users
                .put(UserAccount::new(order.user.clone(), order.user.as_str()))
                .await
                .into_diagnostic()?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let (users, log) = build_stores(cli.db_path)?;

    // The sandbox provider needs the outcome column before the first
    // order runs, so the script is read fully up front.
    let file = File::open(&cli.input).into_diagnostic()?;
    let mut orders = Vec::new();
    for row in OrderReader::new(file).orders() {
        match row.and_then(validate) {
            Ok(order) => orders.push(order),
            Err(e) => eprintln!("Error reading order: {e}"),
        }
    }

    seed_accounts(&users, &cli.seed, &orders).await?;

    let provider = SandboxProvider::new(orders.iter().map(|o| o.outcome));
    let gateway: PaymentGatewayBox = Box::new(provider.clone());
    let sdk: PaymentSdkBox = Box::new(provider);
    let (coordinator, mut notices) =
        OrderCoordinator::new(users.clone(), log, gateway, sdk, GatewayConfig::default());

    for order in &orders {
        coordinator
            .submit(&order.user, order.amount, order.coins)
            .await;
        while let Ok(notice) = notices.try_recv() {
            eprintln!(
                "order {} [{}] {}: {}",
                notice.order, notice.status, notice.user, notice.message
            );
        }
    }

    // Output final state
    let accounts = users.all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}
