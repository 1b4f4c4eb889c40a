//! Drives the subcommands against a real database file, the way the binary
//! does, and checks the stored results.

use std::path::PathBuf;

use clap::Parser;

use flohmarkt_cli::config::AppConfig;
use flohmarkt_cli::{commands, Cli, Commands};
use flohmarkt_core::{MarketId, SellerId};
use flohmarkt_db::{Database, DbConfig};

struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "flohmarkt-cli-{}-{name}.db",
            std::process::id()
        ));
        let db = TempDb { path };
        db.cleanup();
        db
    }

    fn cleanup(&self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        self.cleanup();
    }
}

async fn run(db: &TempDb, argv: &[&str]) -> anyhow::Result<()> {
    let path = db.path.to_string_lossy().into_owned();
    let mut full = vec!["flohmarkt", "--db", path.as_str()];
    full.extend_from_slice(argv);

    let cli = Cli::parse_from(full);
    let mut config = AppConfig::default();
    cli.apply_to(&mut config);
    config.validate()?;

    match cli.command {
        Commands::Market(args) => commands::market::execute(args, &config).await,
        Commands::Seller(args) => commands::seller::execute(args, &config).await,
        Commands::Receipt(args) => commands::receipt::execute(args, &config).await,
        Commands::Settle(args) => commands::settle::execute(args, &config).await,
        Commands::Report(args) => commands::report::execute(args, &config).await,
        Commands::Labels(args) => commands::labels::execute(args, &config).await,
    }
}

#[tokio::test]
async fn test_market_day_through_commands() {
    let tmp = TempDb::new("market-day");

    run(&tmp, &["market", "create", "--name", "Herbst", "--date", "14.09.2024"])
        .await
        .unwrap();
    run(&tmp, &["seller", "add", "--first-name", "Anna", "--last-name", "Berger"])
        .await
        .unwrap();
    run(&tmp, &["seller", "add", "--first-name", "Ben", "--last-name", "Fischer"])
        .await
        .unwrap();

    run(&tmp, &["--market", "1", "receipt", "add", "40010500", "*40021500*"])
        .await
        .unwrap();
    run(&tmp, &["--market", "1", "receipt", "finalize"]).await.unwrap();
    run(&tmp, &["--market", "1", "receipt", "add", "40010500"])
        .await
        .unwrap();

    // Report before settling has nothing to show
    assert!(run(&tmp, &["--market", "1", "report"]).await.is_err());

    run(&tmp, &["--market", "1", "settle"]).await.unwrap();
    run(&tmp, &["--market", "1", "report", "--summary"]).await.unwrap();
    run(&tmp, &["--market", "1", "report", "--seller", "4002"])
        .await
        .unwrap();

    let db = Database::new(DbConfig::new(&tmp.path)).await.unwrap();
    let records = db.settlements().list_by_market(MarketId(1)).await.unwrap();
    let totals: Vec<(u16, i64)> = records
        .iter()
        .map(|r| (r.seller_id.value(), r.total.cents()))
        .collect();
    assert_eq!(totals, vec![(4001, 500), (4002, 1500)]);

    let open = db.receipts().current_open(MarketId(1)).await.unwrap();
    assert_eq!(open.number, 2);
    assert_eq!(open.items.len(), 1);
    db.close().await;
}

#[tokio::test]
async fn test_rejected_items_leave_receipt_unchanged() {
    let tmp = TempDb::new("rejected");

    run(&tmp, &["market", "create", "--name", "Herbst", "--date", "14.09.2024"])
        .await
        .unwrap();
    run(&tmp, &["seller", "add", "--id", "4001", "--first-name", "Anna", "--last-name", "Berger"])
        .await
        .unwrap();

    let err = run(&tmp, &["--market", "1", "receipt", "add", "47110500"])
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("not registered or not active"));

    assert!(run(&tmp, &["--market", "1", "receipt", "add", "4001050"]).await.is_err());
    assert!(run(&tmp, &["--market", "1", "receipt", "finalize"]).await.is_err());

    let db = Database::new(DbConfig::new(&tmp.path)).await.unwrap();
    let open = db.receipts().current_open(MarketId(1)).await.unwrap();
    assert_eq!(open.number, 1);
    assert!(open.items.is_empty());
    db.close().await;
}

#[tokio::test]
async fn test_seller_registry_commands() {
    let tmp = TempDb::new("sellers");

    run(&tmp, &["seller", "add", "--id", "4002", "--first-name", "Ben", "--last-name", "Fischer"])
        .await
        .unwrap();
    run(&tmp, &["seller", "add", "--first-name", "Anna", "--last-name", "Berger"])
        .await
        .unwrap();

    // Duplicate number
    assert!(run(&tmp, &["seller", "add", "--id", "4002", "--first-name", "X", "--last-name", "Y"])
        .await
        .is_err());

    run(&tmp, &["seller", "toggle", "4002"]).await.unwrap();
    run(&tmp, &["seller", "remove", "4001"]).await.unwrap();
    assert!(run(&tmp, &["seller", "remove", "4001"]).await.is_err());

    let export = tmp.path.with_extension("csv");
    let export_arg = export.to_string_lossy().into_owned();
    run(&tmp, &["seller", "export", "--output", export_arg.as_str()])
        .await
        .unwrap();
    let csv = std::fs::read_to_string(&export).unwrap();
    let _ = std::fs::remove_file(&export);
    assert_eq!(csv, "seller_id,name,email\n");

    let db = Database::new(DbConfig::new(&tmp.path)).await.unwrap();
    let ben = db
        .sellers()
        .find_by_seller_id(SellerId::new(4002).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(!ben.active);
    assert!(db
        .sellers()
        .find_by_seller_id(SellerId::new(4001).unwrap())
        .await
        .unwrap()
        .is_none());
    db.close().await;
}

#[tokio::test]
async fn test_labels_need_a_registered_seller() {
    let tmp = TempDb::new("labels");

    assert!(run(&tmp, &["labels", "--seller", "4001", "--label", "50=6"]).await.is_err());

    run(&tmp, &["seller", "add", "--first-name", "Anna", "--last-name", "Berger"])
        .await
        .unwrap();
    run(&tmp, &["labels", "--seller", "4001", "--label", "50=6"])
        .await
        .unwrap();

    // Nothing ordered still prints an empty plan
    run(&tmp, &["labels", "--seller", "4001"]).await.unwrap();
}

#[tokio::test]
async fn test_market_commands_need_a_market() {
    let tmp = TempDb::new("no-market");
    let err = run(&tmp, &["settle"]).await.unwrap_err();
    assert!(err.to_string().contains("market"));
}
