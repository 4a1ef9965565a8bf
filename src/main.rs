use clap::{Parser, Subcommand};
use serde::Deserialize;
use unit_admin::core::Notifier;
use unit_admin::domain::model::NotificationLevel;
use unit_admin::utils::{logger, validation::Validate};
use unit_admin::{
    AdminConfig, CepRangeEntry, CepRangeList, Notification, PersistenceGateway, PostgrestBackend,
    Unit, UnitDialog,
};

#[derive(Parser)]
#[command(name = "unit-admin")]
#[command(about = "Manage service units and their CEP coverage")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "unit-admin.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a unit as JSON
    Show { unit_id: i64 },
    /// Print the served ranges and excluded segments of a unit
    Ranges { unit_id: i64 },
    /// Print the blocked CEPs of a unit
    Blocked { unit_id: i64 },
    /// Save a unit and its ranges from a JSON draft file
    Save { draft: String },
    /// Remove one range of a unit by its position in `ranges` output
    RemoveRange { unit_id: i64, index: usize },
}

/// `{"unit": {...}, "ranges": [...]}`
#[derive(Deserialize)]
struct Draft {
    unit: Unit,
    #[serde(default)]
    ranges: Vec<CepRangeEntry>,
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => {
                println!("✅ {}: {}", notification.title, notification.description)
            }
            NotificationLevel::Error => {
                eprintln!("❌ {}: {}", notification.title, notification.description)
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match AdminConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose || config.verbose());
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let backend = PostgrestBackend::new(&config)?;

    match args.command {
        Command::Show { unit_id } => {
            let gateway = PersistenceGateway::new(backend);
            match gateway.load_unit(unit_id).await? {
                Some(unit) => println!("{}", serde_json::to_string_pretty(&unit)?),
                None => {
                    eprintln!("❌ Unit {} not found", unit_id);
                    std::process::exit(2);
                }
            }
        }
        Command::Ranges { unit_id } => {
            let gateway = PersistenceGateway::new(backend);
            let entries = gateway.load_ranges(unit_id).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Command::Blocked { unit_id } => {
            let gateway = PersistenceGateway::new(backend);
            for cep in gateway.load_blocked_ceps(unit_id).await? {
                println!("{}", cep);
            }
        }
        Command::Save { draft } => {
            let content = std::fs::read_to_string(&draft)?;
            let draft: Draft = serde_json::from_str(&content)?;
            let mut list = CepRangeList::new();
            list.replace_all(draft.ranges);

            let gateway = PersistenceGateway::new(backend);
            match gateway.save(&draft.unit, &mut list).await {
                Ok(outcome) => {
                    println!(
                        "✅ Unit {} {} ({} served, {} excluded, {} skipped)",
                        outcome.unit_id,
                        if outcome.created { "created" } else { "updated" },
                        outcome.served_written,
                        outcome.excluded_written,
                        outcome.skipped.len()
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "save failed");
                    eprintln!("❌ {}", e.user_friendly_message());
                    std::process::exit(1);
                }
            }
        }
        Command::RemoveRange { unit_id, index } => {
            let gateway = PersistenceGateway::new(backend.clone());
            let Some(unit) = gateway.load_unit(unit_id).await? else {
                eprintln!("❌ Unit {} not found", unit_id);
                std::process::exit(2);
            };

            let mut dialog = UnitDialog::new(backend, ConsoleNotifier);
            dialog.open(Some(unit)).await;
            if dialog.remove_range(index).await {
                println!("✅ Range {} removed; {} left", index, dialog.ranges().len());
            } else {
                eprintln!("❌ Range {} could not be removed", index);
                std::process::exit(1);
            }
            dialog.cancel();
        }
    }

    Ok(())
}
