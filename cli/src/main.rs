use anyhow::{Context, bail};
use clap::Parser;
use clap_derive::{Parser, Subcommand};
use config::{PathManager, Settings, load_env_file};
use fedcat_core::model::ProviderType;
use fedcat_core::{NodeId, ProviderInput, SqliteStore, Synchronizer};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fedcat", author, version, about, long_about = None)]
struct Args {
    /// Catalog database (defaults to the settings file, then the data directory)
    #[arg(long, global = true, env = "FEDCAT_DB")]
    db: Option<PathBuf>,

    /// Log every node the sync engine touches
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the data directories and save --db and the log filter to the settings file
    Init {
        /// `tracing` filter directive used when RUST_LOG is unset
        #[arg(long)]
        log_filter: Option<String>,
    },
    /// Converge the catalog to a provider tree read from FILE (JSON, or TOML by extension)
    Sync { file: PathBuf },
    /// Print a provider's tree as JSON
    Show {
        #[arg(long)]
        name: String,
        #[arg(long = "type")]
        provider_type: ProviderType,
    },
    /// Remove a provider and everything only it owned
    Delete {
        #[arg(long)]
        name: String,
        #[arg(long = "type")]
        provider_type: ProviderType,
    },
}

fn setup_tracing(verbose: bool, settings: &Settings) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .ok()
            .or_else(|| settings.log_filter.as_deref().and_then(|f| EnvFilter::try_new(f).ok()))
            .unwrap_or_else(|| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_tree(path: &Path) -> anyhow::Result<ProviderInput> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let tree = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid provider tree in {}", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Invalid provider tree in {}", path.display()))?,
    };
    Ok(tree)
}

fn open_store(args: &Args, settings: &Settings) -> anyhow::Result<SqliteStore> {
    let Some(path) = args.db.clone().or_else(|| settings.database_path()) else {
        bail!("Could not determine the catalog database path; pass --db");
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    info!("Opening catalog at {}", path.display());
    SqliteStore::open(&path)
}

fn lookup(
    sync: &Synchronizer<SqliteStore>,
    name: &str,
    provider_type: ProviderType,
) -> anyhow::Result<NodeId> {
    sync.find_provider(name, provider_type)?
        .with_context(|| format!("No {} provider named '{}'", provider_type, name))
}

fn init(args: &Args, settings: &Settings, log_filter: Option<&str>) -> anyhow::Result<()> {
    PathManager::ensure_dirs_exist().context("Failed to create data directories")?;

    let mut settings = settings.clone();
    if let Some(db) = &args.db {
        settings.database_path = Some(db.clone());
    }
    if let Some(filter) = log_filter {
        settings.log_filter = Some(filter.to_string());
    }
    settings.save().map_err(anyhow::Error::msg)?;

    if let Some(path) = PathManager::settings_path() {
        println!("Saved settings to {}", path.display());
    }
    Ok(())
}

fn run(args: &Args, settings: &Settings) -> anyhow::Result<()> {
    let open = || open_store(args, settings).map(Synchronizer::new);

    match &args.command {
        Command::Init { log_filter } => init(args, settings, log_filter.as_deref())?,
        Command::Sync { file } => {
            let tree = read_tree(file)?;
            let outcome = open()?.sync_provider(&tree)?;
            println!("{} {}", outcome.provider, outcome.status);
        }
        Command::Show {
            name,
            provider_type,
        } => {
            let sync = open()?;
            let provider = lookup(&sync, name, *provider_type)?;
            let tree = sync.export_provider(&provider)?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Command::Delete {
            name,
            provider_type,
        } => {
            let sync = open()?;
            let provider = lookup(&sync, name, *provider_type)?;
            sync.delete_provider(&provider)?;
            println!("{} deleted", provider);
        }
    }
    Ok(())
}

fn main() {
    load_env_file();
    let args = Args::parse();
    let settings = Settings::load();

    setup_tracing(args.verbose, &settings);

    if let Err(e) = run(&args, &settings) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_takes_db_and_log_filter() {
        let args = Args::try_parse_from([
            "fedcat",
            "--db",
            "/tmp/catalog.db",
            "init",
            "--log-filter",
            "fedcat_core=debug",
        ])
        .unwrap();

        assert_eq!(args.db, Some(PathBuf::from("/tmp/catalog.db")));
        match args.command {
            Command::Init { log_filter } => assert_eq!(log_filter.as_deref(), Some("fedcat_core=debug")),
            other => panic!("expected init, got {other:?}"),
        }
    }

    #[test]
    fn show_parses_provider_type() {
        let args = Args::try_parse_from(["fedcat", "show", "--name", "recas", "--type", "openstack"]).unwrap();
        match args.command {
            Command::Show { name, provider_type } => {
                assert_eq!(name, "recas");
                assert_eq!(provider_type, ProviderType::Openstack);
            }
            other => panic!("expected show, got {other:?}"),
        }
    }
}
