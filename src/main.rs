#![forbid(unsafe_code)]

mod gui;

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use dental_chart::chart::ToothRecordStore;
use dental_chart::config::Config;
use dental_chart::constants::preference::STORAGE_KEY;
use dental_chart::dispatcher;
use dental_chart::interaction::InteractionState;
use dental_chart::ipc::{self, spawn_hub, SyncHub};
use dental_chart::preference::{
    DesignPreference, FileStorage, PreferenceStorage, PreferenceStore, StorageChange, ViewId,
};

#[derive(Parser)]
#[command(name = "dental-chart", version, about = "Dental chart viewer with synchronized layouts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a chart window (default)
    View {
        /// Chart snapshot (JSON array, or object keyed by tooth number)
        #[arg(long)]
        chart: Option<PathBuf>,
        /// Layout to open with; also becomes the stored preference
        #[arg(long)]
        design: Option<String>,
    },
    /// Run the sync hub in the foreground
    Hub {
        /// Stop once the last connected view has gone
        #[arg(long)]
        exit_when_idle: bool,
    },
    /// Read or change the stored design preference
    Design {
        #[command(subcommand)]
        action: DesignCommand,
    },
    /// Print the computed layout as JSON
    Layout {
        #[arg(long)]
        design: Option<String>,
        #[arg(long)]
        chart: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DesignCommand {
    Get,
    Set { name: String },
}

fn parse_log_level(raw: &str) -> TraceLevel {
    match raw.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn load_records(chart: Option<&Path>) -> Result<ToothRecordStore> {
    match chart {
        Some(path) => ToothRecordStore::load(path),
        None => Ok(ToothRecordStore::new()),
    }
}

/// Strict parsing for names typed on the command line
fn parse_design(raw: &str) -> Result<DesignPreference> {
    match DesignPreference::parse(raw) {
        Some(design) => Ok(design),
        None => {
            let known: Vec<&str> = DesignPreference::ALL.iter().map(|d| d.as_str()).collect();
            bail!("Unknown design '{raw}' (expected one of: {})", known.join(", "))
        }
    }
}

fn run_hub(exit_when_idle: bool) -> Result<()> {
    let hub = SyncHub::bind()?;
    let socket_path = hub.path().to_path_buf();
    let (idle_tx, idle_rx) = mpsc::channel();
    let handle = spawn_hub(hub, exit_when_idle.then_some(idle_tx));

    if exit_when_idle {
        // Only a registered view leaving can make the hub idle
        let _ = idle_rx.recv();
        info!("Last view disconnected, stopping sync hub");
        std::fs::remove_file(&socket_path).ok();
        return Ok(());
    }

    handle
        .join()
        .map_err(|_| anyhow::anyhow!("Sync hub thread panicked"))
}

fn design_get() -> Result<()> {
    let storage = FileStorage::new();
    let stored = storage
        .load(STORAGE_KEY)
        .with_context(|| format!("Failed to read preference from {}", storage.path().display()))?;
    let design = stored.as_deref().map(DesignPreference::from_str_lossy).unwrap_or_default();
    println!("{design}");
    Ok(())
}

fn design_set(name: &str) -> Result<()> {
    let design = parse_design(name)?;
    let mut storage = FileStorage::new();
    storage.save(STORAGE_KEY, design.as_str())?;

    let change = StorageChange {
        key: STORAGE_KEY.to_string(),
        value: Some(design.as_str().to_string()),
        origin: ViewId::generate(),
    };
    match ipc::default_socket_path().and_then(|path| ipc::notify(&path, &change)) {
        Ok(()) => info!(design = %design, "Open views notified"),
        Err(e) => info!(error = ?e, "No sync hub running, open views will pick this up on restart"),
    }
    println!("{design}");
    Ok(())
}

fn print_layout(design: Option<&str>, chart: Option<&Path>, config: &Config) -> Result<()> {
    let records = load_records(chart)?;
    let layout = match design {
        Some(raw) => dispatcher::select_raw(raw, &config.layout),
        None => {
            let mut store = PreferenceStore::open(Box::new(FileStorage::new()), ViewId::generate());
            dispatcher::select(store.read(), &config.layout)
        }
    };
    let tree = layout.render(&records, &InteractionState::new());
    println!("{}", serde_json::to_string_pretty(&tree).context("Failed to serialize layout")?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {e:?}");
            None
        }
    };
    let config_missing = config.is_none();
    let config = config.unwrap_or_default();

    // LOG_LEVEL wins over the config file
    let log_level = parse_log_level(
        &std::env::var("LOG_LEVEL").unwrap_or_else(|_| config.log_level.clone()),
    );
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if config_missing {
        warn!(path = %Config::path().display(), "Running with default config");
    }

    match cli.command.unwrap_or(Commands::View { chart: None, design: None }) {
        Commands::View { chart, design } => {
            let records = load_records(chart.as_deref())?;
            let design = design.as_deref().map(parse_design).transpose()?;
            let title = match &chart {
                Some(path) => format!("Dental Chart - {}", path.display()),
                None => "Dental Chart".to_string(),
            };
            gui::run_gui(gui::ViewOptions { config, records, design, title })
        }
        Commands::Hub { exit_when_idle } => run_hub(exit_when_idle),
        Commands::Design { action: DesignCommand::Get } => design_get(),
        Commands::Design { action: DesignCommand::Set { name } } => design_set(&name),
        Commands::Layout { design, chart } => print_layout(design.as_deref(), chart.as_deref(), &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("DEBUG"), TraceLevel::DEBUG);
        assert_eq!(parse_log_level("verbose"), TraceLevel::INFO);
    }

    #[test]
    fn test_cli_designs_are_strict() {
        assert_eq!(parse_design("anatomical").unwrap(), DesignPreference::Anatomical);
        assert!(parse_design("holographic").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["dental-chart", "design", "set", "clinical"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Design { action: DesignCommand::Set { ref name } }) if name == "clinical"
        ));
        let cli = Cli::try_parse_from(["dental-chart"]).unwrap();
        assert!(cli.command.is_none());
    }
}
