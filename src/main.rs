use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::process::ExitCode;

use skyfuse::config::Config;
use skyfuse::ingest::parse_states_document;
use skyfuse::state::{decode_row, identifier_of, IngestClock, Provenance};
use skyfuse::web::server::Backends;

#[derive(Parser)]
#[command(name = "skyfuse")]
#[command(about = "Aircraft state fusion and trajectory prediction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API, ingestion pollers and history retention
    Serve {
        #[arg(short, long, default_value = "skyfuse.yaml")]
        config: String,
    },
    /// Check an OpenSky-format batch file and list rejected rows
    Validate { batch: String },
    /// Print archived observations for one aircraft
    History {
        #[arg(short, long, default_value = "skyfuse.yaml")]
        config: String,
        icao24: String,
        /// Epoch seconds
        #[arg(long)]
        from: Option<i64>,
        /// Epoch seconds
        #[arg(long)]
        to: Option<i64>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config),
        Commands::Validate { batch } => validate(&batch),
        Commands::History {
            config,
            icao24,
            from,
            to,
        } => history(&config, &icao24, from, to),
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            None
        }
    }
}

fn serve(config_path: &str) -> ExitCode {
    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(skyfuse::web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Accepts either a full `{"states": [...]}` document or a bare row array.
fn read_rows(content: &str) -> Result<Vec<Value>, String> {
    match serde_json::from_str::<Value>(content).map_err(|e| e.to_string())? {
        Value::Array(rows) => Ok(rows),
        Value::Object(_) => parse_states_document(content.as_bytes())
            .map(|(_, rows)| rows)
            .map_err(|e| e.to_string()),
        _ => Err("expected a states document or an array of rows".to_string()),
    }
}

fn validate(path: &str) -> ExitCode {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let rows = match read_rows(&content) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let clock = IngestClock::new();
    let provenance = Provenance::primary_feed();
    let mut rejected = 0;
    for (i, row) in rows.iter().enumerate() {
        if let Err(e) = decode_row(row, &provenance, clock.now()) {
            rejected += 1;
            println!("  {}: {} rejected: {}", i + 1, identifier_of(row), e);
        }
    }

    println!("{} rows, {} valid, {} rejected", rows.len(), rows.len() - rejected, rejected);
    if rejected == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn history(config_path: &str, icao24: &str, from: Option<i64>, to: Option<i64>) -> ExitCode {
    if from.is_some_and(|t| t < 0) || to.is_some_and(|t| t < 0) {
        eprintln!("--from and --to must not be negative");
        return ExitCode::FAILURE;
    }
    let Some(config) = load_config(config_path) else {
        return ExitCode::FAILURE;
    };

    let backends = match Backends::open(&config.storage) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error opening store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let to = to.unwrap_or_else(|| Utc::now().timestamp());
    let from = from.unwrap_or(to.saturating_sub(3600).max(0));
    let rows = match backends.history.range(icao24, from, to) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error reading history: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for row in &rows {
        match serde_json::to_string(row) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Error encoding row: {}", e),
        }
    }
    eprintln!("{} observations for {}", rows.len(), icao24);
    ExitCode::SUCCESS
}
