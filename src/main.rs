mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use vidpress::context::WorkerContext;
use vidpress::worker;
use vp_av::ToolRegistry;
use vp_core::config::Config;
use vp_db::pool::init_pool;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults based on verbosity.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidpress=trace,vp_av=trace,vp_db=debug,vp_core=debug".to_string()
        } else {
            "vidpress=debug,vp_av=debug,vp_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { workers } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_service(workers, cli.config.as_deref()))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, json, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vidpress {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn start_service(workers: usize, config_path: Option<&std::path::Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    for warning in config.validate() {
        tracing::warn!("Config: {warning}");
    }

    tracing::info!("Starting vidpress worker service");

    // Storage bootstrap: db parent plus upload/output directories.
    if let Some(parent) = config.storage.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir_all(&config.storage.upload_dir)?;
    std::fs::create_dir_all(&config.storage.output_dir)?;

    let db_path = config.storage.db_path.to_string_lossy().to_string();
    tracing::info!("Initializing database at {db_path}");
    let db_pool = init_pool(&db_path)?;

    let tools = ToolRegistry::discover(&config.tools);
    for info in tools.check_all() {
        if info.available {
            tracing::info!(
                "Found {}: {}",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        } else {
            tracing::warn!("{} not found; jobs will fail until it is installed", info.name);
        }
    }

    let ctx = WorkerContext::new(db_pool, Arc::new(config), tools);
    let cancel = CancellationToken::new();

    let worker_count = workers.max(1);
    tracing::info!("Spawning {worker_count} worker(s)");
    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        handles.push(tokio::spawn(worker::run_worker(ctx.clone(), cancel.clone())));
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    cancel.cancel();
    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}

async fn probe_file(
    file: &std::path::Path,
    json: bool,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let report = vp_av::probe_file(&tools, file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("File: {}", file.display());
        let secs = report.duration_secs as u64;
        let mins = secs / 60;
        println!("Duration: {:02}:{:02}:{:02}", mins / 60, mins % 60, secs % 60);
        println!("Resolution: {}x{}", report.width, report.height);
    }

    Ok(())
}

fn check_tools(config_path: Option<&std::path::Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;

    for tool in tools.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable transcoding.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)?;
            let config = Config::from_json(&contents)?;
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("✓ Configuration is valid");
            } else {
                println!("✓ Configuration parsed with {} warning(s):", warnings.len());
                for w in &warnings {
                    println!("  - {w}");
                }
            }
            println!("  Database: {}", config.storage.db_path.display());
            println!("  Max duration: {}s", config.worker.max_duration_seconds);
            println!(
                "  Bot delivery: {}",
                if config.delivery.bot_token.is_some() {
                    "enabled"
                } else {
                    "disabled"
                }
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Database: {}", config.storage.db_path.display());
            println!("  Max duration: {}s", config.worker.max_duration_seconds);
        }
    }

    Ok(())
}
