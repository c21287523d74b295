use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use wtl_live::cli::{Args, Command};
use wtl_live::config::{self, PathConfig, Settings};
use wtl_live::entities::traits::NullCanvas;
use wtl_live::protocol::{HttpTransport, RecordingTransport, Transport};
use wtl_live::replay;
use wtl_live::server::{BackendRoutes, MockBackend};

fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("rouille", log::LevelFilter::Warn)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging respects RUST_LOG if set
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    init_logging(&args, &path_config)?;
    debug!("Command-line args: {:?}", args);
    info!(
        "Config path: {}",
        config::config_file(config::SETTINGS_FILE, &path_config).display()
    );

    let settings = Settings::resolve(&path_config, args.backend.as_deref())?;

    match &args.command {
        Command::MockBackend { port } => {
            let addr = format!("127.0.0.1:{}", port);
            MockBackend::run(&addr, BackendRoutes::from(&settings))
        }
        Command::Replay { script, dry_run } => {
            let canvas = Arc::new(NullCanvas);
            if *dry_run {
                let recorder = Arc::new(RecordingTransport::new());
                let summary = replay::replay_file(script, &settings, recorder.clone(), canvas)?;
                for (route, body) in recorder.posts() {
                    println!("POST {} {}", route, body);
                }
                println!("{}", summary);
            } else {
                let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&settings.backend_url)?);
                info!("Backend: {}", settings.backend_url);
                let summary = replay::replay_file(script, &settings, transport, canvas)?;
                println!("{}", summary);
            }
            Ok(())
        }
    }
}
