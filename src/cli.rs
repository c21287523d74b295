use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Interactive preview control layer for node-graph image effects
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Backend base URL (overrides settings file and WTL_LIVE_BACKEND)
    #[arg(short = 'b', long = "backend", value_name = "URL", global = true)]
    pub backend: Option<String>,

    /// Enable debug logging to file (default: wtl-live.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the params and control routes locally
    MockBackend {
        /// Port to listen on (0 picks a free one)
        #[arg(short = 'p', long = "port", default_value_t = 8188)]
        port: u16,
    },
    /// Drive the bridge with a JSON script of host events
    Replay {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Record messages instead of posting them
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay_with_global_flags() {
        let args = Args::parse_from(["wtl-live", "replay", "events.json", "--dry-run", "-vv", "--backend", "http://h:1"]);
        assert_eq!(
            args.command,
            Command::Replay {
                script: PathBuf::from("events.json"),
                dry_run: true
            }
        );
        assert_eq!(args.verbosity, 2);
        assert_eq!(args.backend.as_deref(), Some("http://h:1"));
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_parse_mock_backend_and_bare_log_flag() {
        let args = Args::parse_from(["wtl-live", "mock-backend", "--log"]);
        assert_eq!(args.command, Command::MockBackend { port: 8188 });
        assert_eq!(args.log_file, Some(None));

        let args = Args::parse_from(["wtl-live", "mock-backend", "--port", "0"]);
        assert_eq!(args.command, Command::MockBackend { port: 0 });
    }
}
