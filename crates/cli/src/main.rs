use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sipkit_infra_common::{log_welcome, parse_log_level, setup_logging, LoggingConfig};

mod commands;

use commands::Output;

/// Parse and re-encode SIP and SDP text
#[derive(Parser, Debug)]
#[command(name = "sipkit", author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", env = "SIPKIT_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print the parsed structure as JSON instead of its encoding
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an SDP body from FILE or standard input
    Sdp { file: Option<PathBuf> },
    /// Parse a SIP address such as `"Bob" <sip:bob@biloxi.com>`
    Address { text: String },
    /// Parse a sip, sips, tel or generic URI
    Uri { text: String },
    /// Classify a hostname or IP literal
    Host { text: String },
}

fn logging_config(cli: &Cli) -> anyhow::Result<LoggingConfig> {
    let level = parse_log_level(&cli.log_level)?;
    let logging = LoggingConfig::new(level, env!("CARGO_BIN_NAME"));
    Ok(if cli.json_logs { logging.with_json() } else { logging })
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let logging = logging_config(&cli)?;
    let app_name = logging.app_name.clone();
    setup_logging(logging)?;
    log_welcome(&app_name, env!("CARGO_PKG_VERSION"));

    let output = if cli.json { Output::Json } else { Output::Text };
    match cli.command {
        Command::Sdp { file } => {
            let text = commands::read_input(file.as_deref())?;
            commands::sdp(&text, output)
        }
        Command::Address { text } => commands::address(&text, output),
        Command::Uri { text } => commands::uri(&text, output),
        Command::Host { text } => commands::host(&text, output),
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_logging_config_from_flags() {
        let cli = Cli::try_parse_from(["sipkit", "--log-level", "DEBUG", "--json-logs", "host", "::1"]).unwrap();
        let logging = logging_config(&cli).unwrap();
        assert_eq!(logging.level, Level::DEBUG);
        assert_eq!(logging.app_name, "sipkit");
        assert!(logging.json);

        let cli = Cli::try_parse_from(["sipkit", "--log-level", "chatty", "uri", "sip:a@b"]).unwrap();
        assert!(logging_config(&cli).is_err());
    }
}
