use clap::{Parser, ValueEnum};
use hana_mcp::commands::{self, Transport};
use hana_mcp::config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hana-mcp")]
#[command(about = "MCP server exposing read-only SQL access to SAP HANA and ODBC databases")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    config: PathBuf,

    /// Transport for serving MCP requests
    #[arg(long, short, value_enum, default_value_t = TransportArg::Stdio)]
    transport: TransportArg,

    /// Host to bind for the SSE transport
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for the SSE transport (defaults to server.http_port from the config)
    #[arg(long, short)]
    port: Option<u16>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TransportArg {
    Stdio,
    Sse,
}

impl From<TransportArg> for Transport {
    fn from(value: TransportArg) -> Self {
        match value {
            TransportArg::Stdio => Transport::Stdio,
            TransportArg::Sse => Transport::Sse,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(config.log_file.as_deref()) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let port = cli.port.unwrap_or(config.server.http_port);

    match commands::serve(config, cli.transport.into(), &cli.host, port).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to the configured file, or stderr; stdout belongs to the stdio
/// transport.
fn init_logging(log_file: Option<&str>) -> std::io::Result<()> {
    let filter = EnvFilter::from_default_env();

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn config_path_is_required() {
        let cli = Cli::try_parse_from(["hana-mcp"]);
        assert!(cli.is_err());
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["hana-mcp", "config.yaml"]).expect("should parse");
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert_eq!(cli.transport, TransportArg::Stdio);
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, None);
    }

    #[test]
    fn sse_transport_with_port() {
        let cli = Cli::try_parse_from([
            "hana-mcp",
            "config.yaml",
            "--transport",
            "sse",
            "--port",
            "9000",
        ])
        .expect("should parse");
        assert_eq!(cli.transport, TransportArg::Sse);
        assert_eq!(cli.port, Some(9000));
    }

    #[test]
    fn invalid_transport_is_rejected() {
        let cli = Cli::try_parse_from(["hana-mcp", "config.yaml", "--transport", "tcp"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidValue);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["hana-mcp", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
