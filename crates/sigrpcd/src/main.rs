mod cmd;
mod exit;
mod logging;

use clap::Parser;

use crate::cmd::Command;
use crate::exit::{CliError, INTERNAL};
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "sigrpcd", version, about = "sigrpc local socket proxy daemon")]
struct Cli {
    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))
        .and_then(|runtime| runtime.block_on(cmd::run(cli.command)));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sigrpc_transport::Network;

    use super::*;

    #[test]
    fn parses_serve_flags() {
        let cli = Cli::try_parse_from([
            "sigrpcd",
            "serve",
            "--listen-addr",
            "/tmp/sigrpcd.sock",
            "--backend-addr",
            "127.0.0.1:7070",
            "--session-timeout",
            "5s",
        ])
        .expect("serve args should parse");

        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.listen_network, Network::Unix);
        assert_eq!(args.backend_network, Network::Tcp);
        assert_eq!(args.session_timeout, Duration::from_secs(5));
        assert_eq!(args.socket_mode, 0o600);
        assert_eq!(args.max_payload, sigrpc_session::DEFAULT_MAX_PAYLOAD);
    }

    #[test]
    fn serve_requires_backend_addr() {
        let err = Cli::try_parse_from(["sigrpcd", "serve", "--listen-addr", "/tmp/x.sock"])
            .expect_err("missing backend address should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn rejects_unknown_network() {
        let err = Cli::try_parse_from([
            "sigrpcd",
            "stub",
            "--network",
            "udp",
            "--addr",
            "127.0.0.1:0",
        ])
        .expect_err("udp is not a supported network");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn stub_rejects_zero_rounds() {
        let err = Cli::try_parse_from([
            "sigrpcd",
            "stub",
            "--addr",
            "127.0.0.1:0",
            "--invoke-rounds",
            "0",
        ])
        .expect_err("zero rounds should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
