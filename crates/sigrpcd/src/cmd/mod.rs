use std::time::Duration;

use clap::{Args, Subcommand};
use sigrpc_transport::Network;

use crate::exit::CliResult;

pub mod serve;
pub mod stub;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the proxy daemon.
    Serve(ServeArgs),
    /// Run a local stub backend.
    Stub(StubArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args).await,
        Command::Stub(args) => stub::run(args).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Client-facing network (unix or tcp).
    #[arg(long, env = "RPC_CLIENT_NETWORK", default_value = "unix")]
    pub listen_network: Network,
    /// Client-facing socket path or host:port.
    #[arg(long, env = "RPC_CLIENT_ADDR")]
    pub listen_addr: String,
    /// Backend network (unix or tcp).
    #[arg(long, env = "RPC_STUB_NETWORK", default_value = "tcp")]
    pub backend_network: Network,
    /// Backend socket path or host:port.
    #[arg(long, env = "RPC_STUB_ADDR")]
    pub backend_addr: String,
    /// Instance identity prefixed to client ids. Generated when unset.
    #[arg(long, env = "SIGRPCD_INSTANCE_ID")]
    pub instance_id: Option<String>,
    /// Maximum lifetime of one client connection (e.g. 1000s, 500ms, 2m).
    #[arg(long, default_value = "1000s", value_parser = parse_duration)]
    pub session_timeout: Duration,
    /// Largest declared payload accepted from a client, in bytes.
    #[arg(long, default_value_t = sigrpc_session::DEFAULT_MAX_PAYLOAD)]
    pub max_payload: u64,
    /// Permission mode for a Unix listen socket, in octal.
    #[arg(long, default_value = "600", value_parser = parse_mode)]
    pub socket_mode: u32,
}

#[derive(Args, Debug)]
pub struct StubArgs {
    /// Network to listen on (unix or tcp).
    #[arg(long, env = "RPC_STUB_NETWORK", default_value = "tcp")]
    pub network: Network,
    /// Socket path or host:port to listen on.
    #[arg(long, env = "RPC_STUB_ADDR")]
    pub addr: String,
    /// Invoke rounds per invocation; the last one is final.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub invoke_rounds: u32,
    /// Permission mode for a Unix listen socket, in octal.
    #[arg(long, default_value = "600", value_parser = parse_mode)]
    pub socket_mode: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `5s`, `2m` or a bare number of seconds.
fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration: {input}"))?;
    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        _ => Duration::from_secs(value),
    })
}

fn parse_mode(input: &str) -> Result<u32, String> {
    let digits = input.trim().trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8).map_err(|_| format!("invalid octal mode: {input}"))?;
    if mode > 0o777 {
        return Err(format!("mode out of range: {input}"));
    }
    Ok(mode)
}

/// Resolves on SIGINT or SIGTERM.
pub(crate) async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "SIGINT handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
