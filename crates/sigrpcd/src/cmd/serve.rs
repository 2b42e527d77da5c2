use std::time::{SystemTime, UNIX_EPOCH};

use sigrpc_backend::RemoteBackend;
use sigrpc_session::{Server, SessionConfig};
use sigrpc_transport::{Endpoint, Listener};
use sigrpc_wire::MessageCodec;
use tracing::info;

use crate::cmd::{shutdown_signal, ServeArgs};
use crate::exit::{transport_error, CliError, CliResult, SUCCESS, USAGE};

pub async fn run(args: ServeArgs) -> CliResult<i32> {
    let listen = endpoint(args.listen_network, &args.listen_addr, "--listen-addr")?;
    let backend = endpoint(args.backend_network, &args.backend_addr, "--backend-addr")?;
    let identity = match args.instance_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => generate_instance_id(),
    };

    let listener = Listener::bind(&listen, args.socket_mode)
        .await
        .map_err(|err| transport_error("bind failed", err))?;

    info!(%backend, identity = %identity, "forwarding to backend");
    let config = SessionConfig {
        timeout: args.session_timeout,
        max_payload: args.max_payload,
    };
    let server = Server::new(
        listener,
        MessageCodec::new(identity),
        RemoteBackend::new(backend),
        config,
    );
    server.serve(shutdown_signal()).await;

    Ok(SUCCESS)
}

fn endpoint(network: sigrpc_transport::Network, address: &str, flag: &str) -> CliResult<Endpoint> {
    if address.trim().is_empty() {
        return Err(CliError::new(USAGE, format!("{flag} must not be empty")));
    }
    Ok(Endpoint::new(network, address))
}

/// Process id plus start time, fixed for the life of the process.
fn generate_instance_id() -> String {
    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("sigrpcd-{}-{started:x}", std::process::id())
}
