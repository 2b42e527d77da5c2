use sigrpc_backend::{StubConfig, StubServer};
use sigrpc_transport::Endpoint;
use tracing::info;

use crate::cmd::{shutdown_signal, StubArgs};
use crate::exit::{backend_error, CliError, CliResult, SUCCESS, USAGE};

pub async fn run(args: StubArgs) -> CliResult<i32> {
    if args.addr.trim().is_empty() {
        return Err(CliError::new(USAGE, "--addr must not be empty"));
    }
    let endpoint = Endpoint::new(args.network, args.addr);
    let config = StubConfig {
        invoke_rounds: args.invoke_rounds,
        socket_mode: args.socket_mode,
        ..StubConfig::default()
    };

    let server = StubServer::bind(&endpoint, config)
        .await
        .map_err(|err| backend_error("bind failed", err))?;
    let local = server
        .local_endpoint()
        .map_err(|err| backend_error("bind failed", err))?;
    info!(endpoint = %local, "stub backend listening");

    server
        .serve(shutdown_signal())
        .await
        .map_err(|err| backend_error("stub backend failed", err))?;
    Ok(SUCCESS)
}
