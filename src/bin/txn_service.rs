#![deny(warnings)]

use prometheus_demo::{
    DynError,
    handler::{AppState, txn},
    metrics::Metrics,
    sim::RandomOutcomes,
};

const PORT: u16 = 8080;
const CARGO_CRATE_NAME: &str = env!("CARGO_CRATE_NAME");

#[tokio::main]
pub async fn main() -> Result<(), DynError> {
    prometheus_demo::init_log::tracing::init(CARGO_CRATE_NAME)?;

    let state = AppState::new(Metrics::new(), Box::new(RandomOutcomes));
    let (server, shutdown_tx) = prometheus_demo::new_server(PORT, txn::build_router(state));
    tokio::spawn(async move {
        if prometheus_demo::wait_signal().await.is_ok() {
            let _ = shutdown_tx.send(()).await;
        }
    });

    log::info!("Starting server on :{PORT}");
    log::info!("Metrics available at http://localhost:{PORT}/metrics");
    if let Err(e) = server.run().await {
        log::error!("server exited: {e}");
        return Err(e.into());
    }
    Ok(())
}
