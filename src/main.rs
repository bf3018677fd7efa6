//! HTTP server for the ledger exchange (REST).
//!
//! Configuration comes from the environment; see [`ledger_exchange::config`].

use ledger_exchange::{api, Clock, Exchange, FilePersistence, ServerConfig, SystemClock};
use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let _ = env_logger::try_init();
    let config = ServerConfig::from_env();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let exchange = match &config.state_path {
        Some(path) => match Exchange::open(FilePersistence::new(path), clock) {
            Ok(ex) => ex,
            Err(e) => {
                error!("cannot open ledger state path={} error={}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Exchange::with_clock(clock),
    };
    let app = api::create_router(Arc::new(exchange));

    let addr = config.listen_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("bind failed addr={} error={}", addr, e);
            std::process::exit(1);
        }
    };
    info!("listening on http://{}", addr);
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("server stopped error={}", e);
        std::process::exit(1);
    }
}
