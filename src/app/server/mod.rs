//! Front server of `serve` and `preview`.

mod forward;
mod routes;
mod state;
mod watcher;

use std::future::IntoFuture;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;
use tracing::{info, warn};

pub use forward::Forwarder;
pub use routes::router;
pub use state::{IndexSource, ServerState, StaticMount};
pub use watcher::watch_plugin_config;

use crate::domain::AppError;
use crate::ports::BundlerProcess;

/// Serve `state` on `port` until SIGINT or SIGTERM, then run [`shutdown`].
pub async fn serve_until_shutdown(
    state: ServerState,
    port: u16,
    mut processes: Vec<BundlerProcess>,
) -> Result<(), AppError> {
    let address = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(err) => {
            shutdown(&mut processes);
            return Err(err.into());
        }
    };
    println!("✅ Server running on http://localhost:{}", port);

    let result = tokio::select! {
        result = axum::serve(listener, router(state)).into_future() => result,
        () = shutdown_signal() => {
            info!("Shutting down");
            Ok(())
        }
    };
    shutdown(&mut processes);
    result.map_err(AppError::from)
}

/// Kill every bundler subprocess, then remove their temporary files.
///
/// Runs after the listener is dropped; in-flight requests are not drained.
pub fn shutdown(processes: &mut [BundlerProcess]) {
    for process in processes.iter_mut() {
        process.kill();
    }
    for process in processes.iter_mut() {
        process.remove_temp_files();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
