use gp_preprocessor::CancellationToken;
use std::process;
use std::thread;
use tracing::{info, warn};

/// Exit status used when the process is interrupted by a signal.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Listen for SIGINT/SIGTERM on a helper thread. The first signal cancels
/// `cancel` so the run stops between batches; a second one exits at once.
pub fn install(cancel: CancellationToken) {
    let spawned = thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Signal handling unavailable: {}", e);
                    return;
                }
            };

            runtime.block_on(wait_for_signal());
            info!("Stop signal received, stopping after the current batch");
            cancel.cancel();

            runtime.block_on(wait_for_signal());
            warn!("Second stop signal received, exiting immediately");
            process::exit(EXIT_INTERRUPTED);
        });

    if let Err(e) = spawned {
        warn!("Failed to start signal listener: {}", e);
    }
}

/// Resolves on SIGINT or SIGTERM. A listener that cannot be registered
/// never resolves rather than reporting a spurious stop.
async fn wait_for_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
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
}
