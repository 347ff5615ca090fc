use anyhow::Result;
use tokio_util::sync::CancellationToken;

pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

/// Token cancelled on SIGTERM / Ctrl+C.
pub fn cancel_on_signals() -> CancellationToken {
    let cancel = CancellationToken::new();
    let c = cancel.clone();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(()) => tracing::info!("shutdown: signal received"),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "shutdown: primary waiter failed; falling back to ctrl_c()"
                );
                let _ = tokio::signal::ctrl_c().await;
            }
        }
        c.cancel();
    });
    cancel
}
