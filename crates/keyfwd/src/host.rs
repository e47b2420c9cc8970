//! Runs a [`Relay`] until it stops by itself or a shutdown signal arrives.
//!
//! `Relay::start` blocks for the relay's whole lifetime, so it runs on the
//! blocking thread pool while the async side waits for the shutdown future.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use keyfwd_core::Relay;
use tracing::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Starts `relay` and calls [`Relay::stop`] once `shutdown` resolves.
///
/// Returns when `start()` returns, propagating its error.
pub async fn run_until<R, F>(relay: Arc<R>, shutdown: F) -> anyhow::Result<()>
where
    R: Relay + 'static,
    F: Future<Output = ()>,
{
    let mut worker = {
        let relay = Arc::clone(&relay);
        tokio::task::spawn_blocking(move || relay.start())
    };

    tokio::select! {
        finished = &mut worker => {
            return finished.context("relay task panicked")?.map_err(anyhow::Error::from);
        }
        () = shutdown => {
            info!("shutdown signal received");
            relay.stop();
        }
    }

    worker.await.context("relay task panicked")??;
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM on Unix.
///
/// The SIGTERM handler is installed when this is called, not when the future
/// is first polled.  A signal whose handler cannot be installed is logged and
/// never fires.
pub fn shutdown_signal() -> impl Future<Output = ()> {
    #[cfg(unix)]
    let terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!("cannot listen for SIGTERM: {e}");
            None
        }
    };

    async move {
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("cannot listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            if let Some(mut stream) = terminate {
                if stream.recv().await.is_some() {
                    return;
                }
            }
            std::future::pending::<()>().await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = interrupt => info!("interrupt received"),
            () = terminate => info!("SIGTERM received"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyfwd_core::{RelayState, StateCell};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("fake start failure")]
    struct FakeError;

    /// Blocks in `start()` until `stop()`, or fails immediately.
    struct FakeRelay {
        state: StateCell,
        stop_requested: AtomicBool,
        fail: bool,
    }

    impl FakeRelay {
        fn new(fail: bool) -> Self {
            Self {
                state: StateCell::new(),
                stop_requested: AtomicBool::new(false),
                fail,
            }
        }
    }

    impl Relay for FakeRelay {
        type Error = FakeError;

        fn start(&self) -> Result<(), FakeError> {
            if self.fail {
                self.state.set(RelayState::Stopped);
                return Err(FakeError);
            }
            self.state.transition(RelayState::Created, RelayState::Running);
            while !self.stop_requested.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
            self.state.set(RelayState::Stopped);
            Ok(())
        }

        fn stop(&self) {
            self.stop_requested.store(true, Ordering::SeqCst);
            self.state.transition(RelayState::Running, RelayState::Stopping);
        }

        fn state(&self) -> RelayState {
            self.state.get()
        }
    }

    #[tokio::test]
    async fn test_shutdown_future_stops_relay() {
        // Arrange
        let relay = Arc::new(FakeRelay::new(false));

        // Act
        let result = run_until(
            Arc::clone(&relay),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(relay.state(), RelayState::Stopped);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_stops_relay() {
        // Arrange
        let relay = Arc::new(FakeRelay::new(false));
        let shutdown = shutdown_signal();

        // Act
        let status = std::process::Command::new("sh")
            .args(["-c", &format!("kill -TERM {}", std::process::id())])
            .status()
            .expect("run kill");
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_until(Arc::clone(&relay), shutdown),
        )
        .await;

        // Assert
        assert!(status.success());
        assert!(result.expect("SIGTERM should end the relay").is_ok());
        assert_eq!(relay.state(), RelayState::Stopped);
    }

    #[tokio::test]
    async fn test_start_error_is_returned_without_shutdown() {
        let relay = Arc::new(FakeRelay::new(true));

        let result = run_until(Arc::clone(&relay), std::future::pending::<()>()).await;

        let err = result.expect_err("start failure should propagate");
        assert_eq!(err.to_string(), "fake start failure");
    }
}
