//! ClientRelay: forwards captured key codes to the server.
//!
//! Two threads cooperate while the relay runs:
//!
//! ```text
//! caller thread (capture loop)              keyfwd-net (network worker)
//! ────────────────────────────              ───────────────────────────
//! source.receive()  ──try_send(code)──▶     recv() → seal_key → send_frame
//!   ... repeats ...      (rendezvous,         ... repeats ...
//!                         drops if busy)
//! receive() == None ──send(Stop)──────▶     recv() → Stop → drop transport
//! join(worker)
//! ```
//!
//! The handoff is a zero-capacity `sync_channel` used with `try_send`: a code
//! is only accepted if the worker is idle and waiting for it.  While the worker
//! is still encrypting or sending the previous code, new codes are dropped and
//! counted in [`RelayStats`].  The capture path never blocks on the network,
//! which matters because the OS input subsystem it is fed from cannot tolerate
//! callback latency.
//!
//! Shutdown is sequential: `stop()` cancels the key source, the capture loop
//! unwinds, and only then is the worker told to stop.  There is no timeout on
//! that last step; it waits for an in-flight send to finish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;

use keyfwd_core::{seal_key, ClientConfig, CryptoChannel, KeyCode, Relay, RelayState, StateCell};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::infrastructure::key_capture::{CaptureError, KeySource};
use crate::infrastructure::network::{FrameTransport, NetworkError, UdpFrameTransport};

/// Error type returned by [`ClientRelay::start`].
#[derive(Debug, Error)]
pub enum ClientRelayError {
    /// `start()` was called on a relay that is not freshly created.
    #[error("client relay cannot start from state {0:?}")]
    InvalidState(RelayState),
    /// The outbound endpoint could not be opened.
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("failed to spawn network worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
    /// The network worker disappeared while capture was still running.
    #[error("network worker exited unexpectedly")]
    WorkerExited,
    /// The key source failed to start or terminated with an error.
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Messages from the capture loop to the network worker.
#[derive(Debug)]
enum WorkerCommand {
    Forward(KeyCode),
    Stop,
}

/// Counters describing what happened to captured key codes.
#[derive(Debug, Default)]
pub struct RelayStats {
    forwarded: AtomicU64,
    dropped: AtomicU64,
    sent: AtomicU64,
    send_failures: AtomicU64,
}

/// Point-in-time copy of [`RelayStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Codes accepted by the network worker.
    pub forwarded: u64,
    /// Codes dropped because the worker was busy.
    pub dropped: u64,
    /// Frames the transport reported as sent.
    pub sent: u64,
    /// Frames the transport failed to send.
    pub send_failures: u64,
}

impl RelayStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// The client side of keyfwd.
pub struct ClientRelay {
    config: ClientConfig,
    source: Arc<dyn KeySource>,
    state: StateCell,
    stats: Arc<RelayStats>,
}

impl ClientRelay {
    /// Creates a relay in the `Created` state.
    ///
    /// Only codes in `config.forwarded_keys` are forwarded, whatever `source`
    /// lets through.
    pub fn new(config: ClientConfig, source: Arc<dyn KeySource>) -> Self {
        Self {
            config,
            source,
            state: StateCell::new(),
            stats: Arc::new(RelayStats::default()),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Runs the relay with a caller-supplied transport instead of opening a
    /// UDP endpoint.  Otherwise identical to [`Relay::start`].
    ///
    /// # Errors
    ///
    /// See [`ClientRelayError`].
    pub fn start_with_transport<T>(&self, transport: T) -> Result<(), ClientRelayError>
    where
        T: FrameTransport + 'static,
    {
        self.begin()?;
        self.run(transport)
    }

    fn begin(&self) -> Result<(), ClientRelayError> {
        if self.state.transition(RelayState::Created, RelayState::Running) {
            Ok(())
        } else {
            Err(ClientRelayError::InvalidState(self.state.get()))
        }
    }

    fn run<T>(&self, transport: T) -> Result<(), ClientRelayError>
    where
        T: FrameTransport + 'static,
    {
        if self.config.secret.is_empty() {
            warn!("shared secret is empty; key frames are effectively unencrypted");
        }
        let channel = CryptoChannel::new(&self.config.secret);

        let (tx, rx) = mpsc::sync_channel::<WorkerCommand>(0);
        let stats = Arc::clone(&self.stats);
        let worker = thread::Builder::new()
            .name("keyfwd-net".to_string())
            .spawn(move || network_worker(transport, channel, rx, stats));
        let worker = match worker {
            Ok(handle) => handle,
            Err(e) => {
                self.state.set(RelayState::Stopped);
                return Err(ClientRelayError::WorkerSpawn(e));
            }
        };

        info!("starting key capture");
        let outcome = self
            .source
            .start()
            .map_err(ClientRelayError::from)
            .and_then(|()| self.capture_loop(&tx));

        // Releases the platform mechanism when the loop ended on its own.
        self.source.cancel();

        // Sequential handoff: the worker is stopped only after capture unwound.
        if tx.send(WorkerCommand::Stop).is_err() {
            debug!("network worker already gone");
        }
        if worker.join().is_err() {
            error!("network worker panicked");
        }

        self.state.set(RelayState::Stopped);
        info!("client relay stopped ({:?})", self.stats.snapshot());
        outcome
    }

    fn capture_loop(&self, tx: &SyncSender<WorkerCommand>) -> Result<(), ClientRelayError> {
        while let Some(code) = self.source.receive()? {
            if !self.config.forwarded_keys.contains(code) {
                debug!("key {code} is not forwarded; ignored");
                continue;
            }
            match tx.try_send(WorkerCommand::Forward(code)) {
                Ok(()) => {
                    self.stats.forwarded.fetch_add(1, Ordering::Relaxed);
                    debug!("captured key {code}");
                }
                Err(TrySendError::Full(_)) => {
                    self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!("network worker busy; dropped key {code}");
                }
                Err(TrySendError::Disconnected(_)) => return Err(ClientRelayError::WorkerExited),
            }
        }
        debug!("key capture cancelled");
        Ok(())
    }
}

impl Relay for ClientRelay {
    type Error = ClientRelayError;

    /// Opens the UDP endpoint to `hostname:port`, then captures and forwards
    /// keys until [`stop`](Relay::stop) is called or the key source fails.
    fn start(&self) -> Result<(), ClientRelayError> {
        self.begin()?;
        let transport = match UdpFrameTransport::connect(&self.config.hostname, self.config.port) {
            Ok(transport) => transport,
            Err(e) => {
                self.state.set(RelayState::Stopped);
                return Err(e.into());
            }
        };
        self.run(transport)
    }

    fn stop(&self) {
        if self.state.transition(RelayState::Running, RelayState::Stopping) {
            info!("stopping key capture");
            self.source.cancel();
        }
    }

    fn state(&self) -> RelayState {
        self.state.get()
    }
}

/// Body of the `keyfwd-net` thread.  Owns the transport and the channel for
/// its whole lifetime.
fn network_worker<T: FrameTransport>(
    mut transport: T,
    channel: CryptoChannel,
    commands: Receiver<WorkerCommand>,
    stats: Arc<RelayStats>,
) {
    while let Ok(command) = commands.recv() {
        let code = match command {
            WorkerCommand::Forward(code) => code,
            WorkerCommand::Stop => break,
        };

        let frame = match seal_key(&channel, code) {
            Ok(frame) => frame,
            Err(e) => {
                error!("failed to encode key {code}: {e}");
                continue;
            }
        };
        match transport.send_frame(&frame) {
            Ok(()) => {
                stats.sent.fetch_add(1, Ordering::Relaxed);
                info!("sent key {code} to remote host");
            }
            Err(e) => {
                stats.send_failures.fetch_add(1, Ordering::Relaxed);
                error!("failed to send key {code}: {e}");
            }
        }
    }
    drop(transport);
    debug!("network worker stopped; endpoint released");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::key_capture::mock::MockKeySource;
    use keyfwd_core::{open_frame, ForwardedKeySet, SharedSecret};
    use std::io;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Records every frame; optionally fails every send.
    #[derive(Clone, Default)]
    struct RecordingTransport {
        frames: Arc<Mutex<Vec<Vec<u8>>>>,
        should_fail: bool,
    }

    impl FrameTransport for RecordingTransport {
        fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
            if self.should_fail {
                return Err(io::Error::new(io::ErrorKind::Other, "injected failure"));
            }
            self.frames.lock().unwrap().push(frame.to_vec());
            Ok(())
        }
    }

    fn config() -> ClientConfig {
        ClientConfig {
            hostname: "127.0.0.1".to_string(),
            port: 9,
            secret: SharedSecret::from("s3cr3t"),
            forwarded_keys: ForwardedKeySet::new([KeyCode(174)]),
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn spawn_relay(
        relay: &Arc<ClientRelay>,
        transport: RecordingTransport,
    ) -> thread::JoinHandle<Result<(), ClientRelayError>> {
        let relay = Arc::clone(relay);
        let handle = thread::spawn(move || relay.start_with_transport(transport));
        // Let the worker reach its first recv() so the first handoff succeeds.
        thread::sleep(Duration::from_millis(100));
        handle
    }

    #[test]
    fn test_forwarded_key_is_sealed_and_sent() {
        // Arrange
        let source = Arc::new(MockKeySource::new(ForwardedKeySet::new([KeyCode(174)])));
        let relay = Arc::new(ClientRelay::new(config(), source.clone()));
        let transport = RecordingTransport::default();
        let frames = Arc::clone(&transport.frames);
        let handle = spawn_relay(&relay, transport);

        // Act
        source.press(KeyCode(174));
        wait_for(|| relay.stats().sent == 1);
        relay.stop();
        let result = handle.join().expect("relay thread panicked");

        // Assert
        assert!(result.is_ok());
        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        let channel = CryptoChannel::new(&SharedSecret::from("s3cr3t"));
        assert_eq!(open_frame(&channel, &frames[0]).unwrap(), KeyCode(174));
        assert_eq!(relay.state(), RelayState::Stopped);
    }

    #[test]
    fn test_unforwarded_keys_never_reach_transport() {
        let source = Arc::new(MockKeySource::new(ForwardedKeySet::new([KeyCode(0xAE)])));
        let relay = Arc::new(ClientRelay::new(config(), source.clone()));
        let transport = RecordingTransport::default();
        let frames = Arc::clone(&transport.frames);
        let handle = spawn_relay(&relay, transport);

        for raw in [0x41, 0xAD, 0xAF, 0xB3] {
            source.press(KeyCode(raw));
        }
        thread::sleep(Duration::from_millis(200));
        relay.stop();
        handle.join().unwrap().unwrap();

        assert!(frames.lock().unwrap().is_empty());
        assert_eq!(relay.stats(), StatsSnapshot::default());
    }

    #[test]
    fn test_config_key_set_filters_codes_the_source_lets_through() {
        // Arrange: the source passes every media key, the config only 174.
        let source = Arc::new(MockKeySource::new(ForwardedKeySet::media_keys()));
        let relay = Arc::new(ClientRelay::new(config(), source.clone()));
        let transport = RecordingTransport::default();
        let frames = Arc::clone(&transport.frames);
        let handle = spawn_relay(&relay, transport);

        // Act
        source.press(KeyCode::VOLUME_UP);
        source.press(KeyCode::VOLUME_DOWN);
        wait_for(|| relay.stats().sent == 1);
        relay.stop();
        handle.join().unwrap().unwrap();

        // Assert
        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        let channel = CryptoChannel::new(&SharedSecret::from("s3cr3t"));
        assert_eq!(open_frame(&channel, &frames[0]).unwrap(), KeyCode::VOLUME_DOWN);
        assert_eq!(relay.stats().forwarded, 1);
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let source = Arc::new(MockKeySource::new(ForwardedKeySet::media_keys()));
        let relay = ClientRelay::new(config(), source.clone());

        relay.stop();

        assert_eq!(relay.state(), RelayState::Created);
        assert!(!source.is_cancelled());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let source = Arc::new(MockKeySource::new(ForwardedKeySet::media_keys()));
        let relay = Arc::new(ClientRelay::new(config(), source.clone()));
        let handle = spawn_relay(&relay, RecordingTransport::default());

        relay.stop();
        relay.stop();
        handle.join().unwrap().unwrap();
        relay.stop();

        assert_eq!(relay.state(), RelayState::Stopped);
    }

    #[test]
    fn test_second_start_is_rejected() {
        let source = Arc::new(MockKeySource::new(ForwardedKeySet::media_keys()));
        let relay = Arc::new(ClientRelay::new(config(), source.clone()));
        let handle = spawn_relay(&relay, RecordingTransport::default());

        let second = relay.start_with_transport(RecordingTransport::default());
        relay.stop();
        handle.join().unwrap().unwrap();

        assert!(matches!(
            second,
            Err(ClientRelayError::InvalidState(RelayState::Running))
        ));
    }

    #[test]
    fn test_capture_start_failure_is_returned_and_worker_stopped() {
        // Arrange
        let source = Arc::new(MockKeySource::new(ForwardedKeySet::media_keys()));
        source.fail_next_start();
        let relay = ClientRelay::new(config(), source.clone());

        // Act
        let result = relay.start_with_transport(RecordingTransport::default());

        // Assert
        assert!(matches!(
            result,
            Err(ClientRelayError::Capture(CaptureError::HookInstallFailed(_)))
        ));
        assert_eq!(relay.state(), RelayState::Stopped);
    }

    #[test]
    fn test_feed_failure_ends_start_with_capture_error() {
        let source = Arc::new(MockKeySource::new(ForwardedKeySet::media_keys()));
        let relay = Arc::new(ClientRelay::new(config(), source.clone()));
        let handle = spawn_relay(&relay, RecordingTransport::default());

        source.close_feed();
        let result = handle.join().unwrap();

        assert!(matches!(
            result,
            Err(ClientRelayError::Capture(CaptureError::FeedClosed))
        ));
        assert_eq!(relay.state(), RelayState::Stopped);
    }

    #[test]
    fn test_send_failures_are_counted_not_fatal() {
        let source = Arc::new(MockKeySource::new(ForwardedKeySet::new([KeyCode(174)])));
        let relay = Arc::new(ClientRelay::new(config(), source.clone()));
        let transport = RecordingTransport {
            should_fail: true,
            ..Default::default()
        };
        let handle = spawn_relay(&relay, transport);

        source.press(KeyCode(174));
        wait_for(|| relay.stats().send_failures == 1);
        assert_eq!(relay.state(), RelayState::Running);
        relay.stop();

        assert!(handle.join().unwrap().is_ok());
    }

    #[test]
    fn test_unresolvable_host_fails_start_and_stops_relay() {
        let source = Arc::new(MockKeySource::new(ForwardedKeySet::media_keys()));
        let relay = ClientRelay::new(
            ClientConfig {
                hostname: "no-such-host.invalid".to_string(),
                ..config()
            },
            source.clone(),
        );

        let result = relay.start();

        assert!(matches!(result, Err(ClientRelayError::Network(_))));
        assert_eq!(relay.state(), RelayState::Stopped);
        assert_eq!(source.start_count(), 0, "capture must not start without an endpoint");
    }
}
