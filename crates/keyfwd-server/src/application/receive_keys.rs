//! ServerRelay: receives key datagrams and replays them through a [`KeySink`].
//!
//! The relay is strictly sequential.  One thread binds the UDP port and, for
//! every datagram, runs decrypt → decode → emit before reading the next one.
//! Each datagram is independent: there is no session, no sequence tracking,
//! and no per-sender state.  Anyone holding the shared secret is accepted.
//!
//! # Read timeout
//!
//! The socket is configured with a [`RECV_TIMEOUT`] read timeout so that
//! `recv_from` returns at least that often.  On each wake-up the loop checks
//! whether [`Relay::stop`] moved the relay out of `Running`; if so it exits
//! and the socket is closed when `start()` returns.
//!
//! # Failure handling
//!
//! Read errors, frames shorter than the IV, wrong-secret frames, and
//! anything else that does not decode to a `Message` are discarded.  No
//! single datagram can end the loop.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use keyfwd_core::{
    open_frame, CryptoChannel, KeyCode, Relay, RelayState, ServerConfig, StateCell,
    MAX_DATAGRAM_LEN,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::key_emulation::KeySink;

/// Upper bound on how long `stop()` waits for the receive loop to notice.
pub const RECV_TIMEOUT: Duration = Duration::from_millis(500);

/// Error type returned by [`ServerRelay::start`].
#[derive(Debug, Error)]
pub enum ServerRelayError {
    #[error("server relay cannot start from state {0:?}")]
    InvalidState(RelayState),
    /// The inbound UDP port could not be bound.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to configure UDP socket: {0}")]
    SocketSetup(#[source] io::Error),
}

/// The server side of keyfwd.
pub struct ServerRelay {
    config: ServerConfig,
    sink: Arc<dyn KeySink>,
    state: StateCell,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl ServerRelay {
    /// Creates a relay in the `Created` state.  Nothing is bound until
    /// [`Relay::start`].
    pub fn new(config: ServerConfig, sink: Arc<dyn KeySink>) -> Self {
        Self {
            config,
            sink,
            state: StateCell::new(),
            local_addr: Mutex::new(None),
        }
    }

    /// The address the inbound socket is bound to, once `start()` has bound
    /// it.  Useful when the configured port is `0`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self
            .local_addr
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bind(&self) -> Result<(UdpSocket, SocketAddr), ServerRelayError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let socket =
            UdpSocket::bind(addr).map_err(|source| ServerRelayError::BindFailed { addr, source })?;
        socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .map_err(ServerRelayError::SocketSetup)?;
        let bound = socket.local_addr().map_err(ServerRelayError::SocketSetup)?;
        *self
            .local_addr
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(bound);
        Ok((socket, bound))
    }

    fn receive_loop(&self, socket: &UdpSocket, channel: &CryptoChannel) {
        let mut buf = [0u8; MAX_DATAGRAM_LEN];

        while self.state.get() == RelayState::Running {
            let (len, src) = match socket.recv_from(&mut buf) {
                Ok(pair) => pair,
                Err(e) if is_timeout_error(&e) => continue,
                Err(e) => {
                    debug!("recv error: {e}");
                    continue;
                }
            };

            if let Some(code) = process_datagram(channel, &buf[..len]) {
                info!("received key {code} from {}", src.ip());
                self.sink.emit(code);
            } else {
                debug!("discarded {len}-byte datagram from {src}");
            }
        }
    }
}

impl Relay for ServerRelay {
    type Error = ServerRelayError;

    /// Binds `0.0.0.0:port` and replays received keys until `stop()`.
    fn start(&self) -> Result<(), ServerRelayError> {
        if !self.state.transition(RelayState::Created, RelayState::Running) {
            return Err(ServerRelayError::InvalidState(self.state.get()));
        }
        if self.config.secret.is_empty() {
            warn!("shared secret is empty; any peer can forge key frames");
        }
        let channel = CryptoChannel::new(&self.config.secret);

        let (socket, bound) = match self.bind() {
            Ok(pair) => pair,
            Err(e) => {
                self.state.set(RelayState::Stopped);
                return Err(e);
            }
        };
        info!("listening for key frames on UDP {bound}");

        self.receive_loop(&socket, &channel);

        drop(socket);
        self.state.set(RelayState::Stopped);
        info!("server relay stopped");
        Ok(())
    }

    fn stop(&self) {
        if self.state.transition(RelayState::Running, RelayState::Stopping) {
            info!("stopping server relay");
        }
    }

    fn state(&self) -> RelayState {
        self.state.get()
    }
}

/// Opens one received datagram.  `None` for anything that is not a valid
/// frame under `channel`'s key.
pub fn process_datagram(channel: &CryptoChannel, datagram: &[u8]) -> Option<KeyCode> {
    open_frame(channel, datagram).ok()
}

/// Returns `true` for OS timeout / would-block errors that should be retried.
fn is_timeout_error(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
