//! Network infrastructure for the client application.
//!
//! The client's only socket is an outbound UDP endpoint "connected" to the
//! server, so every `send` goes to one fixed peer.  UDP gives no delivery,
//! ordering, or duplicate guarantees and the relay adds none: one key press is
//! one datagram, sent once.
//!
//! [`FrameTransport`] is the seam the relay's network worker writes through;
//! tests substitute their own implementation to observe or delay sends.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use thiserror::Error;
use tracing::info;

/// Errors that can occur while opening the outbound endpoint.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// `hostname:port` could not be resolved.
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded but produced no address.
    #[error("{target} did not resolve to any address")]
    NoAddress { target: String },
    /// The local UDP socket could not be bound.
    #[error("failed to bind local UDP socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// The socket could not be associated with the server address.
    #[error("failed to connect UDP socket to {addr}: {source}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Sends complete wire frames, one datagram each.
pub trait FrameTransport: Send {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()>;
}

/// UDP implementation of [`FrameTransport`].
#[derive(Debug)]
pub struct UdpFrameTransport {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl UdpFrameTransport {
    /// Resolves `hostname:port`, binds an ephemeral local port of the matching
    /// address family, and connects to the first resolved address.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] if resolution, bind, or connect fails.
    pub fn connect(hostname: &str, port: u16) -> Result<Self, NetworkError> {
        let target = format!("{hostname}:{port}");
        let remote = (hostname, port)
            .to_socket_addrs()
            .map_err(|source| NetworkError::Resolve {
                target: target.clone(),
                source,
            })?
            .next()
            .ok_or(NetworkError::NoAddress { target })?;

        let local: SocketAddr = if remote.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local)
            .map_err(|source| NetworkError::BindFailed { addr: local, source })?;
        socket
            .connect(remote)
            .map_err(|source| NetworkError::ConnectFailed { addr: remote, source })?;

        info!("sending key frames to UDP {remote}");
        Ok(Self { socket, remote })
    }

    /// The resolved server address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl FrameTransport for UdpFrameTransport {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let written = self.socket.send(frame)?;
        if written != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("datagram truncated: {written} of {} bytes sent", frame.len()),
            ));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_connect_and_send_reaches_listener() {
        // Arrange
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = listener.local_addr().unwrap().port();

        // Act
        let mut transport = UdpFrameTransport::connect("127.0.0.1", port).expect("connect");
        transport.send_frame(b"frame-bytes").expect("send");

        // Assert
        let mut buf = [0u8; 64];
        let (len, src) = listener.recv_from(&mut buf).expect("datagram");
        assert_eq!(&buf[..len], b"frame-bytes");
        assert_eq!(src.port(), transport.local_addr().unwrap().port());
        assert_eq!(transport.remote_addr().port(), port);
    }

    #[test]
    fn test_connect_to_unresolvable_host_fails() {
        let result = UdpFrameTransport::connect("no-such-host.invalid", 9);

        assert!(matches!(
            result,
            Err(NetworkError::Resolve { .. }) | Err(NetworkError::NoAddress { .. })
        ));
    }
}
