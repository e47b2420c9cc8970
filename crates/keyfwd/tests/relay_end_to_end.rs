//! Client relay → datagram → server relay, over loopback UDP.
//!
//! A plain socket stands in for the network and captures the client's
//! datagram, which is then delivered to two servers: one sharing the client's
//! secret and one with a different secret.

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use keyfwd_client::infrastructure::key_capture::mock::MockKeySource;
use keyfwd_client::ClientRelay;
use keyfwd_core::{
    ClientConfig, ForwardedKeySet, KeyCode, Relay, RelayState, ServerConfig, SharedSecret,
    MAX_DATAGRAM_LEN,
};
use keyfwd_server::infrastructure::key_emulation::mock::MockKeySink;
use keyfwd_server::ServerRelay;

fn wait_until(mut condition: impl FnMut() -> bool, what: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

/// Captures the single datagram a client relay sends for one key press.
fn capture_client_datagram(secret: &str, code: KeyCode) -> Vec<u8> {
    let tap = UdpSocket::bind("127.0.0.1:0").expect("bind tap");
    tap.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let port = tap.local_addr().unwrap().port();

    let source = Arc::new(MockKeySource::new(ForwardedKeySet::new([code])));
    let relay = Arc::new(ClientRelay::new(
        ClientConfig {
            hostname: "127.0.0.1".to_string(),
            port,
            secret: SharedSecret::from(secret),
            forwarded_keys: ForwardedKeySet::new([code]),
        },
        source.clone(),
    ));
    let runner = {
        let relay = Arc::clone(&relay);
        thread::spawn(move || relay.start())
    };
    wait_until(|| relay.state() == RelayState::Running, "client to run");
    // Let the network worker block in recv() before the press.
    thread::sleep(Duration::from_millis(100));

    source.press(code);
    let mut buf = [0u8; MAX_DATAGRAM_LEN];
    let (len, _) = tap.recv_from(&mut buf).expect("client datagram");
    relay.stop();
    runner.join().expect("client thread panicked").expect("client stops cleanly");

    buf[..len].to_vec()
}

struct Server {
    relay: Arc<ServerRelay>,
    sink: Arc<MockKeySink>,
    addr: SocketAddr,
    runner: thread::JoinHandle<Result<(), keyfwd_server::ServerRelayError>>,
}

fn start_server(secret: &str) -> Server {
    let sink = Arc::new(MockKeySink::new());
    let relay = Arc::new(ServerRelay::new(
        ServerConfig {
            port: 0,
            secret: SharedSecret::from(secret),
        },
        sink.clone(),
    ));
    let runner = {
        let relay = Arc::clone(&relay);
        thread::spawn(move || relay.start())
    };
    wait_until(|| relay.local_addr().is_some(), "server to bind");
    let port = relay.local_addr().map(|a| a.port()).unwrap_or_default();

    Server {
        relay,
        sink,
        addr: SocketAddr::from(([127, 0, 0, 1], port)),
        runner,
    }
}

impl Server {
    fn stop(self) -> Vec<KeyCode> {
        self.relay.stop();
        self.runner
            .join()
            .expect("server thread panicked")
            .expect("server stops cleanly");
        self.sink.emitted()
    }
}

#[test]
fn test_client_datagram_emits_once_on_matching_server_only() {
    // Arrange
    let datagram = capture_client_datagram("s3cr3t", KeyCode(174));
    let good = start_server("s3cr3t");
    let bad = start_server("wrong");
    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();

    // Act
    sender.send_to(&datagram, good.addr).unwrap();
    sender.send_to(&datagram, bad.addr).unwrap();
    assert!(good.sink.wait_for(1, Duration::from_secs(2)));
    let bad_emitted = bad.sink.wait_for(1, Duration::from_millis(300));
    thread::sleep(Duration::from_millis(100));

    // Assert
    assert!(!bad_emitted);
    assert_eq!(good.stop(), vec![KeyCode(174)]);
    assert!(bad.stop().is_empty());
}

#[test]
fn test_client_sends_directly_to_server() {
    let server = start_server("s3cr3t");
    let source = Arc::new(MockKeySource::new(ForwardedKeySet::media_keys()));
    let client = Arc::new(ClientRelay::new(
        ClientConfig {
            hostname: "127.0.0.1".to_string(),
            port: server.addr.port(),
            secret: SharedSecret::from("s3cr3t"),
            forwarded_keys: ForwardedKeySet::media_keys(),
        },
        source.clone(),
    ));
    let runner = {
        let client = Arc::clone(&client);
        thread::spawn(move || client.start())
    };
    wait_until(|| client.state() == RelayState::Running, "client to run");
    thread::sleep(Duration::from_millis(100));

    source.press(KeyCode::MEDIA_PLAY_PAUSE);
    let emitted = server.sink.wait_for(1, Duration::from_secs(2));
    client.stop();
    runner.join().unwrap().unwrap();

    assert!(emitted);
    assert_eq!(server.stop(), vec![KeyCode::MEDIA_PLAY_PAUSE]);
}
