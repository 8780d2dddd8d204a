//! In-memory transport
//!
//! Channel-backed transport for tests and same-process embedding. A
//! [`MemoryServer`] accepts peers injected through its [`MemoryConnector`]
//! handle; each connect call produces a fully wired duplex pair.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender, TransportServer};

/// Channel buffer size for in-memory connections
const CHANNEL_BUFFER_SIZE: usize = 256;

/// One end of an in-memory duplex connection
pub struct MemorySender {
    tx: mpsc::Sender<TransportEvent>,
    connected: Arc<AtomicBool>,
}

#[async_trait]
impl TransportSender for MemorySender {
    async fn send(&self, data: Bytes) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }

        self.tx
            .send(TransportEvent::Data(data))
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<()> {
        if self.connected.swap(false, Ordering::SeqCst) {
            let _ = self
                .tx
                .send(TransportEvent::Disconnected { reason: None })
                .await;
        }
        Ok(())
    }
}

/// Receiving end of an in-memory duplex connection
pub struct MemoryReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for MemoryReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

/// Build a connected pair of (sender, receiver) ends.
///
/// Frames sent on either end arrive at the other; closing one end is
/// observed by both.
pub fn duplex() -> ((MemorySender, MemoryReceiver), (MemorySender, MemoryReceiver)) {
    let connected = Arc::new(AtomicBool::new(true));
    let (a_tx, a_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let (b_tx, b_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

    let left = (
        MemorySender {
            tx: b_tx,
            connected: connected.clone(),
        },
        MemoryReceiver { rx: a_rx },
    );
    let right = (
        MemorySender {
            tx: a_tx,
            connected,
        },
        MemoryReceiver { rx: b_rx },
    );
    (left, right)
}

type Accepted = (MemorySender, MemoryReceiver, SocketAddr);

/// In-memory transport server
pub struct MemoryServer {
    accept_rx: mpsc::Receiver<Accepted>,
    addr: SocketAddr,
}

impl MemoryServer {
    /// Create a server and the connector handle used to reach it.
    pub fn new() -> (Self, MemoryConnector) {
        let (accept_tx, accept_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let server = Self {
            accept_rx,
            addr: ([127, 0, 0, 1], 0).into(),
        };
        let connector = MemoryConnector {
            accept_tx,
            next_port: Arc::new(AtomicU16::new(1)),
        };
        (server, connector)
    }
}

#[async_trait]
impl TransportServer for MemoryServer {
    type Sender = MemorySender;
    type Receiver = MemoryReceiver;

    async fn accept(&mut self) -> Result<Accepted> {
        self.accept_rx
            .recv()
            .await
            .ok_or(TransportError::ConnectionClosed)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.addr)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Client-side handle that injects connections into a [`MemoryServer`]
#[derive(Clone)]
pub struct MemoryConnector {
    accept_tx: mpsc::Sender<Accepted>,
    next_port: Arc<AtomicU16>,
}

impl MemoryConnector {
    /// Connect a new peer; returns the peer's end of the duplex pair.
    pub async fn connect(&self) -> Result<(MemorySender, MemoryReceiver)> {
        let (server_end, client_end) = duplex();
        let port = self.next_port.fetch_add(1, Ordering::SeqCst);
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        self.accept_tx
            .send((server_end.0, server_end.1, addr))
            .await
            .map_err(|_| TransportError::ConnectionFailed("server closed".into()))?;

        Ok(client_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplex_round_trip() {
        let ((left_tx, mut left_rx), (right_tx, mut right_rx)) = duplex();

        left_tx.send(Bytes::from_static(b"ping")).await.unwrap();
        match right_rx.recv().await {
            Some(TransportEvent::Data(data)) => assert_eq!(&data[..], b"ping"),
            other => panic!("unexpected event: {other:?}"),
        }

        right_tx.send(Bytes::from_static(b"pong")).await.unwrap();
        match left_rx.recv().await {
            Some(TransportEvent::Data(data)) => assert_eq!(&data[..], b"pong"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_is_observed_by_peer() {
        let ((left_tx, _left_rx), (right_tx, mut right_rx)) = duplex();

        left_tx.close().await.unwrap();
        assert!(!right_tx.is_connected());
        match right_rx.recv().await {
            Some(TransportEvent::Disconnected { .. }) => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connector_reaches_server() {
        let (mut server, connector) = MemoryServer::new();

        let (client_tx, _client_rx) = connector.connect().await.unwrap();
        let (_server_tx, mut server_rx, addr) = server.accept().await.unwrap();
        assert_eq!(addr.ip(), std::net::IpAddr::from([127, 0, 0, 1]));

        client_tx.send(Bytes::from_static(b"hi")).await.unwrap();
        match server_rx.recv().await {
            Some(TransportEvent::Data(data)) => assert_eq!(&data[..], b"hi"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
