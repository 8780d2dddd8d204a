//! TCP transport implementation
//!
//! Raw TCP with length-prefixed framing for message boundaries. Each frame
//! is preceded by a 4-byte big-endian length prefix.

use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender, TransportServer};

/// Maximum frame size (64KB)
const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Channel buffer size for TCP connections
const CHANNEL_BUFFER_SIZE: usize = 1000;

/// TCP configuration
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Maximum frame size in bytes
    pub max_frame_size: usize,
    /// Keep-alive interval in seconds (0 = disabled)
    pub keepalive_secs: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            keepalive_secs: 30,
        }
    }
}

/// TCP transport (client side)
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self {
            config: TcpConfig::default(),
        }
    }

    pub fn with_config(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Connect to a TCP server
    pub async fn connect(&self, addr: &str) -> Result<(TcpSender, TcpReceiver)> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        if self.config.keepalive_secs > 0 {
            let socket = socket2::SockRef::from(&stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(std::time::Duration::from_secs(self.config.keepalive_secs));
            let _ = socket.set_tcp_keepalive(&keepalive);
        }

        info!("TCP connected to {}", addr);
        Ok(spawn_connection(stream, self.config.max_frame_size))
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire a stream into sender/receiver halves backed by an io task.
fn spawn_connection(stream: TcpStream, max_frame_size: usize) -> (TcpSender, TcpReceiver) {
    let connected = Arc::new(Mutex::new(true));
    let (outgoing_tx, outgoing_rx) = mpsc::channel::<Bytes>(CHANNEL_BUFFER_SIZE);
    let (incoming_tx, incoming_rx) = mpsc::channel::<TransportEvent>(CHANNEL_BUFFER_SIZE);

    let sender = TcpSender {
        tx: outgoing_tx,
        connected: connected.clone(),
    };
    let receiver = TcpReceiver { rx: incoming_rx };

    tokio::spawn(async move {
        let (reader, writer) = stream.into_split();
        drive_io(reader, writer, outgoing_rx, incoming_tx, max_frame_size, connected).await;
    });

    (sender, receiver)
}

/// Shared IO loop for TCP connections
async fn drive_io(
    mut reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    mut outgoing_rx: mpsc::Receiver<Bytes>,
    incoming_tx: mpsc::Sender<TransportEvent>,
    max_frame_size: usize,
    connected: Arc<Mutex<bool>>,
) {
    let mut read_buf = BytesMut::with_capacity(8192);

    loop {
        tokio::select! {
            outgoing = outgoing_rx.recv() => {
                match outgoing {
                    Some(data) => {
                        let mut frame = BytesMut::with_capacity(4 + data.len());
                        frame.put_u32(data.len() as u32);
                        frame.extend_from_slice(&data);

                        if let Err(e) = writer.write_all(&frame).await {
                            error!("TCP write error: {}", e);
                            break;
                        }
                    }
                    // All sender handles dropped; shut the connection down.
                    None => break,
                }
            }

            result = reader.read_buf(&mut read_buf) => {
                match result {
                    Ok(0) => {
                        debug!("TCP connection closed");
                        let _ = incoming_tx.send(TransportEvent::Disconnected { reason: None }).await;
                        break;
                    }
                    Ok(_) => {
                        while read_buf.len() >= 4 {
                            let len = (&read_buf[..4]).get_u32() as usize;

                            if len > max_frame_size {
                                error!("Frame too large: {} > {}", len, max_frame_size);
                                let _ = incoming_tx.send(TransportEvent::Disconnected {
                                    reason: Some(format!("frame too large: {len}"))
                                }).await;
                                return finish(&connected);
                            }

                            if read_buf.len() >= 4 + len {
                                read_buf.advance(4);
                                let data = read_buf.split_to(len).freeze();
                                if incoming_tx.send(TransportEvent::Data(data)).await.is_err() {
                                    return finish(&connected);
                                }
                            } else {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        error!("TCP read error: {}", e);
                        let _ = incoming_tx.send(TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
        }
    }

    finish(&connected)
}

fn finish(connected: &Arc<Mutex<bool>>) {
    *connected.lock() = false;
}

/// TCP sender for writing frames
pub struct TcpSender {
    tx: mpsc::Sender<Bytes>,
    connected: Arc<Mutex<bool>>,
}

#[async_trait]
impl TransportSender for TcpSender {
    async fn send(&self, data: Bytes) -> Result<()> {
        if !*self.connected.lock() {
            return Err(TransportError::NotConnected);
        }

        self.tx
            .send(data)
            .await
            .map_err(|_| TransportError::SendFailed("channel closed".into()))
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.connected.lock() = false;
        Ok(())
    }
}

/// TCP receiver for reading frames
pub struct TcpReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for TcpReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

/// TCP server for accepting connections
pub struct TcpServer {
    listener: TcpListener,
    config: TcpConfig,
}

impl TcpServer {
    /// Bind to an address and create a new TCP server
    pub async fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, TcpConfig::default()).await
    }

    /// Bind with custom configuration
    pub async fn bind_with_config(addr: &str, config: TcpConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::BindFailed(e.to_string()))?;

        info!("TCP server listening on {}", addr);
        Ok(Self { listener, config })
    }
}

#[async_trait]
impl TransportServer for TcpServer {
    type Sender = TcpSender;
    type Receiver = TcpReceiver;

    async fn accept(&mut self) -> Result<(Self::Sender, Self::Receiver, SocketAddr)> {
        let (stream, peer_addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::AcceptFailed(e.to_string()))?;

        debug!("TCP connection accepted from {}", peer_addr);

        let (sender, receiver) = spawn_connection(stream, self.config.max_frame_size);
        Ok((sender, receiver, peer_addr))
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| TransportError::Other(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        // The listener closes when dropped.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_frames() {
        let mut server = TcpServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        let client = TcpTransport::new();
        let connect = tokio::spawn(async move {
            client.connect(&addr.to_string()).await.unwrap()
        });

        let (server_tx, mut server_rx, _) = server.accept().await.unwrap();
        let (client_tx, mut client_rx) = connect.await.unwrap();

        client_tx.send(Bytes::from_static(b"hello")).await.unwrap();
        match server_rx.recv().await {
            Some(TransportEvent::Data(data)) => assert_eq!(&data[..], b"hello"),
            other => panic!("unexpected event: {other:?}"),
        }

        server_tx.send(Bytes::from_static(b"world")).await.unwrap();
        match client_rx.recv().await {
            Some(TransportEvent::Data(data)) => assert_eq!(&data[..], b"world"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn disconnect_is_reported() {
        let mut server = TcpServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        let client = TcpTransport::new();
        let connect = tokio::spawn(async move {
            client.connect(&addr.to_string()).await.unwrap()
        });

        let (_server_tx, mut server_rx, _) = server.accept().await.unwrap();
        let (client_tx, client_rx) = connect.await.unwrap();

        drop(client_rx);
        client_tx.close().await.unwrap();
        drop(client_tx);

        match server_rx.recv().await {
            Some(TransportEvent::Disconnected { .. }) | None => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
