//! Common test helpers for EVOKE tests
//!
//! - Condition-based waiting (no hardcoded sleeps)
//! - Port allocation
//! - A recording sender that captures emitted frames for assertions

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use evoke_core::Envelope;
use evoke_transport::{TransportError, TransportSender};

/// Default test timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default condition check interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Port Allocation
// ============================================================================

/// Find an available TCP port for testing
pub async fn find_available_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

// ============================================================================
// Condition-Based Waiting
// ============================================================================

/// Wait for a condition with timeout - condition-based, not time-based
pub async fn wait_for<F>(check: F, interval: Duration, max_wait: Duration) -> bool
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < max_wait {
        if check() {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}

/// Wait for an atomic counter to reach a target value
pub async fn wait_for_count(counter: &AtomicU32, target: u32, max_wait: Duration) -> bool {
    wait_for(
        || counter.load(Ordering::SeqCst) >= target,
        DEFAULT_CHECK_INTERVAL,
        max_wait,
    )
    .await
}

/// Wait for a boolean flag to become true
pub async fn wait_for_flag(flag: &AtomicBool, max_wait: Duration) -> bool {
    wait_for(
        || flag.load(Ordering::SeqCst),
        DEFAULT_CHECK_INTERVAL,
        max_wait,
    )
    .await
}

// ============================================================================
// Recording Sender
// ============================================================================

/// A [`TransportSender`] that records every frame instead of delivering it.
///
/// Decodes outbound `[event, envelope]` frames on demand so tests can assert
/// on what a handler addressed where.
#[derive(Clone, Default)]
pub struct RecordingSender {
    frames: Arc<Mutex<Vec<Bytes>>>,
    closed: Arc<AtomicBool>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw recorded frames, in send order.
    pub fn frames(&self) -> Vec<Bytes> {
        self.frames.lock().clone()
    }

    /// Recorded frames decoded as `(event, envelope)` pairs.
    pub fn events(&self) -> Vec<(String, Envelope)> {
        self.frames()
            .iter()
            .filter_map(|frame| decode_outbound(frame))
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.frames.lock().len()
    }
}

fn decode_outbound(frame: &[u8]) -> Option<(String, Envelope)> {
    let wire: serde_json::Value = serde_json::from_slice(frame).ok()?;
    let slots = wire.as_array()?;
    let event = slots.first()?.as_str()?.to_string();
    let envelope = serde_json::from_value(slots.get(1)?.clone()).ok()?;
    Some((event, envelope))
}

#[async_trait]
impl TransportSender for RecordingSender {
    async fn send(&self, data: Bytes) -> evoke_transport::Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        self.frames.lock().push(data);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) -> evoke_transport::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
