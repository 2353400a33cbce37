//! In-process frame channel over tokio mpsc.
//!
//! Both directions move `serde_json::Value`, not typed messages: the
//! encode/decode step happens at each end exactly as it would across a
//! real document boundary, so protocol tolerance is exercised even in
//! tests and the demo driver.

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use liveproof_core::error::ChannelError;
use liveproof_core::ids::PageId;
use liveproof_core::message::{FrameMessage, HostMessage};

use crate::duplex::{FrameChannel, FrameEndpoint};

/// Host side of an in-memory duplex pipe to one frame.
pub struct MemoryFrameChannel {
    page: PageId,
    capacity: usize,
    to_frame: mpsc::Sender<serde_json::Value>,
    from_frame: Mutex<Option<mpsc::UnboundedReceiver<serde_json::Value>>>,
}

/// Create a connected (host side, frame side) pair for `page`.
///
/// `capacity` bounds the host→frame pipe; the frame→host direction is
/// unbounded because frame emissions happen inside synchronous event
/// handlers that cannot await.
pub fn memory_channel(page: PageId, capacity: usize) -> (MemoryFrameChannel, FrameEndpoint) {
    let (to_frame_tx, to_frame_rx) = mpsc::channel(capacity);
    let (from_frame_tx, from_frame_rx) = mpsc::unbounded_channel();

    let host = MemoryFrameChannel {
        page: page.clone(),
        capacity,
        to_frame: to_frame_tx,
        from_frame: Mutex::new(Some(from_frame_rx)),
    };
    let frame = FrameEndpoint::new(page, to_frame_rx, from_frame_tx);
    (host, frame)
}

#[async_trait]
impl FrameChannel for MemoryFrameChannel {
    fn page(&self) -> &PageId {
        &self.page
    }

    async fn start(&self) -> Result<mpsc::Receiver<FrameMessage>, ChannelError> {
        let mut raw = self
            .from_frame
            .lock()
            .await
            .take()
            .ok_or_else(|| ChannelError::Closed(self.page.to_string()))?;

        // Decode inbound values off-pipe so the receiver only ever sees
        // well-formed messages; bad values are dropped here.
        let (tx, rx) = mpsc::channel(self.capacity);
        let page = self.page.clone();
        tokio::spawn(async move {
            while let Some(value) = raw.recv().await {
                match FrameMessage::from_value(value) {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            break; // Host receiver dropped
                        }
                    }
                    Err(err) => {
                        warn!(page = %page, error = %err, "Dropping inbound frame message");
                    }
                }
            }
            debug!(page = %page, "Frame channel drained");
        });

        Ok(rx)
    }

    async fn send(&self, message: HostMessage) -> Result<(), ChannelError> {
        let value = serde_json::to_value(&message).map_err(|err| ChannelError::DeliveryFailed {
            page: self.page.to_string(),
            reason: err.to_string(),
        })?;
        self.to_frame
            .send(value)
            .await
            .map_err(|_| ChannelError::Closed(self.page.to_string()))
    }
}
