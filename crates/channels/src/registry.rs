//! Frame registry — manages all active frame channels.
//!
//! Merges inbound messages from every frame into one stream tagged with
//! the source page, and routes outbound messages to the right frame(s).
//! Broadcasts are independent per-frame sends: there is no ordering or
//! atomicity across frames, so anything broadcast must be idempotent.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use liveproof_core::error::ChannelError;
use liveproof_core::ids::PageId;
use liveproof_core::message::{FrameMessage, HostMessage};

use crate::duplex::FrameChannel;

/// Central registry holding the channel for every rendered frame.
pub struct FrameRegistry {
    frames: HashMap<PageId, Arc<dyn FrameChannel>>,
}

impl Default for FrameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            frames: HashMap::new(),
        }
    }

    /// Register the channel for one frame.
    pub fn register(&mut self, channel: Arc<dyn FrameChannel>) {
        let page = channel.page().clone();
        info!(page = %page, "Registered frame channel");
        self.frames.insert(page, channel);
    }

    /// Drop the channel for a frame that no longer exists.
    pub fn unregister(&mut self, page: &PageId) -> Option<Arc<dyn FrameChannel>> {
        self.frames.remove(page)
    }

    pub fn contains(&self, page: &PageId) -> bool {
        self.frames.contains_key(page)
    }

    /// All registered page ids.
    pub fn pages(&self) -> Vec<PageId> {
        self.frames.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Start all frames and merge their inbound streams into one receiver
    /// tagged with the source page. Per-frame order is preserved; order
    /// across frames is arbitrary.
    pub async fn start_all(
        &self,
        capacity: usize,
    ) -> Result<mpsc::Receiver<(PageId, FrameMessage)>, ChannelError> {
        let (merged_tx, merged_rx) = mpsc::channel(capacity);

        for (page, channel) in &self.frames {
            let mut rx = channel.start().await?;
            let tx = merged_tx.clone();
            let page = page.clone();

            tokio::spawn(async move {
                while let Some(message) = rx.recv().await {
                    if tx.send((page.clone(), message)).await.is_err() {
                        break; // Merged receiver dropped
                    }
                }
            });
        }

        Ok(merged_rx)
    }

    /// Send to one frame.
    pub async fn send_to(&self, page: &PageId, message: HostMessage) -> Result<(), ChannelError> {
        let channel = self
            .frames
            .get(page)
            .ok_or_else(|| ChannelError::FrameNotRegistered(page.to_string()))?;
        channel.send(message).await
    }

    /// Send to every frame. Failures are logged per frame and do not stop
    /// the fan-out — a frame mid-reload simply misses an idempotent
    /// message it will re-derive on its next handshake.
    pub async fn broadcast(&self, message: HostMessage) {
        for (page, channel) in &self.frames {
            if let Err(err) = channel.send(message.clone()).await {
                warn!(page = %page, error = %err, "Broadcast send failed");
            }
        }
    }

    /// Stop all frames gracefully.
    pub async fn stop_all(&self) {
        for (page, channel) in &self.frames {
            if let Err(err) = channel.stop().await {
                warn!(page = %page, error = %err, "Failed to stop frame channel");
            }
        }
    }
}
