//! The channel trait and the frame-side endpoint.
//!
//! The host talks to a frame through a [`FrameChannel`]; the frame agent
//! talks back through a [`FrameSender`] and reads host messages from a
//! [`FrameEndpoint`]. Both directions cross an untrusted JSON boundary:
//! inbound values that fail to decode are logged and dropped, never fatal.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use liveproof_core::error::ChannelError;
use liveproof_core::ids::PageId;
use liveproof_core::message::{FrameMessage, HostMessage};

/// A duplex pipe to one document frame, addressed by its page id.
///
/// Implementations own the transport (in-memory here; cross-document
/// messaging in a real embedding) and must deliver host messages in send
/// order. They never buffer for an unloaded frame — the host only talks
/// after the frame signals loaded.
#[async_trait]
pub trait FrameChannel: Send + Sync {
    /// The page this channel is bound to.
    fn page(&self) -> &PageId;

    /// Begin receiving. Yields the ordered inbound pipe of frame messages;
    /// wire values that fail to decode have already been dropped.
    async fn start(&self) -> Result<mpsc::Receiver<FrameMessage>, ChannelError>;

    /// Send a message into the frame.
    async fn send(&self, message: HostMessage) -> Result<(), ChannelError>;

    /// Tear the channel down gracefully.
    async fn stop(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// The frame agent's handle for emitting messages to the host.
#[derive(Clone)]
pub struct FrameSender {
    page: PageId,
    outbound: mpsc::UnboundedSender<serde_json::Value>,
}

impl FrameSender {
    pub(crate) fn new(page: PageId, outbound: mpsc::UnboundedSender<serde_json::Value>) -> Self {
        Self { page, outbound }
    }

    pub fn page(&self) -> &PageId {
        &self.page
    }

    /// Emit a message to the host. A closed pipe means the host went away;
    /// the frame has nothing useful to do about that, so it is dropped.
    pub fn send(&self, message: FrameMessage) {
        match serde_json::to_value(&message) {
            Ok(value) => self.send_value(value),
            Err(err) => warn!(page = %self.page, error = %err, "Failed to encode frame message"),
        }
    }

    /// Emit a raw wire value. This is the untrusted boundary a hostile or
    /// out-of-date frame would cross; tests use it to exercise tolerance.
    pub fn send_value(&self, value: serde_json::Value) {
        if self.outbound.send(value).is_err() {
            warn!(page = %self.page, "Host side of channel is gone");
        }
    }
}

/// The frame agent's inbound mailbox of host messages.
pub struct FrameEndpoint {
    page: PageId,
    inbound: mpsc::Receiver<serde_json::Value>,
    outbound: mpsc::UnboundedSender<serde_json::Value>,
}

impl FrameEndpoint {
    pub(crate) fn new(
        page: PageId,
        inbound: mpsc::Receiver<serde_json::Value>,
        outbound: mpsc::UnboundedSender<serde_json::Value>,
    ) -> Self {
        Self {
            page,
            inbound,
            outbound,
        }
    }

    pub fn page(&self) -> &PageId {
        &self.page
    }

    /// A cloneable handle for emitting frame messages to the host.
    pub fn sender(&self) -> FrameSender {
        FrameSender::new(self.page.clone(), self.outbound.clone())
    }

    /// Await the next decodable host message. Undecodable values are
    /// logged and skipped. `None` means the host closed the channel.
    pub async fn recv(&mut self) -> Option<HostMessage> {
        while let Some(value) = self.inbound.recv().await {
            match HostMessage::from_value(value) {
                Ok(message) => return Some(message),
                Err(err) => {
                    warn!(page = %self.page, error = %err, "Dropping inbound host message");
                }
            }
        }
        None
    }

    /// Drain without waiting; `None` when the mailbox is currently empty.
    pub fn try_recv(&mut self) -> Option<HostMessage> {
        while let Ok(value) = self.inbound.try_recv() {
            match HostMessage::from_value(value) {
                Ok(message) => return Some(message),
                Err(err) => {
                    warn!(page = %self.page, error = %err, "Dropping inbound host message");
                }
            }
        }
        None
    }
}
