//! Message channels between the LiveProof host and its document frames.
//!
//! Each rendered page lives in an isolated frame; the only way state moves
//! between the trusted host and an untrusted frame is a duplex, typed,
//! JSON-valued message pipe. Channels are trait-based so the protocol is
//! testable without a real browser document — the in-memory transport
//! substitutes for cross-document messaging while keeping the same
//! encode/decode boundary.
//!
//! Delivery contract (per frame): at-most-once, in send order, no
//! acknowledgements. There is no ordering guarantee *across* frames.
//!
//! - **Duplex** — the `FrameChannel` trait and frame-side endpoint
//! - **Memory** — in-process transport over tokio mpsc
//! - **Registry** — central frame manager, fan-out, merged inbound stream

pub mod duplex;
pub mod memory;
pub mod registry;

pub use duplex::{FrameChannel, FrameEndpoint, FrameSender};
pub use memory::{MemoryFrameChannel, memory_channel};
pub use registry::FrameRegistry;
