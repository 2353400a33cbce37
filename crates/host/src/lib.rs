//! The LiveProof host controller.
//!
//! The host is the trusted side of the editor: it owns the page list and
//! the stencil edit store, registers one channel per rendered frame, and
//! turns inbound frame messages into durable edit state and outbound
//! fan-out. Frames are disposable; everything a frame shows is rebuilt
//! from here after a reload.
//!
//! - **Controller** — message dispatch, selection fan-out, host-initiated
//!   edit operations, broadcasts
//! - **Pages** — page insert/duplicate/delete/move with edit migration

pub mod controller;
pub mod pages;

pub use controller::HostController;
