//! Library interface for bm83-bridge.
//!
//! Holds the whole BM83 protocol engine: the UART byte queue, the frame
//! codec, event dispatch, connection/media state and command builders.
//! Nothing here touches hardware, so it builds and tests on the host.
//!
//! Usage: `cargo test` (host), or for the nRF52840 binary in `main.rs`:
//! `cargo build --release --features embedded --target thumbv7em-none-eabihf`.

#![cfg_attr(not(test), no_std)]

pub mod logging;

pub mod bm83;
pub mod config;
pub mod error;
pub mod queue;

pub use bm83::{Bm83, BtEvent, BtState, Command, Transmit};
pub use error::Error;
pub use queue::ByteQueue;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests - cross-module behaviour
// ═══════════════════════════════════════════════════════════════════════════
