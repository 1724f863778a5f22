//! Microchip BM83 Bluetooth audio module driver.
//!
//! The module speaks a framed UART protocol (see [`frame`]). This driver
//! is split into:
//!
//! 1. **Frame codec** - pulls complete frames off the RX byte queue and
//!    frames outbound commands onto the TX path.
//! 2. **Event dispatcher** - acknowledges each event and routes it into a
//!    decode routine that updates [`BtState`] and raises [`BtEvent`]s.
//! 3. **Command builders** - construct outbound commands from the current
//!    state.
//!
//! [`Bm83`] ties these together. Call [`Bm83::process`] once per main-loop
//! tick and react to the notifications it returns.

pub mod commands;
pub mod events;
pub mod frame;
pub mod metadata;
pub mod protocol;
pub mod state;

pub use commands::Command;
pub use events::{BtEvent, Notifications};
pub use frame::{Frame, Transmit};
pub use state::{
    ActiveConnection, AvrcpCapabilities, BtState, CallStatus, LinkStatus, LinkType, Metadata,
    MetadataStatus, ModuleStatus, PairedDevice, PairedDevices, PlaybackStatus, PowerState, Profile,
    ScoStatus,
};

use crate::queue::ByteQueue;

/// Protocol engine owning all module state.
#[derive(Debug, Default)]
pub struct Bm83 {
    state: BtState,
}

impl Bm83 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode at most one frame from `rx`, acknowledge it on `tx` and apply
    /// it to the state.
    ///
    /// Returns the notifications raised by that frame. Never blocks: with
    /// noise or a partial frame buffered it returns an empty list and the
    /// next tick carries on.
    pub fn process<const N: usize, T: Transmit>(
        &mut self,
        rx: &mut ByteQueue<N>,
        tx: &mut T,
        now_ms: u64,
    ) -> Notifications {
        let Some(frame) = frame::decode(rx, now_ms) else {
            return Notifications::new();
        };
        events::acknowledge(tx, frame.code, now_ms);
        events::dispatch(&mut self.state, &frame, now_ms)
    }

    /// Frame `command` onto `tx`.
    pub fn send<T: Transmit>(&self, command: &[u8], tx: &mut T, now_ms: u64) {
        frame::encode(tx, command, now_ms);
    }

    pub fn state(&self) -> &BtState {
        &self.state
    }

    /// Mutable state, for command builders with optimistic updates.
    pub fn state_mut(&mut self) -> &mut BtState {
        &mut self.state
    }

    pub fn status(&self) -> &ModuleStatus {
        &self.state.status
    }

    pub fn active_device(&self) -> &ActiveConnection {
        &self.state.active
    }

    pub fn paired_devices(&self) -> &PairedDevices {
        &self.state.paired
    }

    pub fn metadata(&self) -> &Metadata {
        &self.state.metadata
    }

    /// Mark the stored metadata as handed to the application.
    pub fn mark_metadata_current(&mut self) {
        self.state.status.metadata_status = MetadataStatus::Current;
    }

    pub fn caller_id(&self) -> &str {
        self.state.caller_id.as_str()
    }
}
