//! Unified error type for bm83-bridge.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the protocol engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Commands
    /// A bounded command argument does not fit the frame's fixed payload.
    CommandTooLong { len: usize, max: usize },

    /// Command bytes would overflow the outbound command buffer.
    BufferOverflow,

    // Records
    /// A bounded field received more data than it can hold; the stored
    /// value was cut at the last whole character that fit.
    FieldTruncated,

    /// The paired-device registry has no free slot.
    RegistryFull,

    /// Link database slots are 1-based; slot 0 was supplied.
    InvalidSlot,
}
