//! Application-wide constants and compile-time configuration.
//!
//! Queue sizes, field capacities, and protocol limits live here so they
//! can be tuned in one place.

// UART

/// Baud rate of the BM83 UART link.
pub const BT_UART_BAUD: u32 = 115_200;

/// Capacity of the RX byte queue (power of two).
pub const RX_QUEUE_SIZE: usize = 1024;

/// Capacity of the TX byte queue (power of two).
pub const TX_QUEUE_SIZE: usize = 256;

// Frames

/// Largest payload (bytes after the event code) a single inbound frame
/// may carry. Anything longer could never fit in the RX queue anyway.
pub const MAX_FRAME_PAYLOAD: usize = RX_QUEUE_SIZE - 5;

/// Largest outbound command (code byte + parameters).
pub const MAX_COMMAND_LEN: usize = 17;

/// Vendor AT command text limit (bytes after code + database index).
pub const MAX_AT_COMMAND_LEN: usize = 15;

/// Upper bound on notifications raised by one decoded frame.
pub const MAX_NOTIFICATIONS: usize = 4;

// Device records

/// Length of a Bluetooth MAC address.
pub const MAC_ID_LEN: usize = 6;

/// Size of the module's internal link database.
pub const MAX_PAIRED_DEVICES: usize = 8;

/// Friendly-name capacity (bytes).
pub const DEVICE_NAME_LEN: usize = 32;

// Media / call fields

/// Capacity of each metadata field (title, artist, album).
pub const METADATA_FIELD_SIZE: usize = 128;

/// Capacity of the caller-id field.
pub const CALLER_ID_FIELD_SIZE: usize = 32;

// Pairing errors

/// Number of profiles with a pairing-error counter.
pub const PROFILE_COUNT: usize = 4;

/// Counters saturate here.
pub const MAX_PAIRING_ERRORS: u8 = 3;

// Application scheduler (embedded binary)

/// Main loop tick when no UART traffic arrives (ms).
pub const PROCESS_TICK_MS: u64 = 10;

/// How often the application polls the module's link status (ms).
pub const LINK_STATUS_POLL_MS: u64 = 30_000;

// GPIO pin assignments (nRF52840-DK defaults)
//
//   BM83 UART RX   → P0.08
//   BM83 UART TX   → P0.06
//   BM83 RST_N     → P0.27
//   BM83 MFB       → P0.26
