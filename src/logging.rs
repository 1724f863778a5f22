//! Logging abstraction
//!
//! Provides leveled logging macros that work across targets:
//! - Embedded (`defmt` feature): forwards to `defmt` (RTT transport in the binary)
//! - Host tests: prints with a level prefix
//! - Host non-test: type-checked no-op
//!
//! Format strings must stay within the subset shared by `defmt` and
//! `core::fmt` (`{}`, `{:?}`, `{:02X}`).

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[DEBUG] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[INFO] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[WARN] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        eprintln!("[ERROR] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Direction tag for wire-level frame traces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Rx,
    Tx,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Rx => "RX",
            Direction::Tx => "TX",
        }
    }
}

/// Hex-dump one complete frame as it crossed the wire.
///
/// `length` is the on-wire length field (code byte + payload).
pub fn trace_frame(
    direction: Direction,
    timestamp_ms: u64,
    length: u16,
    code: u8,
    payload: &[u8],
    checksum: u8,
) {
    #[cfg(feature = "defmt")]
    defmt::debug!(
        "[{}] BM83: {}: AA {:04X} {:02X} {:02X} {:02X}",
        timestamp_ms,
        direction.as_str(),
        length,
        code,
        payload,
        checksum
    );

    #[cfg(all(not(feature = "defmt"), test))]
    println!(
        "[DEBUG] [{}] BM83: {}: AA {:04X} {:02X} {:02X?} {:02X}",
        timestamp_ms,
        direction.as_str(),
        length,
        code,
        payload,
        checksum
    );

    #[cfg(all(not(feature = "defmt"), not(test)))]
    let _ = (direction, timestamp_ms, length, code, payload, checksum);
}
