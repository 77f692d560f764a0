//! Core CAN frame type and J1939 identifier constants.

use chrono::{DateTime, Utc};

// ── J1939 arbitration IDs ───────────────────────────────────────

/// EEC1 from the engine ECU (priority 3, PGN 61444, SA 0x00).
pub const ENGINE_SPEED_ID: u32 = 0x0CF0_0400;

/// VDHR (priority 6, PGN 65217, SA 0x00).
pub const VEHICLE_DISTANCE_ID: u32 = 0x18FE_C100;

/// Acceptance mask ignoring the source address byte.
pub const J1939_PGN_FILTER_MASK: u32 = 0x1FFF_FF00;

/// Hardware filters that let only the tracked PGNs through.
pub const J1939_FILTERS: [CanFilter; 2] = [
    CanFilter::new(ENGINE_SPEED_ID, J1939_PGN_FILTER_MASK),
    CanFilter::new(VEHICLE_DISTANCE_ID, J1939_PGN_FILTER_MASK),
];

// ── CAN Frame ───────────────────────────────────────────────────

/// A raw CAN 2.0B frame as delivered by a frame source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// CAN arbitration ID (29-bit extended for J1939).
    pub id: u32,
    /// Data payload (0–8 bytes).
    pub data: Vec<u8>,
    /// When the frame was received.
    pub timestamp: DateTime<Utc>,
}

impl CanFrame {
    /// Create a frame stamped with the current time.
    pub fn new(id: u32, data: Vec<u8>) -> Self {
        Self::with_timestamp(id, data, Utc::now())
    }

    pub fn with_timestamp(id: u32, data: Vec<u8>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            data,
            timestamp,
        }
    }

    /// Payload as space-separated hex, for logs.
    pub fn hex_data(&self) -> String {
        self.data
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ── Acceptance filter ───────────────────────────────────────────

/// Identifier/mask acceptance filter, SocketCAN semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFilter {
    pub id: u32,
    pub mask: u32,
}

impl CanFilter {
    pub const fn new(id: u32, mask: u32) -> Self {
        Self { id, mask }
    }

    /// A frame passes when its masked ID equals the masked filter ID.
    pub fn matches(&self, id: u32) -> bool {
        id & self.mask == self.id & self.mask
    }
}

/// True when `id` passes at least one filter. An empty set accepts everything.
pub fn passes_filters(filters: &[CanFilter], id: u32) -> bool {
    filters.is_empty() || filters.iter().any(|f| f.matches(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_ignore_source_address() {
        assert!(passes_filters(&J1939_FILTERS, 0x0CF0_0400));
        assert!(passes_filters(&J1939_FILTERS, 0x0CF0_04EE)); // other SA
        assert!(passes_filters(&J1939_FILTERS, 0x18FE_C117));
    }

    #[test]
    fn filters_reject_other_pgns_and_priorities() {
        assert!(!passes_filters(&J1939_FILTERS, 0x18FE_EE00)); // engine temp
        assert!(!passes_filters(&J1939_FILTERS, 0x18F0_0400)); // priority 6 EEC1
        assert!(!passes_filters(&J1939_FILTERS, 0x123));
    }

    #[test]
    fn empty_filter_set_accepts_all() {
        assert!(passes_filters(&[], 0x123));
    }

    #[test]
    fn hex_data_formatting() {
        let frame = CanFrame::new(ENGINE_SPEED_ID, vec![0xFF, 0x06, 0x40]);
        assert_eq!(frame.hex_data(), "FF 06 40");
    }
}
