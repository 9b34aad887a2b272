use serde::{Deserialize, Serialize};

/// Maximum size of a `Message`'s data and a `Packet`'s payload, in bytes.
/// Matches the simulated application layer's message generator.
pub const MAX_DATA_SIZE: usize = 20;

/// The unit of transfer on the simulated channel.
///
/// Both directions use the same shape: data packets (sender to receiver)
/// carry a payload and a constant `ack_num` of 0, acknowledgments (receiver
/// to sender) echo the last delivered payload and carry a constant
/// `seq_num` of 0. The checksum covers the payload plus both numeric
/// fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[derive(Default)]
pub struct Packet {
    /// Sequence number. Raw and never wrapping.
    pub seq_num: u32,
    /// Cumulative acknowledgment number.
    pub ack_num: u32,
    /// 8-bit end-around-carry complement checksum.
    pub checksum: u8,
    /// Application payload (empty on pure acknowledgments that predate the
    /// first successful delivery).
    pub payload: String,
}

impl Packet {
    pub fn new(seq_num: u32, ack_num: u32, checksum: u8, payload: impl Into<String>) -> Self {
        Self {
            seq_num,
            ack_num,
            checksum,
            payload: payload.into(),
        }
    }

    /// Create a packet with an empty payload.
    pub fn new_empty(seq_num: u32, ack_num: u32, checksum: u8) -> Self {
        Self::new(seq_num, ack_num, checksum, String::new())
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
