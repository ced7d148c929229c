use alloy_primitives::{Bytes, B256};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};

use super::decode_exact;
use crate::{DecodeError, DepositPayload, L1CallPayload, MessageKind, TxBatchPayload};

/// Identity of a segment, kept for diagnostics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, RlpEncodable, RlpDecodable,
)]
#[display("{message_hash}/{index}+{continuation}")]
pub struct SegmentOrigin {
    /// Keccak-256 hash of the raw inbox message the segment was decoded from.
    pub message_hash: B256,
    /// Position of the segment among the segments of its message.
    pub index: u32,
    /// How many times the segment was split because it did not fit a block.
    pub continuation: u32,
}

impl SegmentOrigin {
    /// The origin of segment `index` of the message hashing to `message_hash`.
    pub const fn new(message_hash: B256, index: u32) -> Self {
        Self { message_hash, index, continuation: 0 }
    }

    /// The origin of the remainder of this segment.
    pub const fn next_continuation(self) -> Self {
        Self { continuation: self.continuation + 1, ..self }
    }
}

/// Executable content of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentPayload {
    /// Sequencer transactions.
    TxBatch(TxBatchPayload),
    /// A single L1 deposit.
    Deposit(DepositPayload),
    /// A single L1 contract call.
    L1Call(L1CallPayload),
}

impl SegmentPayload {
    /// The kind of message the payload was decoded from.
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::TxBatch(_) => MessageKind::TxBatch,
            Self::Deposit(_) => MessageKind::Deposit,
            Self::L1Call(_) => MessageKind::L1Call,
        }
    }

    /// The timestamp proposed by the payload.
    pub const fn timestamp(&self) -> u64 {
        match self {
            Self::TxBatch(payload) => payload.timestamp,
            Self::Deposit(payload) => payload.timestamp,
            Self::L1Call(payload) => payload.timestamp,
        }
    }
}

/// A self-contained unit of work producing the contents of one block.
///
/// Segments are single use: assembling one consumes it, and any remainder comes back as a new
/// segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSegment {
    /// Where the segment comes from.
    pub origin: SegmentOrigin,
    /// What the segment carries.
    pub payload: SegmentPayload,
}

impl MessageSegment {
    /// Creates a segment.
    pub const fn new(origin: SegmentOrigin, payload: SegmentPayload) -> Self {
        Self { origin, payload }
    }

    /// Encodes the segment as `kind || rlp(origin) || rlp(payload)`. This is the form the
    /// deferred segment is kept in between blocks.
    pub fn encode(&self) -> Bytes {
        let mut out = vec![self.payload.kind() as u8];
        self.origin.encode(&mut out);
        match &self.payload {
            SegmentPayload::TxBatch(payload) => payload.encode(&mut out),
            SegmentPayload::Deposit(payload) => payload.encode(&mut out),
            SegmentPayload::L1Call(payload) => payload.encode(&mut out),
        }
        out.into()
    }

    /// Decodes a segment produced by [`MessageSegment::encode`].
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let (&tag, mut buf) = raw.split_first().ok_or(DecodeError::Empty)?;
        let kind = MessageKind::try_from(tag)?;
        let origin = SegmentOrigin::decode(&mut buf)
            .map_err(|source| DecodeError::Rlp { kind: tag, source })?;
        let payload = match kind {
            MessageKind::TxBatch => SegmentPayload::TxBatch(decode_exact(kind, buf)?),
            MessageKind::Deposit => SegmentPayload::Deposit(decode_exact(kind, buf)?),
            MessageKind::L1Call => SegmentPayload::L1Call(decode_exact(kind, buf)?),
            MessageKind::Heartbeat | MessageKind::Bundle => {
                return Err(DecodeError::UnknownKind(tag))
            }
        };
        Ok(Self::new(origin, payload))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, Address, U256};

    use super::*;
    use crate::test_utils::user_tx;

    #[test]
    fn test_encoded_segment_decodes_back() {
        let origin = SegmentOrigin::new(B256::repeat_byte(0x11), 2).next_continuation();
        let segment = MessageSegment::new(
            origin,
            SegmentPayload::TxBatch(TxBatchPayload {
                timestamp: 9,
                coinbase: address!("0x000000000000000000000000000000000000c0de"),
                gas_limit: 0,
                txs: vec![user_tx(Address::ZERO, 4, Address::ZERO)],
            }),
        );
        assert_eq!(MessageSegment::decode(&segment.encode()), Ok(segment));

        let deposit = MessageSegment::new(
            SegmentOrigin::new(B256::ZERO, 0),
            SegmentPayload::Deposit(DepositPayload { value: U256::from(3), ..Default::default() }),
        );
        assert_eq!(MessageSegment::decode(&deposit.encode()), Ok(deposit));
    }

    #[test]
    fn test_non_segment_kinds_are_refused() {
        let mut raw = vec![MessageKind::Heartbeat as u8];
        SegmentOrigin::new(B256::ZERO, 0).encode(&mut raw);
        assert_eq!(MessageSegment::decode(&raw), Err(DecodeError::UnknownKind(0x00)));
        assert_eq!(MessageSegment::decode(&[]), Err(DecodeError::Empty));
    }
}
