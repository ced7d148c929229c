//! Decoding of raw inbox messages into executable segments.

mod alias;
mod payload;
mod segment;

pub use alias::*;
pub use payload::*;
pub use segment::*;

use alloy_primitives::{keccak256, Bytes, B256};
use alloy_rlp::Decodable;
use tracing::trace;

use crate::{constants::MAX_BUNDLE_MESSAGES, DecodeError};

/// Splits one raw inbox message into the segments it carries, in the order they must be
/// assembled.
///
/// A heartbeat yields no segment, a bundle yields the segments of its children in order. Any
/// malformed part makes the whole message malformed.
pub fn split_message(raw: &[u8]) -> Result<Vec<MessageSegment>, DecodeError> {
    let message_hash = keccak256(raw);
    let mut segments = Vec::new();
    decode_into(raw, message_hash, false, &mut segments)?;
    trace!(target: "rollup_exec::message", %message_hash, count = segments.len(), "Split message");
    Ok(segments)
}

fn decode_into(
    raw: &[u8],
    message_hash: B256,
    in_bundle: bool,
    segments: &mut Vec<MessageSegment>,
) -> Result<(), DecodeError> {
    let (&tag, payload) = raw.split_first().ok_or(DecodeError::Empty)?;
    let kind = MessageKind::try_from(tag)?;

    let payload = match kind {
        MessageKind::Heartbeat => {
            decode_exact::<HeartbeatPayload>(kind, payload)?;
            return Ok(());
        }
        MessageKind::TxBatch => SegmentPayload::TxBatch(decode_exact(kind, payload)?),
        MessageKind::Deposit => SegmentPayload::Deposit(decode_exact(kind, payload)?),
        MessageKind::L1Call => SegmentPayload::L1Call(decode_exact(kind, payload)?),
        MessageKind::Bundle => {
            if in_bundle {
                return Err(DecodeError::NestedBundle);
            }
            let children: Vec<Bytes> = decode_exact(kind, payload)?;
            if children.len() > MAX_BUNDLE_MESSAGES {
                return Err(DecodeError::TooManyMessages {
                    count: children.len(),
                    limit: MAX_BUNDLE_MESSAGES,
                });
            }
            for child in &children {
                decode_into(child, message_hash, true, segments)?;
            }
            return Ok(());
        }
    };

    let index = segments.len() as u32;
    segments.push(MessageSegment::new(SegmentOrigin::new(message_hash, index), payload));
    Ok(())
}

/// Decodes `T` from `buf`, rejecting leftover bytes.
fn decode_exact<T: Decodable>(kind: MessageKind, mut buf: &[u8]) -> Result<T, DecodeError> {
    let value =
        T::decode(&mut buf).map_err(|source| DecodeError::Rlp { kind: kind as u8, source })?;
    if !buf.is_empty() {
        return Err(DecodeError::TrailingBytes { kind: kind as u8, remaining: buf.len() });
    }
    Ok(value)
}
