//! Wire payloads of inbox messages.
//!
//! An inbox message is a kind byte followed by the RLP encoding of the payload of that kind.

use alloy_primitives::{Address, Bytes, TxKind, U256};
use alloy_rlp::{Encodable, RlpDecodable, RlpEncodable};

use crate::{DecodeError, UserTransaction};

/// The kind tag of an inbox message, its first byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum MessageKind {
    /// Advances L1 time, carries no transactions.
    Heartbeat = 0x00,
    /// A batch of L2 user transactions posted by the sequencer.
    TxBatch = 0x01,
    /// Value deposited on L1.
    Deposit = 0x02,
    /// A call made by an L1 contract into L2.
    L1Call = 0x03,
    /// A list of nested messages.
    Bundle = 0x04,
}

impl TryFrom<u8> for MessageKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Self::Heartbeat,
            0x01 => Self::TxBatch,
            0x02 => Self::Deposit,
            0x03 => Self::L1Call,
            0x04 => Self::Bundle,
            other => return Err(DecodeError::UnknownKind(other)),
        })
    }
}

/// Payload of a [`MessageKind::Heartbeat`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
pub struct HeartbeatPayload {
    /// The L1 timestamp.
    pub timestamp: u64,
}

/// Payload of a [`MessageKind::TxBatch`] message.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
pub struct TxBatchPayload {
    /// The proposed block timestamp.
    pub timestamp: u64,
    /// The sequencer fee recipient.
    pub coinbase: Address,
    /// The proposed block gas limit. Zero asks for the chain maximum.
    pub gas_limit: u64,
    /// The transactions, in sequencer order.
    pub txs: Vec<UserTransaction>,
}

/// Payload of a [`MessageKind::Deposit`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
pub struct DepositPayload {
    /// The L1 timestamp.
    pub timestamp: u64,
    /// The L1 depositor, before aliasing.
    pub l1_sender: Address,
    /// The L2 account credited.
    pub to: Address,
    /// The deposited value.
    pub value: U256,
    /// The L1 deposit identifier.
    pub deposit_id: u64,
}

/// Payload of a [`MessageKind::L1Call`] message.
#[derive(Debug, Clone, PartialEq, Eq, Default, RlpEncodable, RlpDecodable)]
pub struct L1CallPayload {
    /// The L1 timestamp.
    pub timestamp: u64,
    /// The calling L1 contract, before aliasing.
    pub l1_sender: Address,
    /// The L2 target, or contract creation.
    pub to: TxKind,
    /// The value sent along.
    pub value: U256,
    /// The gas limit of the resulting transaction.
    pub gas_limit: u64,
    /// The gas price of the resulting transaction.
    pub gas_price: u128,
    /// The call data.
    pub input: Bytes,
}

/// Typed form of an inbox message, used to produce the raw bytes the decoder consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxMessage {
    /// See [`MessageKind::Heartbeat`].
    Heartbeat(HeartbeatPayload),
    /// See [`MessageKind::TxBatch`].
    TxBatch(TxBatchPayload),
    /// See [`MessageKind::Deposit`].
    Deposit(DepositPayload),
    /// See [`MessageKind::L1Call`].
    L1Call(L1CallPayload),
    /// See [`MessageKind::Bundle`].
    Bundle(Vec<InboxMessage>),
}

impl InboxMessage {
    /// The kind tag of the message.
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Heartbeat(_) => MessageKind::Heartbeat,
            Self::TxBatch(_) => MessageKind::TxBatch,
            Self::Deposit(_) => MessageKind::Deposit,
            Self::L1Call(_) => MessageKind::L1Call,
            Self::Bundle(_) => MessageKind::Bundle,
        }
    }

    /// Encodes the message as `kind || rlp(payload)`.
    pub fn encode(&self) -> Bytes {
        let mut out = vec![self.kind() as u8];
        match self {
            Self::Heartbeat(payload) => payload.encode(&mut out),
            Self::TxBatch(payload) => payload.encode(&mut out),
            Self::Deposit(payload) => payload.encode(&mut out),
            Self::L1Call(payload) => payload.encode(&mut out),
            Self::Bundle(messages) => {
                messages.iter().map(Self::encode).collect::<Vec<_>>().encode(&mut out)
            }
        }
        out.into()
    }
}
