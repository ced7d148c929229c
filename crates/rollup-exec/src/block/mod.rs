//! Block assembly, the deferred segment slot and block finalization.

mod assembler;
mod deferred;
mod finalizer;

pub use deferred::*;
pub use finalizer::*;

use alloy_primitives::{Address, B256};

use crate::{MessageSegment, RollupTransaction};

/// Gas limits every assembled block obeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLimits {
    /// The per-block gas maximum of the chain.
    pub block_gas_limit: u64,
}

impl BlockLimits {
    /// Creates limits with the given chain maximum.
    pub const fn new(block_gas_limit: u64) -> Self {
        Self { block_gas_limit }
    }

    /// The gas limit of a block whose segment asks for `requested`.
    ///
    /// Zero asks for the chain maximum. Requests above the chain maximum are clamped to it.
    pub const fn clamp(&self, requested: u64) -> u64 {
        if requested == 0 || requested > self.block_gas_limit {
            self.block_gas_limit
        } else {
            requested
        }
    }
}

/// The transactions and parameters of one block.
///
/// The transaction order is final: execution may only skip transactions, never reorder them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContents {
    /// The transactions to execute, in order.
    pub transactions: Vec<RollupTransaction>,
    /// The block timestamp.
    pub timestamp: u64,
    /// The fee recipient.
    pub coinbase: Address,
    /// The block gas limit.
    pub gas_limit: u64,
}

/// Why a transaction of a segment did not make it into its block.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DropReason {
    /// The nonce is not the next nonce of the sender.
    #[display("nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch {
        /// The next nonce of the sender.
        expected: u64,
        /// The nonce of the transaction.
        got: u64,
    },
    /// The sender nonce cannot be incremented any further.
    #[display("nonce {nonce} cannot be incremented")]
    NonceOverflow {
        /// The nonce of the transaction.
        nonce: u64,
    },
    /// The transaction alone asks for more gas than a block provides.
    #[display("gas limit {gas_limit} exceeds block gas limit {block_gas_limit}")]
    ExceedsBlockGasLimit {
        /// The transaction gas limit.
        gas_limit: u64,
        /// The block gas limit.
        block_gas_limit: u64,
    },
    /// The declared gas cannot cover the intrinsic gas plus the surcharge.
    #[display("insufficient intrinsic gas: required {required}, provided {provided}")]
    InsufficientIntrinsicGas {
        /// Intrinsic gas plus surcharge.
        required: u64,
        /// The declared gas limit.
        provided: u64,
    },
    /// The execution backend rejected the transaction.
    #[display("rejected: {_0}")]
    Rejected(String),
}

/// A transaction left out of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedTransaction {
    /// The transaction hash.
    pub hash: B256,
    /// Why it was dropped.
    pub reason: DropReason,
}

/// Output of [`MessageSegment::assemble`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledBlock {
    /// The contents of the block.
    pub contents: BlockContents,
    /// The part of the segment that did not fit and goes to the next block.
    pub continuation: Option<MessageSegment>,
    /// Transactions the assembler filtered out.
    pub dropped: Vec<DroppedTransaction>,
}
