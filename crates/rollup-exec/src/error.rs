//! Error taxonomy of the pipeline.
//!
//! Errors caused by untrusted input ([`DecodeError`], [`HookError::InsufficientIntrinsicGas`],
//! [`AssemblyError`], [`PrecompileError`]) are contained where they are discovered and turned into
//! skip or revert signals. Violations of internal invariants ([`InvariantViolation`]) halt block
//! production through [`PipelineError`].

use alloy_primitives::{Address, Selector, B256, U256};

use crate::SegmentOrigin;

/// Error reported by the external state container.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// The underlying database failed.
    #[error("state database error: {0}")]
    Database(String),
}

impl StateError {
    /// Wraps any database error.
    pub fn database(err: impl core::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

/// A raw inbox message does not match any known layout. The message is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The message carries no kind tag.
    #[error("empty inbox message")]
    Empty,
    /// The kind tag is not known.
    #[error("unknown message kind {0:#04x}")]
    UnknownKind(u8),
    /// The payload is not valid RLP for its kind.
    #[error("malformed payload for message kind {kind:#04x}: {source}")]
    Rlp {
        /// The kind tag of the message.
        kind: u8,
        /// The RLP error.
        #[source]
        source: alloy_rlp::Error,
    },
    /// The payload decoded but bytes were left over.
    #[error("{remaining} trailing bytes after payload of message kind {kind:#04x}")]
    TrailingBytes {
        /// The kind tag of the message.
        kind: u8,
        /// Number of bytes left over.
        remaining: usize,
    },
    /// A bundle contains another bundle.
    #[error("bundles may not be nested")]
    NestedBundle,
    /// A bundle carries more messages than allowed.
    #[error("bundle carries {count} messages, limit is {limit}")]
    TooManyMessages {
        /// Number of messages in the bundle.
        count: usize,
        /// The maximum number of messages.
        limit: usize,
    },
}

/// Error raised while turning a segment into block contents. The segment is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    /// A transaction batch with transactions but without a coinbase.
    #[error("segment {origin} carries transactions but no coinbase")]
    MissingCoinbase {
        /// The offending segment.
        origin: SegmentOrigin,
    },
    /// An L1 call asks for more gas than a whole block provides.
    #[error("segment {origin} requests gas_limit={gas_limit} > block_gas_limit={block_gas_limit}")]
    GasLimitAboveBlock {
        /// The offending segment.
        origin: SegmentOrigin,
        /// The requested gas limit.
        gas_limit: u64,
        /// The chain maximum.
        block_gas_limit: u64,
    },
    /// The state snapshot could not be read.
    #[error(transparent)]
    State(#[from] StateError),
}

/// A broken internal invariant. Continuing would risk a non-deterministic chain, so the error is
/// fatal for block production.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// A segment was offered to the deferred slot while it was occupied.
    #[error("deferred slot already holds {occupied_by}, cannot defer {offered}")]
    DeferredSlotOccupied {
        /// The segment already waiting.
        occupied_by: SegmentOrigin,
        /// The segment that was offered.
        offered: SegmentOrigin,
    },
    /// The deferred segment kept in the rollup state does not decode.
    #[error("stored deferred segment is corrupt: {0}")]
    CorruptDeferredSegment(DecodeError),
    /// `start_tx` was called while another transaction was still in flight.
    #[error("start_tx for {started} while {in_flight} is still in flight")]
    HookOutOfOrder {
        /// The transaction still waiting for `end_tx`.
        in_flight: B256,
        /// The transaction that tried to start.
        started: B256,
    },
    /// `end_tx` was called without a matching `start_tx`.
    #[error("end_tx for {tx_hash} without a transaction in flight")]
    NoTransactionInFlight {
        /// The transaction passed to `end_tx`.
        tx_hash: B256,
    },
    /// `end_tx` was called for a different transaction than the one in flight.
    #[error("end_tx for {got} while {expected} is in flight")]
    TransactionMismatch {
        /// The transaction in flight.
        expected: B256,
        /// The transaction passed to `end_tx`.
        got: B256,
    },
    /// The surcharge reported at settlement differs from the one charged by `start_tx`.
    #[error("tx {tx_hash} settled with extra_gas={charged}, start_tx charged {recorded}")]
    SurchargeMismatch {
        /// The transaction.
        tx_hash: B256,
        /// The surcharge passed to `end_tx`.
        charged: u64,
        /// The surcharge computed by `start_tx`.
        recorded: u64,
    },
    /// The total gas used does not include the surcharge.
    #[error("tx {tx_hash} used {total_gas_used} gas, less than its surcharge {extra_gas}")]
    GasUsedBelowSurcharge {
        /// The transaction.
        tx_hash: B256,
        /// Total gas used.
        total_gas_used: u64,
        /// The surcharge.
        extra_gas: u64,
    },
    /// The total gas used exceeds the declared gas limit.
    #[error("tx {tx_hash} used {total_gas_used} gas, more than its limit {gas_limit}")]
    GasUsedAboveLimit {
        /// The transaction.
        tx_hash: B256,
        /// Total gas used.
        total_gas_used: u64,
        /// The declared gas limit.
        gas_limit: u64,
    },
    /// A block was finalized while a transaction was still in flight.
    #[error("block finalized while {tx_hash} is still in flight")]
    TransactionStillInFlight {
        /// The transaction waiting for `end_tx`.
        tx_hash: B256,
    },
    /// The number of receipts differs from the number of transactions.
    #[error("{receipts} receipts for {transactions} transactions")]
    ReceiptCountMismatch {
        /// Number of transactions.
        transactions: usize,
        /// Number of receipts.
        receipts: usize,
    },
    /// The header gas used differs from the receipts.
    #[error("header gas_used={header} but receipts account for {receipts}")]
    ReceiptGasMismatch {
        /// Gas used in the header.
        header: u64,
        /// Cumulative gas of the last receipt.
        receipts: u64,
    },
    /// The header gas used differs from what the gas hooks settled.
    #[error("header gas_used={header} but the gas hooks settled {settled}")]
    SettledGasMismatch {
        /// Gas used in the header.
        header: u64,
        /// Gas settled by the hooks.
        settled: u64,
    },
    /// The header gas used exceeds its gas limit.
    #[error("header gas_used={gas_used} > gas_limit={gas_limit}")]
    BlockGasLimitExceeded {
        /// Gas used in the header.
        gas_used: u64,
        /// Gas limit in the header.
        gas_limit: u64,
    },
    /// The header number is not the next block number.
    #[error("expected block number {expected}, got {got}")]
    BlockNumberMismatch {
        /// The next block number according to the rollup state.
        expected: u64,
        /// The header number.
        got: u64,
    },
    /// The header timestamp is before the previous block.
    #[error("block timestamp {got} is before the previous block timestamp {previous}")]
    TimestampRegression {
        /// The previous block timestamp.
        previous: u64,
        /// The header timestamp.
        got: u64,
    },
}

/// Error returned by the gas hooks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    /// The declared gas cannot cover the intrinsic gas plus the surcharge. The transaction is
    /// dropped from the block without being executed.
    #[error("tx {tx_hash} declares {provided} gas, requires at least {required}")]
    InsufficientIntrinsicGas {
        /// The transaction.
        tx_hash: B256,
        /// Intrinsic gas plus surcharge.
        required: u64,
        /// The declared gas limit.
        provided: u64,
    },
    /// The state could not be read.
    #[error(transparent)]
    State(#[from] StateError),
    /// A gas accounting invariant was broken.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl HookError {
    /// Whether the error only drops the transaction and block production continues.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientIntrinsicGas { .. })
    }
}

/// Error returned by a precompile call. It is surfaced to the calling contract as a revert.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrecompileError {
    /// A state-dependent precompile was reached through `DELEGATECALL` or `CALLCODE`.
    #[error("unsafe delegated call to {precompile} acting as {acting_as}")]
    UnsafeDelegatedCall {
        /// The precompile whose code runs.
        precompile: Address,
        /// The account the code runs as.
        acting_as: Address,
    },
    /// A state mutation was attempted in a static context.
    #[error("write protection")]
    WriteProtection,
    /// Value was sent to a precompile method.
    #[error("method is not payable, got value {value}")]
    NonPayable {
        /// The value sent with the call.
        value: U256,
    },
    /// The caller is not allowed to call the method.
    #[error("unauthorized caller {caller}")]
    Unauthorized {
        /// The caller.
        caller: Address,
    },
    /// The selector does not belong to the precompile.
    #[error("unknown selector {0}")]
    UnknownSelector(Selector),
    /// The call data could not be decoded.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The state could not be accessed.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Error returned by the block finalizer. Any error invalidates the block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FinalizeError {
    /// The block does not satisfy the bookkeeping invariants.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    /// The bookkeeping could not be written.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Error of the chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The chain id is zero.
    #[error("chain id must not be zero")]
    ZeroChainId,
    /// The block gas limit cannot fit a single transaction.
    #[error("block gas limit {limit} is below the minimum {min}")]
    BlockGasLimitTooLow {
        /// The configured block gas limit.
        limit: u64,
        /// The minimum block gas limit.
        min: u64,
    },
}

/// Fatal error of the block production pipeline. Processing of the current block halts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// The chain configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// An internal invariant was broken.
    #[error("consensus invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
    /// A gas hook failed.
    #[error("gas hook failed: {0}")]
    Hook(#[from] HookError),
    /// Block finalization failed.
    #[error("block finalization failed: {0}")]
    Finalize(#[from] FinalizeError),
    /// The state could not be accessed.
    #[error(transparent)]
    State(#[from] StateError),
    /// The execution backend failed.
    #[error("execution backend failed on tx {tx_hash}: {reason}")]
    Backend {
        /// The transaction being executed.
        tx_hash: B256,
        /// The failure reported by the backend.
        reason: String,
    },
}

impl PipelineError {
    /// Whether the error is a consensus invariant violation, directly or through a hook or the
    /// finalizer.
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::Invariant(_) |
                Self::Hook(HookError::Invariant(_)) |
                Self::Finalize(FinalizeError::Invariant(_))
        )
    }
}
