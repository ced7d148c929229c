//! Turning a segment into the contents of a block.
//!
//! Assembly reads the state as of the end of the previous block and never writes it. The result is
//! a pure function of that snapshot and the segment.

use std::collections::{btree_map::Entry, BTreeMap};

use alloy_primitives::Address;
use tracing::debug;

use crate::{
    apply_l1_to_l2_alias,
    constants::origin::DEPOSIT_BLOCK_GAS_LIMIT,
    AssembledBlock, AssemblyError, BlockContents, BlockLimits, DepositPayload, DepositTransaction,
    DropReason, DroppedTransaction, L1CallPayload, MessageSegment, ReadOnlyState, RollupState,
    RollupTransaction, SegmentOrigin, SegmentPayload, StateReader, TxBatchPayload,
    UserTransaction,
};

impl MessageSegment {
    /// Builds the contents of one block from this segment.
    ///
    /// The block gas limit is the requested one clamped to `limits`. A transaction batch that does
    /// not fit is cut at the first transaction overflowing the remaining gas; that transaction and
    /// every later one come back as [`AssembledBlock::continuation`].
    pub fn assemble<S: StateReader + ?Sized>(
        self,
        state: ReadOnlyState<'_, S>,
        limits: &BlockLimits,
    ) -> Result<AssembledBlock, AssemblyError> {
        let timestamp = self
            .payload
            .timestamp()
            .max(RollupState::new(state).last_block_timestamp()?);

        match self.payload {
            SegmentPayload::TxBatch(payload) => {
                assemble_tx_batch(self.origin, payload, timestamp, state, limits)
            }
            SegmentPayload::Deposit(payload) => Ok(assemble_deposit(payload, timestamp, limits)),
            SegmentPayload::L1Call(payload) => {
                assemble_l1_call(self.origin, payload, timestamp, state, limits)
            }
        }
    }
}

fn assemble_tx_batch<S: StateReader + ?Sized>(
    origin: SegmentOrigin,
    payload: TxBatchPayload,
    timestamp: u64,
    state: ReadOnlyState<'_, S>,
    limits: &BlockLimits,
) -> Result<AssembledBlock, AssemblyError> {
    let TxBatchPayload { timestamp: proposed_timestamp, coinbase, gas_limit: requested, txs } =
        payload;
    if coinbase.is_zero() && !txs.is_empty() {
        return Err(AssemblyError::MissingCoinbase { origin });
    }

    let gas_limit = limits.clamp(requested);
    let mut gas_remaining = gas_limit;
    let mut next_nonces = BTreeMap::<Address, u64>::new();
    let mut transactions = Vec::with_capacity(txs.len());
    let mut dropped = Vec::new();
    let mut continuation = None;

    let mut txs = txs.into_iter();
    while let Some(tx) = txs.next() {
        if tx.gas_limit > gas_limit {
            let reason = DropReason::ExceedsBlockGasLimit {
                gas_limit: tx.gas_limit,
                block_gas_limit: gas_limit,
            };
            dropped.push(drop_tx(&tx, reason));
            continue;
        }

        let expected = match next_nonces.entry(tx.from) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => *entry.insert(state.nonce(tx.from)?),
        };
        if tx.nonce != expected {
            dropped.push(drop_tx(&tx, DropReason::NonceMismatch { expected, got: tx.nonce }));
            continue;
        }
        let Some(next_nonce) = expected.checked_add(1) else {
            dropped.push(drop_tx(&tx, DropReason::NonceOverflow { nonce: expected }));
            continue;
        };

        if tx.gas_limit > gas_remaining {
            let remaining: Vec<_> = core::iter::once(tx).chain(txs).collect();
            debug!(
                target: "rollup_exec::assembler",
                %origin,
                deferred = remaining.len(),
                "Transaction batch does not fit the block"
            );
            continuation = Some(MessageSegment::new(
                origin.next_continuation(),
                SegmentPayload::TxBatch(TxBatchPayload {
                    timestamp: proposed_timestamp,
                    coinbase,
                    gas_limit: requested,
                    txs: remaining,
                }),
            ));
            break;
        }

        gas_remaining -= tx.gas_limit;
        next_nonces.insert(tx.from, next_nonce);
        transactions.push(RollupTransaction::User(tx));
    }

    Ok(AssembledBlock {
        contents: BlockContents { transactions, timestamp, coinbase, gas_limit },
        continuation,
        dropped,
    })
}

fn assemble_deposit(
    payload: DepositPayload,
    timestamp: u64,
    limits: &BlockLimits,
) -> AssembledBlock {
    let deposit = DepositTransaction {
        from: apply_l1_to_l2_alias(payload.l1_sender),
        to: payload.to,
        value: payload.value,
        deposit_id: payload.deposit_id,
    };
    AssembledBlock {
        contents: BlockContents {
            transactions: vec![RollupTransaction::Deposit(deposit)],
            timestamp,
            coinbase: Address::ZERO,
            gas_limit: DEPOSIT_BLOCK_GAS_LIMIT.min(limits.block_gas_limit),
        },
        continuation: None,
        dropped: Vec::new(),
    }
}

fn assemble_l1_call<S: StateReader + ?Sized>(
    origin: SegmentOrigin,
    payload: L1CallPayload,
    timestamp: u64,
    state: ReadOnlyState<'_, S>,
    limits: &BlockLimits,
) -> Result<AssembledBlock, AssemblyError> {
    if payload.gas_limit > limits.block_gas_limit {
        return Err(AssemblyError::GasLimitAboveBlock {
            origin,
            gas_limit: payload.gas_limit,
            block_gas_limit: limits.block_gas_limit,
        });
    }

    let from = apply_l1_to_l2_alias(payload.l1_sender);
    let tx = UserTransaction {
        from,
        nonce: state.nonce(from)?,
        gas_price: payload.gas_price,
        gas_limit: payload.gas_limit,
        to: payload.to,
        value: payload.value,
        input: payload.input,
    };
    Ok(AssembledBlock {
        contents: BlockContents {
            transactions: vec![RollupTransaction::User(tx)],
            timestamp,
            coinbase: Address::ZERO,
            gas_limit: limits.block_gas_limit,
        },
        continuation: None,
        dropped: Vec::new(),
    })
}

fn drop_tx(tx: &UserTransaction, reason: DropReason) -> DroppedTransaction {
    let hash = RollupTransaction::User(tx.clone()).hash();
    debug!(target: "rollup_exec::assembler", tx_hash = %hash, %reason, "Dropped transaction");
    DroppedTransaction { hash, reason }
}
