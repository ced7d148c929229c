//! The block production pipeline.
//!
//! [`RollupPipeline`] owns the gas hooks, the deferred segment slot, the block finalizer and the
//! precompile set, and drives inbox messages through them:
//!
//! 1. the deferred segment, if any, becomes the next block;
//! 2. the message is split into segments, each assembled into a block against a read-only view of
//!    the state;
//! 3. every transaction runs `start_tx`, the execution backend, then `end_tx`;
//! 4. the backend seals the header and the finalizer writes the rollup bookkeeping.
//!
//! A remainder that did not fit its block waits in the deferred slot and becomes the next block.
//!
//! Everything that carries over from one block to the next lives in the rollup state: the parent
//! hash, the inbox messages read since the last block and the encoded deferred segment. A pipeline
//! created over an existing state, see [`RollupPipeline::resume`], continues the chain exactly as
//! the pipeline that wrote it would have.

use alloy_consensus::{Header, Receipt};
use tracing::{debug, warn};

use crate::{
    split_message, AssembledBlock, AssemblyError, BlockFinalizer, BlockLimits, BlockSummary,
    ChainConfig, ConfigError, DecodeError, DeferredSegmentSlot, DropReason, DroppedTransaction,
    ExecutionBackend, ExecutionError, GasHookController, HookError, InvariantViolation,
    MessageSegment, PipelineError, PrecompileEnv, PrecompileSet, ReadOnlyState, RollupBlockEnv,
    RollupState, RollupTransaction, SegmentOrigin, StateError, StateReader, StateWriter,
    TxGasEnv,
};

/// A block produced by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedBlock {
    /// The segment the block was assembled from.
    pub origin: SegmentOrigin,
    /// The sealed header.
    pub header: Header,
    /// The executed transactions.
    pub transactions: Vec<RollupTransaction>,
    /// One receipt per executed transaction.
    pub receipts: Vec<Receipt>,
    /// Transactions of the segment left out of the block.
    pub dropped: Vec<DroppedTransaction>,
}

/// Drives inbox messages into blocks.
#[derive(Debug)]
pub struct RollupPipeline {
    config: ChainConfig,
    limits: BlockLimits,
    precompiles: PrecompileSet,
    hooks: GasHookController,
    deferred: DeferredSegmentSlot,
    finalizer: BlockFinalizer,
}

impl RollupPipeline {
    /// Creates a pipeline for the chain described by `config`.
    pub fn new(config: ChainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            limits: config.block_limits(),
            precompiles: PrecompileSet::new_with_spec(config.spec, PrecompileEnv::from(&config)),
            hooks: GasHookController::new(config.base_fee),
            deferred: DeferredSegmentSlot::new(),
            finalizer: BlockFinalizer,
            config,
        })
    }

    /// Creates a pipeline continuing the chain kept in `state`, picking up its deferred segment.
    pub fn resume<S: StateReader>(config: ChainConfig, state: &S) -> Result<Self, PipelineError> {
        let mut pipeline = Self::new(config)?;
        pipeline.restore_deferred(state)?;
        Ok(pipeline)
    }

    /// The chain configuration.
    pub const fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// The installed precompiles.
    pub const fn precompiles(&self) -> &PrecompileSet {
        &self.precompiles
    }

    /// The gas hooks.
    pub const fn hooks(&self) -> &GasHookController {
        &self.hooks
    }

    /// Writes the genesis bookkeeping unless the state already has it.
    pub fn initialize_state<S: StateWriter>(&self, state: &mut S) -> Result<bool, StateError> {
        RollupState::new(state).initialize(&self.config)
    }

    /// Splits a raw inbox message into segments.
    pub fn split_message(&self, raw: &[u8]) -> Result<Vec<MessageSegment>, DecodeError> {
        split_message(raw)
    }

    /// Pre-execution hook, see [`GasHookController::start_tx`].
    pub fn start_tx<S: StateReader>(
        &mut self,
        tx: &RollupTransaction,
        state: &S,
    ) -> Result<u64, HookError> {
        self.hooks.start_tx(tx, state)
    }

    /// Post-execution hook, see [`GasHookController::end_tx`].
    pub fn end_tx(
        &mut self,
        tx: &RollupTransaction,
        total_gas_used: u64,
        extra_gas_charged: u64,
    ) -> Result<(), HookError> {
        self.hooks.end_tx(tx, total_gas_used, extra_gas_charged)
    }

    /// The segment waiting to become the next block.
    pub const fn peek_deferred_segment(&self) -> Option<&MessageSegment> {
        self.deferred.peek()
    }

    /// Finalizes a sealed block against the gas settled by the hooks since the previous block.
    pub fn finalize_block<S: StateWriter>(
        &mut self,
        header: &Header,
        transactions: &[RollupTransaction],
        receipts: &[Receipt],
        state: &mut S,
    ) -> Result<(), PipelineError> {
        if let Some(record) = self.hooks.in_flight() {
            let tx_hash = record.tx_hash;
            return Err(InvariantViolation::TransactionStillInFlight { tx_hash }.into());
        }
        let summary = BlockSummary {
            counters: self.hooks.take_block_counters(),
            messages_consumed: RollupState::new(&*state).pending_messages()?,
        };
        self.finalizer.finalize(header, transactions, receipts, &summary, state)?;
        Ok(())
    }

    /// Turns one raw inbox message into blocks.
    ///
    /// The deferred segment is built first. A malformed message produces no block of its own and
    /// is only logged. Only fatal conditions are returned as errors; the current block must then
    /// be discarded.
    pub fn process_message<S: StateWriter, B: ExecutionBackend>(
        &mut self,
        raw: &[u8],
        state: &mut S,
        backend: &mut B,
    ) -> Result<Vec<ProducedBlock>, PipelineError> {
        let mut blocks = self.drain_deferred(state, backend)?;
        let mut rollup = RollupState::new(&mut *state);
        let pending = rollup.pending_messages()?;
        rollup.set_pending_messages(pending + 1)?;

        let segments = match split_message(raw) {
            Ok(segments) => segments,
            Err(err) => {
                warn!(target: "rollup_exec::pipeline", %err, "Skipping malformed inbox message");
                return Ok(blocks);
            }
        };

        for segment in segments {
            blocks.extend(self.drain_deferred(state, backend)?);
            blocks.extend(self.produce_block(segment, state, backend)?);
        }
        Ok(blocks)
    }

    /// Builds blocks from the deferred segment until the slot stays empty.
    pub fn drain_deferred<S: StateWriter, B: ExecutionBackend>(
        &mut self,
        state: &mut S,
        backend: &mut B,
    ) -> Result<Vec<ProducedBlock>, PipelineError> {
        self.restore_deferred(&*state)?;
        let mut blocks = Vec::new();
        while let Some(segment) = self.deferred.take_if_present() {
            RollupState::new(&mut *state).clear_deferred_segment()?;
            blocks.extend(self.produce_block(segment, state, backend)?);
        }
        Ok(blocks)
    }

    /// Loads the deferred segment kept in the state into an empty slot.
    fn restore_deferred<S: StateReader>(&mut self, state: &S) -> Result<(), PipelineError> {
        if self.deferred.is_occupied() {
            return Ok(());
        }
        if let Some(encoded) = RollupState::new(state).deferred_segment()? {
            let segment = MessageSegment::decode(&encoded)
                .map_err(InvariantViolation::CorruptDeferredSegment)?;
            debug!(target: "rollup_exec::pipeline", origin = %segment.origin, "Restored deferred");
            self.deferred.offer(segment)?;
        }
        Ok(())
    }

    /// Assembles, executes, seals and finalizes one block. Returns `None` when the segment is
    /// skipped.
    fn produce_block<S: StateWriter, B: ExecutionBackend>(
        &mut self,
        segment: MessageSegment,
        state: &mut S,
        backend: &mut B,
    ) -> Result<Option<ProducedBlock>, PipelineError> {
        let origin = segment.origin;
        let AssembledBlock { contents, continuation, mut dropped } =
            match segment.assemble(ReadOnlyState::new(&*state), &self.limits) {
                Ok(assembled) => assembled,
                Err(AssemblyError::State(err)) => return Err(err.into()),
                Err(err) => {
                    warn!(target: "rollup_exec::pipeline", %origin, %err, "Skipping segment");
                    return Ok(None);
                }
            };
        if let Some(continuation) = continuation {
            let encoded = continuation.encode();
            self.deferred.offer(continuation)?;
            RollupState::new(&mut *state).set_deferred_segment(&encoded)?;
        }

        let rollup = RollupState::new(&*state);
        let block = RollupBlockEnv {
            number: rollup.block_count()?,
            parent_hash: rollup.last_block_hash()?,
            timestamp: contents.timestamp,
            coinbase: contents.coinbase,
            gas_limit: contents.gas_limit,
            base_fee: self.config.base_fee,
            chain_id: self.config.chain_id,
        };

        let mut transactions = Vec::with_capacity(contents.transactions.len());
        let mut receipts = Vec::with_capacity(contents.transactions.len());
        let mut cumulative_gas_used = 0u64;
        for tx in contents.transactions {
            let tx_hash = tx.hash();
            let extra_gas = match self.hooks.start_tx(&tx, &*state) {
                Ok(extra_gas) => extra_gas,
                Err(HookError::InsufficientIntrinsicGas { required, provided, .. }) => {
                    debug!(
                        target: "rollup_exec::pipeline",
                        %tx_hash,
                        required,
                        provided,
                        "Insufficient intrinsic gas"
                    );
                    dropped.push(DroppedTransaction {
                        hash: tx_hash,
                        reason: DropReason::InsufficientIntrinsicGas { required, provided },
                    });
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let gas = TxGasEnv { gas_limit: tx.gas_limit(), extra_gas };
            match backend.execute_transaction(&tx, &block, &gas, state, &self.precompiles) {
                Ok(outcome) => {
                    self.hooks.end_tx(&tx, outcome.gas_used, extra_gas)?;
                    cumulative_gas_used += outcome.gas_used;
                    receipts.push(Receipt {
                        status: outcome.success.into(),
                        cumulative_gas_used,
                        logs: outcome.logs,
                    });
                    transactions.push(tx);
                }
                Err(ExecutionError::Rejected(reason)) => {
                    debug!(target: "rollup_exec::pipeline", %tx_hash, %reason, "Rejected");
                    self.hooks.discard_tx(&tx)?;
                    let reason = DropReason::Rejected(reason);
                    dropped.push(DroppedTransaction { hash: tx_hash, reason });
                }
                Err(ExecutionError::Fatal(reason)) => {
                    return Err(PipelineError::Backend { tx_hash, reason });
                }
            }
        }

        let header = backend.seal_header(&block, &transactions, &receipts);
        self.finalize_block(&header, &transactions, &receipts, state)?;
        debug!(
            target: "rollup_exec::pipeline",
            %origin,
            number = header.number,
            transactions = transactions.len(),
            dropped = dropped.len(),
            gas_used = header.gas_used,
            "Produced block"
        );

        Ok(Some(ProducedBlock { origin, header, transactions, receipts, dropped }))
    }
}
