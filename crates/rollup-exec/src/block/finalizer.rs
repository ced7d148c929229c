use alloy_consensus::{Header, Receipt};
use alloy_primitives::U256;
use tracing::debug;

use crate::{
    BlockGasCounters, FinalizeError, InvariantViolation, RollupState, RollupTransaction,
    StateWriter,
};

/// What the pipeline observed while building a block, checked against the sealed header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockSummary {
    /// Counters settled by the gas hooks.
    pub counters: BlockGasCounters,
    /// Number of inbox messages read since the previous block, all consumed by this one.
    pub messages_consumed: u64,
}

/// Writes the rollup bookkeeping once a block is sealed.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFinalizer;

impl BlockFinalizer {
    /// Checks the sealed block against the rollup bookkeeping and advances it.
    ///
    /// Nothing is written unless every check passes. Any error invalidates the block.
    pub fn finalize<S: StateWriter + ?Sized>(
        &self,
        header: &Header,
        transactions: &[RollupTransaction],
        receipts: &[Receipt],
        summary: &BlockSummary,
        state: &mut S,
    ) -> Result<(), FinalizeError> {
        if receipts.len() != transactions.len() {
            return Err(InvariantViolation::ReceiptCountMismatch {
                transactions: transactions.len(),
                receipts: receipts.len(),
            }
            .into());
        }
        let receipts_gas = receipts.last().map_or(0, |receipt| receipt.cumulative_gas_used);
        if receipts_gas != header.gas_used {
            return Err(InvariantViolation::ReceiptGasMismatch {
                header: header.gas_used,
                receipts: receipts_gas,
            }
            .into());
        }
        if header.gas_used != summary.counters.gas_used {
            return Err(InvariantViolation::SettledGasMismatch {
                header: header.gas_used,
                settled: summary.counters.gas_used,
            }
            .into());
        }
        if header.gas_used > header.gas_limit {
            return Err(InvariantViolation::BlockGasLimitExceeded {
                gas_used: header.gas_used,
                gas_limit: header.gas_limit,
            }
            .into());
        }

        let mut rollup = RollupState::new(state);
        let block_count = rollup.block_count()?;
        if header.number != block_count {
            return Err(InvariantViolation::BlockNumberMismatch {
                expected: block_count,
                got: header.number,
            }
            .into());
        }
        let previous = rollup.last_block_timestamp()?;
        if header.timestamp < previous {
            return Err(
                InvariantViolation::TimestampRegression { previous, got: header.timestamp }.into()
            );
        }

        let deposits = transactions.iter().filter(|tx| tx.is_deposit()).count() as u64;
        let total_gas_used = rollup.total_gas_used()? + U256::from(header.gas_used);
        let total_surcharge_gas =
            rollup.total_surcharge_gas()? + U256::from(summary.counters.surcharge_gas);
        let message_count = rollup.message_count()? + summary.messages_consumed;
        let deposit_count = rollup.deposit_count()? + deposits;

        rollup.set_block_count(block_count + 1)?;
        rollup.set_last_block(header.number, header.timestamp)?;
        rollup.set_last_block_hash(header.hash_slow())?;
        rollup.set_pending_messages(0)?;
        rollup.set_total_gas_used(total_gas_used)?;
        rollup.set_total_surcharge_gas(total_surcharge_gas)?;
        rollup.set_message_count(message_count)?;
        rollup.set_deposit_count(deposit_count)?;

        debug!(
            target: "rollup_exec::finalizer",
            number = header.number,
            gas_used = header.gas_used,
            transactions = transactions.len(),
            messages = message_count,
            "Finalized block"
        );
        Ok(())
    }
}
