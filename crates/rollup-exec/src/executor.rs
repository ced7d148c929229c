//! The seam to the external transaction executor.

use alloy_consensus::{Header, Receipt};
use alloy_primitives::{Address, Bytes, Log, B256};
use auto_impl::auto_impl;

use crate::{PrecompileSet, RollupTransaction, StateWriter};

/// Block-level environment handed to the execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupBlockEnv {
    /// The block number.
    pub number: u64,
    /// Hash of the previous block header.
    pub parent_hash: B256,
    /// The block timestamp.
    pub timestamp: u64,
    /// The fee recipient.
    pub coinbase: Address,
    /// The block gas limit.
    pub gas_limit: u64,
    /// The L2 base fee.
    pub base_fee: u128,
    /// The chain id.
    pub chain_id: u64,
}

/// Gas parameters of one transaction, as settled by the pre-execution hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxGasEnv {
    /// The gas limit declared by the transaction.
    pub gas_limit: u64,
    /// Surcharge gas the backend must charge on top of execution gas.
    pub extra_gas: u64,
}

impl TxGasEnv {
    /// Gas left for execution once the surcharge is paid.
    pub const fn execution_gas_limit(&self) -> u64 {
        self.gas_limit.saturating_sub(self.extra_gas)
    }
}

/// Result of executing one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Whether the transaction succeeded.
    pub success: bool,
    /// Gas used, surcharge included.
    pub gas_used: u64,
    /// Return or revert data.
    pub output: Bytes,
    /// Emitted logs.
    pub logs: Vec<Log>,
}

/// Failure of the execution backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The transaction is invalid against the current state (e.g. it cannot pay for its gas). It
    /// is dropped from the block; state is unchanged.
    #[error("transaction rejected: {0}")]
    Rejected(String),
    /// The backend itself failed. Block production halts.
    #[error("backend failure: {0}")]
    Fatal(String),
}

/// Executes transactions and seals headers.
///
/// The backend calls [`PrecompileSet::run`] whenever a call targets a reserved address.
#[auto_impl(&mut, Box)]
pub trait ExecutionBackend {
    /// Executes `tx` against `state`.
    ///
    /// A rejected transaction must leave `state` untouched. An executed transaction, reverted or
    /// not, must report a `gas_used` between `gas.extra_gas` and `gas.gas_limit`.
    fn execute_transaction<S: StateWriter>(
        &mut self,
        tx: &RollupTransaction,
        block: &RollupBlockEnv,
        gas: &TxGasEnv,
        state: &mut S,
        precompiles: &PrecompileSet,
    ) -> Result<ExecutionOutcome, ExecutionError>;

    /// Builds the header of an executed block.
    fn seal_header(
        &mut self,
        block: &RollupBlockEnv,
        _transactions: &[RollupTransaction],
        receipts: &[Receipt],
    ) -> Header {
        Header {
            parent_hash: block.parent_hash,
            beneficiary: block.coinbase,
            number: block.number,
            gas_limit: block.gas_limit,
            gas_used: receipts.last().map_or(0, |receipt| receipt.cumulative_gas_used),
            timestamp: block.timestamp,
            base_fee_per_gas: Some(u64::try_from(block.base_fee).unwrap_or(u64::MAX)),
            ..Default::default()
        }
    }
}
