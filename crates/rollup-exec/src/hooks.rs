//! The gas hooks run around every transaction of a block.
//!
//! [`GasHookController::start_tx`] runs before execution and computes the surcharge the
//! transaction pays for posting its data to L1. [`GasHookController::end_tx`] runs after execution
//! and reconciles the gas reported by the execution backend with what was charged, accumulating
//! the per-block counters consumed by the block finalizer.

use alloy_primitives::{B256, U256};
use tracing::trace;

use crate::{
    constants::origin::{
        CREATE, POSTER_UNITS_PER_BYTE, TX_BASE_GAS, TX_DATA_NON_ZERO_GAS, TX_DATA_ZERO_GAS,
    },
    HookError, InvariantViolation, RollupState, RollupTransaction, StateReader, UserTransaction,
};

/// Scratch accounting of the transaction currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasAccountingRecord {
    /// The transaction.
    pub tx_hash: B256,
    /// The surcharge computed by `start_tx`, included in the gas the transaction pays.
    pub extra_gas: u64,
    /// The gas limit declared by the transaction.
    pub declared_gas: u64,
    /// Whether the transaction is a deposit.
    pub is_deposit: bool,
}

/// Gas counters of the block being built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockGasCounters {
    /// Number of settled transactions.
    pub transactions: u64,
    /// Number of settled deposits.
    pub deposits: u64,
    /// Total gas used, surcharges included.
    pub gas_used: u64,
    /// Total surcharge gas.
    pub surcharge_gas: u64,
}

/// Charges and settles the protocol gas of transactions, one at a time.
#[derive(Debug, Clone, Default)]
pub struct GasHookController {
    base_fee: u128,
    in_flight: Option<GasAccountingRecord>,
    last_settled: Option<B256>,
    counters: BlockGasCounters,
}

impl GasHookController {
    /// Creates a controller pricing surcharges against `base_fee`.
    pub fn new(base_fee: u128) -> Self {
        Self { base_fee, ..Default::default() }
    }

    /// The L2 base fee surcharges are priced against.
    pub const fn base_fee(&self) -> u128 {
        self.base_fee
    }

    /// The transaction between `start_tx` and `end_tx`, if any.
    pub const fn in_flight(&self) -> Option<&GasAccountingRecord> {
        self.in_flight.as_ref()
    }

    /// Counters of the current block.
    pub const fn counters(&self) -> &BlockGasCounters {
        &self.counters
    }

    /// Runs before `tx` executes and returns the surcharge gas it must pay on top of the execution
    /// gas.
    ///
    /// Fails with [`HookError::InsufficientIntrinsicGas`] when the declared gas limit cannot cover
    /// the intrinsic gas plus the surcharge. In that case no record is kept and the transaction
    /// must not be executed.
    pub fn start_tx<S: StateReader>(
        &mut self,
        tx: &RollupTransaction,
        state: &S,
    ) -> Result<u64, HookError> {
        let tx_hash = tx.hash();
        if let Some(record) = &self.in_flight {
            return Err(InvariantViolation::HookOutOfOrder {
                in_flight: record.tx_hash,
                started: tx_hash,
            }
            .into());
        }

        let extra_gas = match tx {
            RollupTransaction::Deposit(_) => 0,
            RollupTransaction::User(user) => {
                let l1_price_per_unit = RollupState::new(state).l1_price_per_unit()?;
                let extra_gas = surcharge_gas(l1_price_per_unit, poster_units(tx), self.base_fee);
                let required = intrinsic_gas(user).saturating_add(extra_gas);
                if user.gas_limit < required {
                    return Err(HookError::InsufficientIntrinsicGas {
                        tx_hash,
                        required,
                        provided: user.gas_limit,
                    });
                }
                extra_gas
            }
        };

        trace!(target: "rollup_exec::hooks", %tx_hash, extra_gas, "start_tx");
        self.in_flight = Some(GasAccountingRecord {
            tx_hash,
            extra_gas,
            declared_gas: tx.gas_limit(),
            is_deposit: tx.is_deposit(),
        });
        Ok(extra_gas)
    }

    /// Runs after `tx` executed, reverted or not. `total_gas_used` must include
    /// `extra_gas_charged`, which must equal the surcharge returned by `start_tx`.
    ///
    /// Calling it again for the transaction that was just settled is a no-op.
    pub fn end_tx(
        &mut self,
        tx: &RollupTransaction,
        total_gas_used: u64,
        extra_gas_charged: u64,
    ) -> Result<(), HookError> {
        let tx_hash = tx.hash();
        let Some(record) = self.in_flight else {
            if self.last_settled == Some(tx_hash) {
                return Ok(());
            }
            return Err(InvariantViolation::NoTransactionInFlight { tx_hash }.into());
        };

        if record.tx_hash != tx_hash {
            return Err(InvariantViolation::TransactionMismatch {
                expected: record.tx_hash,
                got: tx_hash,
            }
            .into());
        }
        if extra_gas_charged != record.extra_gas {
            return Err(InvariantViolation::SurchargeMismatch {
                tx_hash,
                charged: extra_gas_charged,
                recorded: record.extra_gas,
            }
            .into());
        }
        if total_gas_used < extra_gas_charged {
            return Err(InvariantViolation::GasUsedBelowSurcharge {
                tx_hash,
                total_gas_used,
                extra_gas: extra_gas_charged,
            }
            .into());
        }
        if !record.is_deposit && total_gas_used > record.declared_gas {
            return Err(InvariantViolation::GasUsedAboveLimit {
                tx_hash,
                total_gas_used,
                gas_limit: record.declared_gas,
            }
            .into());
        }

        self.counters.transactions += 1;
        self.counters.deposits += u64::from(record.is_deposit);
        self.counters.gas_used = self.counters.gas_used.saturating_add(total_gas_used);
        self.counters.surcharge_gas = self.counters.surcharge_gas.saturating_add(extra_gas_charged);
        self.in_flight = None;
        self.last_settled = Some(tx_hash);
        trace!(target: "rollup_exec::hooks", %tx_hash, total_gas_used, "end_tx");
        Ok(())
    }

    /// Forgets the in-flight record of `tx`, which the execution backend rejected without
    /// executing it.
    pub fn discard_tx(
        &mut self,
        tx: &RollupTransaction,
    ) -> Result<GasAccountingRecord, InvariantViolation> {
        let tx_hash = tx.hash();
        match self.in_flight {
            Some(record) if record.tx_hash == tx_hash => {
                self.in_flight = None;
                Ok(record)
            }
            Some(record) => Err(InvariantViolation::TransactionMismatch {
                expected: record.tx_hash,
                got: tx_hash,
            }),
            None => Err(InvariantViolation::NoTransactionInFlight { tx_hash }),
        }
    }

    /// Returns the counters of the finished block and resets them for the next one.
    pub fn take_block_counters(&mut self) -> BlockGasCounters {
        self.last_settled = None;
        core::mem::take(&mut self.counters)
    }
}

/// The gas every user transaction pays before executing any code.
pub fn intrinsic_gas(tx: &UserTransaction) -> u64 {
    let zero_bytes = tx.input.iter().filter(|byte| **byte == 0).count() as u64;
    let non_zero_bytes = tx.input.len() as u64 - zero_bytes;
    let create_gas = if tx.is_create() { CREATE } else { 0 };
    TX_BASE_GAS
        .saturating_add(create_gas)
        .saturating_add(zero_bytes.saturating_mul(TX_DATA_ZERO_GAS))
        .saturating_add(non_zero_bytes.saturating_mul(TX_DATA_NON_ZERO_GAS))
}

/// The number of L1 data units posting `tx` costs.
pub fn poster_units(tx: &RollupTransaction) -> u64 {
    (tx.encoded_len() as u64).saturating_mul(POSTER_UNITS_PER_BYTE)
}

/// Converts the L1 cost of `poster_units` into L2 gas at `base_fee`, saturating at `u64::MAX`.
///
/// Zero when the base fee is zero.
pub fn surcharge_gas(l1_price_per_unit: U256, poster_units: u64, base_fee: u128) -> u64 {
    if base_fee == 0 {
        return 0;
    }
    let poster_cost = l1_price_per_unit.saturating_mul(U256::from(poster_units));
    (poster_cost / U256::from(base_fee)).saturating_to()
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, bytes, Address, TxKind};

    use super::*;
    use crate::{test_utils::MemoryState, DepositTransaction, RollupState};

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
    const BASE_FEE: u128 = 100;

    fn user_tx(gas_limit: u64) -> RollupTransaction {
        RollupTransaction::User(UserTransaction {
            from: ALICE,
            gas_limit,
            to: TxKind::Call(Address::ZERO),
            input: bytes!("0x00ff00ff"),
            ..Default::default()
        })
    }

    fn state_with_price(price: u64) -> MemoryState {
        let mut state = MemoryState::default();
        RollupState::new(&mut state).set_l1_price_per_unit(U256::from(price)).unwrap();
        state
    }

    #[test]
    fn test_intrinsic_gas() {
        let RollupTransaction::User(tx) = user_tx(0) else { unreachable!() };
        assert_eq!(intrinsic_gas(&tx), 21_000 + 2 * 4 + 2 * 16);

        let create = UserTransaction { to: TxKind::Create, ..tx };
        assert_eq!(intrinsic_gas(&create), 21_000 + 32_000 + 2 * 4 + 2 * 16);
    }

    #[test]
    fn test_surcharge_is_poster_cost_over_base_fee() {
        assert_eq!(surcharge_gas(U256::from(10), 160, 100), 16);
        assert_eq!(surcharge_gas(U256::from(10), 160, 0), 0);
        assert_eq!(surcharge_gas(U256::MAX, 160, 1), u64::MAX);
    }

    #[test]
    fn test_start_then_end_settles() {
        let state = state_with_price(1_000);
        let tx = user_tx(1_000_000);
        let mut hooks = GasHookController::new(BASE_FEE);

        let extra = hooks.start_tx(&tx, &state).unwrap();
        assert_eq!(extra, surcharge_gas(U256::from(1_000), poster_units(&tx), BASE_FEE));
        assert!(extra > 0);

        hooks.end_tx(&tx, 30_000 + extra, extra).unwrap();
        assert!(hooks.in_flight().is_none());
        assert_eq!(
            hooks.take_block_counters(),
            BlockGasCounters {
                transactions: 1,
                deposits: 0,
                gas_used: 30_000 + extra,
                surcharge_gas: extra
            }
        );
        assert_eq!(hooks.counters(), &BlockGasCounters::default());
    }

    #[test]
    fn test_end_tx_is_idempotent() {
        let state = MemoryState::default();
        let tx = user_tx(100_000);
        let mut hooks = GasHookController::new(BASE_FEE);

        hooks.start_tx(&tx, &state).unwrap();
        hooks.end_tx(&tx, 21_040, 0).unwrap();
        hooks.end_tx(&tx, 21_040, 0).unwrap();
        assert_eq!(hooks.counters().transactions, 1);
    }

    #[test]
    fn test_insufficient_intrinsic_gas_keeps_no_record() {
        let state = state_with_price(1_000);
        let tx = user_tx(21_000);
        let mut hooks = GasHookController::new(BASE_FEE);

        let err = hooks.start_tx(&tx, &state).unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(
            err,
            HookError::InsufficientIntrinsicGas { provided: 21_000, required, .. }
                if required > 21_040
        ));
        assert!(hooks.in_flight().is_none());
    }

    #[test]
    fn test_out_of_order_hooks_are_violations() {
        let state = MemoryState::default();
        let first = user_tx(100_000);
        let second = user_tx(200_000);
        let mut hooks = GasHookController::new(BASE_FEE);

        assert!(matches!(
            hooks.end_tx(&first, 21_040, 0),
            Err(HookError::Invariant(InvariantViolation::NoTransactionInFlight { .. }))
        ));

        hooks.start_tx(&first, &state).unwrap();
        assert!(matches!(
            hooks.start_tx(&second, &state),
            Err(HookError::Invariant(InvariantViolation::HookOutOfOrder { .. }))
        ));
        assert!(matches!(
            hooks.end_tx(&second, 21_040, 0),
            Err(HookError::Invariant(InvariantViolation::TransactionMismatch { .. }))
        ));
    }

    #[test]
    fn test_accounting_mismatches_are_violations() {
        let state = state_with_price(1_000);
        let tx = user_tx(1_000_000);
        let mut hooks = GasHookController::new(BASE_FEE);
        let extra = hooks.start_tx(&tx, &state).unwrap();

        assert!(matches!(
            hooks.end_tx(&tx, 50_000, extra + 1),
            Err(HookError::Invariant(InvariantViolation::SurchargeMismatch { .. }))
        ));
        assert!(matches!(
            hooks.end_tx(&tx, extra - 1, extra),
            Err(HookError::Invariant(InvariantViolation::GasUsedBelowSurcharge { .. }))
        ));
        assert!(matches!(
            hooks.end_tx(&tx, 1_000_001, extra),
            Err(HookError::Invariant(InvariantViolation::GasUsedAboveLimit { .. }))
        ));
    }

    #[test]
    fn test_deposit_pays_no_surcharge() {
        let state = state_with_price(1_000);
        let tx = RollupTransaction::Deposit(DepositTransaction {
            to: ALICE,
            value: U256::from(1),
            ..Default::default()
        });
        let mut hooks = GasHookController::new(BASE_FEE);

        assert_eq!(hooks.start_tx(&tx, &state), Ok(0));
        hooks.end_tx(&tx, 0, 0).unwrap();
        assert_eq!(hooks.counters().deposits, 1);
    }

    #[test]
    fn test_discard_clears_record() {
        let state = MemoryState::default();
        let tx = user_tx(100_000);
        let mut hooks = GasHookController::new(BASE_FEE);

        hooks.start_tx(&tx, &state).unwrap();
        assert_eq!(hooks.discard_tx(&tx).map(|record| record.tx_hash), Ok(tx.hash()));
        assert!(hooks.in_flight().is_none());
        assert_eq!(hooks.counters().transactions, 0);
    }
}
