use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, Bytes, TxKind, B256, U256};

use crate::{
    intrinsic_gas, ExecutionBackend, ExecutionError, ExecutionOutcome, PrecompileInput,
    PrecompileOutcome, PrecompileSet, RollupBlockEnv, RollupTransaction, StateError, StateWriter,
    TxGasEnv,
};

/// An execution backend for testing purposes.
///
/// Deposits mint their value. User transactions pay intrinsic gas plus the surcharge, transfer
/// their value and, when they target a precompile, run it with the gas left. A proxy registered
/// with [`MockBackend::with_delegation`] forwards its calls to a precompile through a delegated
/// call, so the precompile runs as the proxy.
#[derive(Debug, Default, Clone)]
pub struct MockBackend {
    delegations: BTreeMap<Address, Address>,
    rejected: BTreeSet<B256>,
    fatal: BTreeSet<B256>,
    /// Hashes of the executed transactions, in order.
    pub executed: Vec<B256>,
}

impl MockBackend {
    /// Makes calls to `proxy` delegate to `precompile`.
    pub fn with_delegation(mut self, proxy: Address, precompile: Address) -> Self {
        self.delegations.insert(proxy, precompile);
        self
    }

    /// Rejects the transaction with `hash` without executing it.
    pub fn rejecting(mut self, hash: B256) -> Self {
        self.rejected.insert(hash);
        self
    }

    /// Fails fatally on the transaction with `hash`.
    pub fn failing_on(mut self, hash: B256) -> Self {
        self.fatal.insert(hash);
        self
    }
}

impl ExecutionBackend for MockBackend {
    fn execute_transaction<S: StateWriter>(
        &mut self,
        tx: &RollupTransaction,
        block: &RollupBlockEnv,
        gas: &TxGasEnv,
        state: &mut S,
        precompiles: &PrecompileSet,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let tx_hash = tx.hash();
        if self.fatal.contains(&tx_hash) {
            return Err(ExecutionError::Fatal("injected failure".into()));
        }
        if self.rejected.contains(&tx_hash) {
            return Err(ExecutionError::Rejected("injected rejection".into()));
        }

        let outcome = match tx {
            RollupTransaction::Deposit(deposit) => {
                let balance = state.balance(deposit.to).map_err(fatal)?;
                state.set_balance(deposit.to, balance + deposit.value).map_err(fatal)?;
                ExecutionOutcome { success: true, ..Default::default() }
            }
            RollupTransaction::User(user) => {
                let nonce = state.nonce(user.from).map_err(fatal)?;
                if nonce != user.nonce {
                    return Err(ExecutionError::Rejected(format!(
                        "nonce mismatch: expected {nonce}, got {}",
                        user.nonce
                    )));
                }
                let balance = state.balance(user.from).map_err(fatal)?;
                let max_fee = U256::from(user.gas_limit) * U256::from(user.gas_price);
                if balance < max_fee + user.value {
                    return Err(ExecutionError::Rejected("insufficient funds".into()));
                }
                state.set_nonce(user.from, nonce + 1).map_err(fatal)?;

                let mut gas_used = gas.extra_gas + intrinsic_gas(user);
                let mut success = true;
                let mut output = Bytes::new();
                match user.to {
                    TxKind::Call(to) => {
                        let code_address = self.delegations.get(&to).copied().unwrap_or(to);
                        let input = PrecompileInput {
                            input: &user.input,
                            precompile_address: code_address,
                            acting_as: to,
                            caller: user.from,
                            value: user.value,
                            read_only: false,
                        };
                        let gas_left = gas.gas_limit.saturating_sub(gas_used);
                        if let Some(result) = precompiles.run(&input, gas_left, state) {
                            gas_used += result.gas_used();
                            success = result.is_success();
                            output = match result {
                                PrecompileOutcome::Success { output, .. } |
                                PrecompileOutcome::Revert { output, .. } => output,
                                PrecompileOutcome::OutOfGas { .. } => Bytes::new(),
                            };
                        } else if !user.value.is_zero() {
                            transfer(state, user.from, to, user.value).map_err(fatal)?;
                        }
                    }
                    TxKind::Create => {}
                }

                let fee = U256::from(gas_used) * U256::from(user.gas_price);
                transfer(state, user.from, block.coinbase, fee).map_err(fatal)?;
                ExecutionOutcome { success, gas_used, output, logs: Vec::new() }
            }
        };

        self.executed.push(tx_hash);
        Ok(outcome)
    }
}

fn transfer<S: StateWriter>(
    state: &mut S,
    from: Address,
    to: Address,
    value: U256,
) -> Result<(), StateError> {
    if value.is_zero() {
        return Ok(());
    }
    let from_balance = state.balance(from)?;
    state.set_balance(from, from_balance.saturating_sub(value))?;
    let to_balance = state.balance(to)?;
    state.set_balance(to, to_balance + value)
}

fn fatal(err: StateError) -> ExecutionError {
    ExecutionError::Fatal(err.to_string())
}
