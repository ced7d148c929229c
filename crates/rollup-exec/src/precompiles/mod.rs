//! The rollup precompiles and their dispatch.
//!
//! The set of precompiles is closed and resolved once per [`RollupSpecId`]. Every call is priced
//! before its body runs. Errors of a call are turned into a revert carrying an `Error(string)`
//! payload and never escape to the node.

mod caller_store;
mod gas_info;
mod interfaces;
mod system;
mod util;

pub use caller_store::caller_store_slot;
pub use interfaces::*;

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{Revert, SolCall, SolError, SolInterface};
use delegate::delegate;
use tracing::debug;

use crate::{
    constants::{
        cascade::CALLER_STORE_ADDRESS,
        origin::{
            GAS_INFO_ADDRESS, PRECOMPILE_BASE_GAS, PRECOMPILE_WORD_GAS, ROLLUP_SYS_ADDRESS,
            ROLLUP_UTIL_ADDRESS, SSTORE_SET,
        },
    },
    ChainConfig, PrecompileError, RollupSpecId, StateError, StateReader, StateWriter,
};

/// A call into a precompile.
#[derive(Debug, Clone, Copy)]
pub struct PrecompileInput<'a> {
    /// The call data.
    pub input: &'a [u8],
    /// The address whose code runs, i.e. the precompile.
    pub precompile_address: Address,
    /// The account the code runs as. Differs from `precompile_address` under `DELEGATECALL` and
    /// `CALLCODE`.
    pub acting_as: Address,
    /// The immediate caller.
    pub caller: Address,
    /// The value sent along.
    pub value: U256,
    /// Whether the call runs in a static context.
    pub read_only: bool,
}

impl<'a> PrecompileInput<'a> {
    /// A plain `CALL` from `caller` to `precompile`.
    pub const fn call(precompile: Address, caller: Address, input: &'a [u8]) -> Self {
        Self {
            input,
            precompile_address: precompile,
            acting_as: precompile,
            caller,
            value: U256::ZERO,
            read_only: false,
        }
    }

    /// Whether the precompile code runs on behalf of another account.
    pub fn is_delegated(&self) -> bool {
        self.precompile_address != self.acting_as
    }
}

/// Chain parameters visible to precompiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecompileEnv {
    /// The chain id.
    pub chain_id: u64,
    /// The account allowed to call owner-only methods.
    pub chain_owner: Address,
}

impl From<&ChainConfig> for PrecompileEnv {
    fn from(config: &ChainConfig) -> Self {
        Self { chain_id: config.chain_id, chain_owner: config.chain_owner }
    }
}

/// The state as seen by a precompile. Writes are refused in a static context.
#[derive(Debug)]
pub struct PrecompileState<'a, S: ?Sized> {
    inner: &'a mut S,
    read_only: bool,
}

impl<'a, S: StateWriter + ?Sized> PrecompileState<'a, S> {
    /// Wraps `inner` for one call.
    pub fn new(inner: &'a mut S, read_only: bool) -> Self {
        Self { inner, read_only }
    }

    /// Write access to the state, refused with [`PrecompileError::WriteProtection`] in a static
    /// context.
    pub fn writer(&mut self) -> Result<&mut S, PrecompileError> {
        if self.read_only {
            return Err(PrecompileError::WriteProtection);
        }
        Ok(&mut *self.inner)
    }
}

impl<S: StateWriter + ?Sized> StateReader for PrecompileState<'_, S> {
    delegate! {
        to self.inner {
            fn balance(&self, address: Address) -> Result<U256, StateError>;
            fn nonce(&self, address: Address) -> Result<u64, StateError>;
            fn storage(&self, address: Address, slot: U256) -> Result<U256, StateError>;
        }
    }
}

/// The installed precompiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollupPrecompile {
    /// `RollupSys`: the rollup bookkeeping.
    Sys,
    /// `RollupUtil`: stateless helpers.
    Util,
    /// `GasInfo`: L1 data pricing.
    GasInfo,
    /// `CallerStore`: a per-caller key-value store.
    CallerStore,
}

impl RollupPrecompile {
    /// Every precompile, in address order.
    pub const ALL: [Self; 4] = [Self::Sys, Self::Util, Self::CallerStore, Self::GasInfo];

    /// The reserved address of the precompile.
    pub const fn address(self) -> Address {
        match self {
            Self::Sys => ROLLUP_SYS_ADDRESS,
            Self::Util => ROLLUP_UTIL_ADDRESS,
            Self::GasInfo => GAS_INFO_ADDRESS,
            Self::CallerStore => CALLER_STORE_ADDRESS,
        }
    }

    /// The spec activating the precompile.
    pub const fn activation(self) -> RollupSpecId {
        match self {
            Self::Sys | Self::Util | Self::GasInfo => RollupSpecId::ORIGIN,
            Self::CallerStore => RollupSpecId::CASCADE,
        }
    }

    /// Whether the output depends on the input alone.
    pub const fn is_pure(self) -> bool {
        matches!(self, Self::Util)
    }

    /// The gas charged for a call with `input`, before the call runs.
    pub fn gas_to_charge(self, input: &[u8]) -> u64 {
        let words = (input.len() as u64).div_ceil(32);
        let gas = PRECOMPILE_BASE_GAS.saturating_add(words.saturating_mul(PRECOMPILE_WORD_GAS));
        if self.is_setter(input) {
            gas.saturating_add(SSTORE_SET)
        } else {
            gas
        }
    }

    fn is_setter(self, input: &[u8]) -> bool {
        let Some(selector) = selector(input) else { return false };
        match self {
            Self::GasInfo => selector == IGasInfo::setL1PricePerUnitCall::SELECTOR,
            Self::CallerStore => selector == ICallerStore::setCall::SELECTOR,
            Self::Sys | Self::Util => false,
        }
    }

    /// Runs the precompile body.
    ///
    /// State-dependent precompiles refuse delegated calls, since `caller` cannot be trusted when
    /// the code runs as another account. No precompile method accepts value.
    pub fn call<S: StateWriter + ?Sized>(
        self,
        input: &PrecompileInput<'_>,
        state: &mut PrecompileState<'_, S>,
        env: &PrecompileEnv,
    ) -> Result<Bytes, PrecompileError> {
        if !self.is_pure() && input.is_delegated() {
            return Err(PrecompileError::UnsafeDelegatedCall {
                precompile: input.precompile_address,
                acting_as: input.acting_as,
            });
        }
        if !input.value.is_zero() {
            return Err(PrecompileError::NonPayable { value: input.value });
        }

        match self {
            Self::Sys => system::call(input, state, env),
            Self::Util => util::call(input),
            Self::GasInfo => gas_info::call(input, state, env),
            Self::CallerStore => caller_store::call(input, state),
        }
    }
}

/// Result of a precompile call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrecompileOutcome {
    /// The call succeeded.
    Success {
        /// Gas charged.
        gas_used: u64,
        /// Return data.
        output: Bytes,
    },
    /// The call reverted. Any state change is discarded.
    Revert {
        /// Gas charged.
        gas_used: u64,
        /// ABI encoded `Error(string)`.
        output: Bytes,
        /// Why the call failed.
        reason: PrecompileError,
    },
    /// The call was not run because its price exceeds the available gas. All gas is consumed.
    OutOfGas {
        /// The available gas.
        gas_limit: u64,
    },
}

impl PrecompileOutcome {
    /// Gas consumed by the call.
    pub const fn gas_used(&self) -> u64 {
        match self {
            Self::Success { gas_used, .. } | Self::Revert { gas_used, .. } => *gas_used,
            Self::OutOfGas { gas_limit } => *gas_limit,
        }
    }

    /// Whether the call succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// The precompiles installed for one spec, keyed by address.
#[derive(Debug, Clone)]
pub struct PrecompileSet {
    spec: RollupSpecId,
    env: PrecompileEnv,
    precompiles: BTreeMap<Address, RollupPrecompile>,
}

impl PrecompileSet {
    /// Installs the precompiles active in `spec`.
    pub fn new_with_spec(spec: RollupSpecId, env: PrecompileEnv) -> Self {
        let precompiles = RollupPrecompile::ALL
            .into_iter()
            .filter(|precompile| spec.is_enabled_in(precompile.activation()))
            .map(|precompile| (precompile.address(), precompile))
            .collect();
        Self { spec, env, precompiles }
    }

    /// The spec the set was built for.
    pub const fn spec(&self) -> RollupSpecId {
        self.spec
    }

    /// The chain parameters passed to precompiles.
    pub const fn env(&self) -> &PrecompileEnv {
        &self.env
    }

    /// Whether `address` hosts a precompile.
    pub fn contains(&self, address: &Address) -> bool {
        self.precompiles.contains_key(address)
    }

    /// The precompile at `address`.
    pub fn get(&self, address: &Address) -> Option<RollupPrecompile> {
        self.precompiles.get(address).copied()
    }

    /// The reserved addresses, in ascending order.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.precompiles.keys()
    }

    /// Runs the precompile at `input.precompile_address` with `gas_limit` gas.
    ///
    /// Returns `None` when no precompile is installed there. State changes of a reverted call are
    /// rolled back by the caller along with the rest of the call frame.
    pub fn run<S: StateWriter + ?Sized>(
        &self,
        input: &PrecompileInput<'_>,
        gas_limit: u64,
        state: &mut S,
    ) -> Option<PrecompileOutcome> {
        let precompile = self.get(&input.precompile_address)?;
        let gas_used = precompile.gas_to_charge(input.input);
        if gas_used > gas_limit {
            return Some(PrecompileOutcome::OutOfGas { gas_limit });
        }

        let mut state = PrecompileState::new(state, input.read_only);
        Some(match precompile.call(input, &mut state, &self.env) {
            Ok(output) => PrecompileOutcome::Success { gas_used, output },
            Err(reason) => {
                debug!(
                    target: "rollup_exec::precompiles",
                    precompile = ?precompile,
                    caller = %input.caller,
                    %reason,
                    "Precompile call reverted"
                );
                PrecompileOutcome::Revert { gas_used, output: revert_output(&reason), reason }
            }
        })
    }
}

/// ABI encodes `reason` as `Error(string)`.
pub fn revert_output(reason: &PrecompileError) -> Bytes {
    Revert { reason: reason.to_string() }.abi_encode().into()
}

fn selector(input: &[u8]) -> Option<[u8; 4]> {
    input.get(..4)?.try_into().ok()
}

/// Decodes the call data of a precompile interface.
fn decode_call<I: SolInterface>(input: &[u8]) -> Result<I, PrecompileError> {
    let selector = selector(input)
        .ok_or_else(|| PrecompileError::InvalidInput("input shorter than a selector".into()))?;
    if !I::valid_selector(selector) {
        return Err(PrecompileError::UnknownSelector(selector.into()));
    }
    I::abi_decode(input).map_err(|err| PrecompileError::InvalidInput(err.to_string()))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;
    use crate::test_utils::MemoryState;

    const CALLER: Address = address!("0x0000000000000000000000000000000000100000");

    fn set(spec: RollupSpecId) -> PrecompileSet {
        PrecompileSet::new_with_spec(spec, PrecompileEnv::from(&ChainConfig::default()))
    }

    #[test]
    fn test_spec_gates_precompiles() {
        let origin = set(RollupSpecId::ORIGIN);
        assert!(origin.contains(&ROLLUP_SYS_ADDRESS));
        assert!(!origin.contains(&CALLER_STORE_ADDRESS));

        let cascade = set(RollupSpecId::CASCADE);
        assert_eq!(
            cascade.addresses().copied().collect::<Vec<_>>(),
            vec![ROLLUP_SYS_ADDRESS, ROLLUP_UTIL_ADDRESS, CALLER_STORE_ADDRESS, GAS_INFO_ADDRESS]
        );
    }

    #[test]
    fn test_pricing() {
        let read = IRollupSys::blockCountCall {}.abi_encode();
        assert_eq!(RollupPrecompile::Sys.gas_to_charge(&read), 100 + 3);

        let write = ICallerStore::setCall { key: Default::default(), value: Default::default() }
            .abi_encode();
        assert_eq!(RollupPrecompile::CallerStore.gas_to_charge(&write), 100 + 3 * 3 + 20_000);
        assert_eq!(RollupPrecompile::Util.gas_to_charge(&[]), 100);
    }

    #[test]
    fn test_non_reserved_address_is_not_handled() {
        let mut state = MemoryState::default();
        let input = PrecompileInput::call(Address::ZERO, CALLER, &[]);
        assert_eq!(set(RollupSpecId::CASCADE).run(&input, u64::MAX, &mut state), None);
    }

    #[test]
    fn test_out_of_gas_does_not_run_body() {
        let mut state = MemoryState::default();
        let data = IRollupSys::blockCountCall {}.abi_encode();
        let input = PrecompileInput::call(ROLLUP_SYS_ADDRESS, CALLER, &data);
        assert_eq!(
            set(RollupSpecId::ORIGIN).run(&input, 102, &mut state),
            Some(PrecompileOutcome::OutOfGas { gas_limit: 102 })
        );
    }

    #[test]
    fn test_value_is_refused() {
        let mut state = MemoryState::default();
        let data = IRollupSys::chainIdCall {}.abi_encode();
        let input = PrecompileInput {
            value: U256::from(1),
            ..PrecompileInput::call(ROLLUP_SYS_ADDRESS, CALLER, &data)
        };
        let outcome = set(RollupSpecId::ORIGIN).run(&input, 1_000, &mut state).unwrap();
        assert!(matches!(
            outcome,
            PrecompileOutcome::Revert { reason: PrecompileError::NonPayable { .. }, .. }
        ));
    }

    #[test]
    fn test_unknown_selector_and_short_input() {
        let mut state = MemoryState::default();
        let precompiles = set(RollupSpecId::ORIGIN);

        let input = PrecompileInput::call(ROLLUP_SYS_ADDRESS, CALLER, &[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(
            precompiles.run(&input, 1_000, &mut state),
            Some(PrecompileOutcome::Revert { reason: PrecompileError::UnknownSelector(_), .. })
        ));

        let input = PrecompileInput::call(ROLLUP_SYS_ADDRESS, CALLER, &[0x01]);
        assert!(matches!(
            precompiles.run(&input, 1_000, &mut state),
            Some(PrecompileOutcome::Revert { reason: PrecompileError::InvalidInput(_), .. })
        ));
    }

    #[test]
    fn test_revert_output_is_error_string() {
        let output = revert_output(&PrecompileError::WriteProtection);
        assert_eq!(&output[..4], Revert::SELECTOR.as_slice());
        assert_eq!(
            Revert::abi_decode(&output).ok().map(|revert| revert.reason),
            Some("write protection".to_string())
        );
    }
}
