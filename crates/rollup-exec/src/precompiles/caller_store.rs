use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;

use super::{decode_call, ICallerStore::ICallerStoreCalls, PrecompileInput, PrecompileState};
use crate::{constants::cascade::CALLER_STORE_ADDRESS, PrecompileError, StateReader, StateWriter};

/// The slot holding `key` for `caller`: `keccak256(caller ++ key)`.
pub fn caller_store_slot(caller: Address, key: B256) -> U256 {
    let mut preimage = [0u8; 52];
    preimage[..20].copy_from_slice(caller.as_slice());
    preimage[20..].copy_from_slice(key.as_slice());
    U256::from_be_bytes(keccak256(preimage).0)
}

pub(super) fn call<S: StateWriter + ?Sized>(
    input: &PrecompileInput<'_>,
    state: &mut PrecompileState<'_, S>,
) -> Result<Bytes, PrecompileError> {
    let output = match decode_call::<ICallerStoreCalls>(input.input)? {
        ICallerStoreCalls::get(call) => {
            let slot = caller_store_slot(input.caller, call.key);
            let value = state.storage(CALLER_STORE_ADDRESS, slot)?;
            B256::from(value.to_be_bytes::<32>()).abi_encode()
        }
        ICallerStoreCalls::set(call) => {
            let slot = caller_store_slot(input.caller, call.key);
            let value = U256::from_be_bytes(call.value.0);
            state.writer()?.set_storage(CALLER_STORE_ADDRESS, slot, value)?;
            Vec::new()
        }
    };
    Ok(output.into())
}
