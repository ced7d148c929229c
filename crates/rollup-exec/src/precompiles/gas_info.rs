use alloy_primitives::Bytes;
use alloy_sol_types::SolValue;
use tracing::debug;

use super::{decode_call, IGasInfo::IGasInfoCalls, PrecompileEnv, PrecompileInput, PrecompileState};
use crate::{PrecompileError, RollupState, StateWriter};

pub(super) fn call<S: StateWriter + ?Sized>(
    input: &PrecompileInput<'_>,
    state: &mut PrecompileState<'_, S>,
    env: &PrecompileEnv,
) -> Result<Bytes, PrecompileError> {
    let output = match decode_call::<IGasInfoCalls>(input.input)? {
        IGasInfoCalls::l1PricePerUnit(_) => {
            RollupState::new(&*state).l1_price_per_unit()?.abi_encode()
        }
        IGasInfoCalls::totalSurchargeGas(_) => {
            RollupState::new(&*state).total_surcharge_gas()?.abi_encode()
        }
        IGasInfoCalls::setL1PricePerUnit(call) => {
            let writer = state.writer()?;
            if input.caller != env.chain_owner {
                return Err(PrecompileError::Unauthorized { caller: input.caller });
            }
            RollupState::new(writer).set_l1_price_per_unit(call.price)?;
            debug!(target: "rollup_exec::precompiles", price = %call.price, "Set L1 price");
            Vec::new()
        }
    };
    Ok(output.into())
}
