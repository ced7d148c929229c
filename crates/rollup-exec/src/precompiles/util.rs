use alloy_primitives::{keccak256, Bytes};
use alloy_sol_types::SolValue;

use super::{decode_call, IRollupUtil::IRollupUtilCalls, PrecompileInput};
use crate::{apply_l1_to_l2_alias, PrecompileError};

/// `RollupUtil` only looks at its input, so it does not care who it runs as.
pub(super) fn call(input: &PrecompileInput<'_>) -> Result<Bytes, PrecompileError> {
    let output = match decode_call::<IRollupUtilCalls>(input.input)? {
        IRollupUtilCalls::keccak(call) => keccak256(&call.data).abi_encode(),
        IRollupUtilCalls::l1ToL2Alias(call) => apply_l1_to_l2_alias(call.l1Address).abi_encode(),
    };
    Ok(output.into())
}
