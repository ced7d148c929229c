use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolValue;

use super::{
    decode_call, IRollupSys::IRollupSysCalls, PrecompileEnv, PrecompileInput, PrecompileState,
};
use crate::{PrecompileError, RollupState, StateWriter};

pub(super) fn call<S: StateWriter + ?Sized>(
    input: &PrecompileInput<'_>,
    state: &mut PrecompileState<'_, S>,
    env: &PrecompileEnv,
) -> Result<Bytes, PrecompileError> {
    let rollup = RollupState::new(&*state);
    let value = match decode_call::<IRollupSysCalls>(input.input)? {
        IRollupSysCalls::blockCount(_) => U256::from(rollup.block_count()?),
        IRollupSysCalls::messageCount(_) => U256::from(rollup.message_count()?),
        IRollupSysCalls::lastBlockTimestamp(_) => U256::from(rollup.last_block_timestamp()?),
        IRollupSysCalls::chainId(_) => U256::from(env.chain_id),
    };
    Ok(value.abi_encode().into())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;
    use alloy_sol_types::SolCall;

    use super::*;
    use crate::{
        constants::origin::ROLLUP_SYS_ADDRESS, test_utils::MemoryState, ChainConfig, IRollupSys,
        PrecompileOutcome, PrecompileSet, RollupSpecId,
    };

    fn read(precompiles: &PrecompileSet, state: &mut MemoryState, data: &[u8]) -> Option<U256> {
        let input = PrecompileInput::call(ROLLUP_SYS_ADDRESS, Address::ZERO, data);
        match precompiles.run(&input, 1_000, state)? {
            PrecompileOutcome::Success { output, .. } => U256::abi_decode(&output).ok(),
            _ => None,
        }
    }

    #[test]
    fn test_reads_bookkeeping() {
        let mut state = MemoryState::default();
        RollupState::new(&mut state).set_block_count(7).unwrap();
        RollupState::new(&mut state).set_last_block(6, 1_234).unwrap();
        let config = ChainConfig { chain_id: 99, ..Default::default() };
        let precompiles = PrecompileSet::new_with_spec(RollupSpecId::ORIGIN, (&config).into());

        let block_count = IRollupSys::blockCountCall {}.abi_encode();
        assert_eq!(read(&precompiles, &mut state, &block_count), Some(U256::from(7)));

        let timestamp = IRollupSys::lastBlockTimestampCall {}.abi_encode();
        assert_eq!(read(&precompiles, &mut state, &timestamp), Some(U256::from(1_234)));

        let chain_id = IRollupSys::chainIdCall {}.abi_encode();
        assert_eq!(read(&precompiles, &mut state, &chain_id), Some(U256::from(99)));
    }
}
