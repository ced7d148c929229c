//! Tests for the precompile dispatcher: spec gating, delegated calls and static contexts.

use alloy_primitives::{address, keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use rollup_exec::{
    caller_store_slot,
    constants::{
        cascade::CALLER_STORE_ADDRESS,
        origin::{GAS_INFO_ADDRESS, ROLLUP_SYS_ADDRESS, ROLLUP_UTIL_ADDRESS},
    },
    test_utils::{call_tx, tx_batch_message, MemoryState, MockBackend},
    ChainConfig, ICallerStore, IGasInfo, IRollupSys, IRollupUtil, PrecompileError,
    PrecompileInput, PrecompileOutcome, PrecompileSet, RollupPipeline, RollupSpecId, RollupState,
    StateReader,
};
use rstest::rstest;

const OWNER: Address = address!("0x00000000000000000000000000000000000000aa");
const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
const PROXY: Address = address!("0x0000000000000000000000000000000000001234");
const SEQUENCER: Address = address!("0x000000000000000000000000000000000000c0de");

fn config(spec: RollupSpecId) -> ChainConfig {
    ChainConfig { spec, chain_owner: OWNER, ..Default::default() }
}

fn precompiles(spec: RollupSpecId) -> PrecompileSet {
    PrecompileSet::new_with_spec(spec, (&config(spec)).into())
}

fn delegated<'a>(precompile: Address, caller: Address, input: &'a [u8]) -> PrecompileInput<'a> {
    PrecompileInput { acting_as: PROXY, ..PrecompileInput::call(precompile, caller, input) }
}

#[rstest]
#[case::origin(RollupSpecId::ORIGIN, &[ROLLUP_SYS_ADDRESS, ROLLUP_UTIL_ADDRESS, GAS_INFO_ADDRESS])]
#[case::cascade(
    RollupSpecId::CASCADE,
    &[ROLLUP_SYS_ADDRESS, ROLLUP_UTIL_ADDRESS, CALLER_STORE_ADDRESS, GAS_INFO_ADDRESS]
)]
fn test_installed_addresses(#[case] spec: RollupSpecId, #[case] expected: &[Address]) {
    let set = precompiles(spec);
    assert_eq!(set.spec(), spec);
    assert_eq!(set.addresses().copied().collect::<Vec<_>>(), expected);
}

#[rstest]
#[case::sys(ROLLUP_SYS_ADDRESS, IRollupSys::blockCountCall {}.abi_encode())]
#[case::gas_info(GAS_INFO_ADDRESS, IGasInfo::l1PricePerUnitCall {}.abi_encode())]
#[case::caller_store(
    CALLER_STORE_ADDRESS,
    ICallerStore::getCall { key: B256::ZERO }.abi_encode()
)]
fn test_delegated_call_is_refused(
    #[case] precompile: Address,
    #[case] data: Vec<u8>,
    #[values(OWNER, ALICE, PROXY)] caller: Address,
) {
    let mut state = MemoryState::default();
    let input = delegated(precompile, caller, &data);

    let outcome = precompiles(RollupSpecId::CASCADE).run(&input, 100_000, &mut state).unwrap();
    assert!(matches!(
        outcome,
        PrecompileOutcome::Revert {
            reason: PrecompileError::UnsafeDelegatedCall { precompile: p, acting_as },
            ..
        } if p == precompile && acting_as == PROXY
    ));
}

#[test]
fn test_pure_precompile_allows_delegation() {
    let mut state = MemoryState::default();
    let data = IRollupUtil::keccakCall { data: Bytes::from_static(b"abc") }.abi_encode();
    let input = delegated(ROLLUP_UTIL_ADDRESS, ALICE, &data);

    let outcome = precompiles(RollupSpecId::ORIGIN).run(&input, 100_000, &mut state).unwrap();
    assert!(matches!(
        outcome,
        PrecompileOutcome::Success { output, .. }
            if B256::abi_decode(&output).ok() == Some(keccak256(b"abc"))
    ));
}

#[test]
fn test_static_context_refuses_writes() {
    let mut state = MemoryState::default();
    let data = IGasInfo::setL1PricePerUnitCall { price: U256::from(7) }.abi_encode();
    let input = PrecompileInput {
        read_only: true,
        ..PrecompileInput::call(GAS_INFO_ADDRESS, OWNER, &data)
    };

    let outcome = precompiles(RollupSpecId::ORIGIN).run(&input, 100_000, &mut state).unwrap();
    assert!(matches!(
        outcome,
        PrecompileOutcome::Revert { reason: PrecompileError::WriteProtection, .. }
    ));
    assert_eq!(RollupState::new(&state).l1_price_per_unit(), Ok(U256::ZERO));
}

#[test]
fn test_static_context_allows_reads() {
    let mut state = MemoryState::default();
    let chain_id = U256::from(config(RollupSpecId::ORIGIN).chain_id);
    let data = IRollupSys::chainIdCall {}.abi_encode();
    let input = PrecompileInput {
        read_only: true,
        ..PrecompileInput::call(ROLLUP_SYS_ADDRESS, ALICE, &data)
    };

    let outcome = precompiles(RollupSpecId::ORIGIN).run(&input, 100_000, &mut state).unwrap();
    assert!(matches!(
        outcome,
        PrecompileOutcome::Success { output, .. }
            if U256::abi_decode(&output).ok() == Some(chain_id)
    ));
}

#[test]
fn test_caller_store_is_gated_by_spec() {
    let mut state = MemoryState::default();
    let data = ICallerStore::getCall { key: B256::ZERO }.abi_encode();
    let input = PrecompileInput::call(CALLER_STORE_ADDRESS, ALICE, &data);

    assert!(precompiles(RollupSpecId::ORIGIN).run(&input, 100_000, &mut state).is_none());
    assert!(precompiles(RollupSpecId::CASCADE).run(&input, 100_000, &mut state).is_some());
}

#[test]
fn test_caller_store_through_pipeline() {
    let mut pipeline = RollupPipeline::new(config(RollupSpecId::CASCADE)).unwrap();
    let mut state = MemoryState::default();
    let mut backend = MockBackend::default();
    let key = B256::repeat_byte(0x01);
    let value = B256::repeat_byte(0x02);
    let data = ICallerStore::setCall { key, value }.abi_encode();

    let raw = tx_batch_message(1, SEQUENCER, vec![call_tx(ALICE, 0, CALLER_STORE_ADDRESS, data)]);
    let blocks = pipeline.process_message(&raw, &mut state, &mut backend).unwrap();

    assert!(blocks[0].receipts[0].status.coerce_status());
    assert_eq!(
        state.storage(CALLER_STORE_ADDRESS, caller_store_slot(ALICE, key)),
        Ok(U256::from_be_bytes(value.0))
    );
}

#[test]
fn test_delegated_call_through_pipeline_reverts() {
    let mut pipeline = RollupPipeline::new(config(RollupSpecId::ORIGIN)).unwrap();
    let mut state = MemoryState::default();
    let mut backend = MockBackend::default().with_delegation(PROXY, GAS_INFO_ADDRESS);
    let data = IGasInfo::setL1PricePerUnitCall { price: U256::from(9) }.abi_encode();

    let raw = tx_batch_message(1, SEQUENCER, vec![call_tx(OWNER, 0, PROXY, data)]);
    let blocks = pipeline.process_message(&raw, &mut state, &mut backend).unwrap();

    assert_eq!(blocks[0].transactions.len(), 1);
    assert!(!blocks[0].receipts[0].status.coerce_status());
    assert_eq!(RollupState::new(&state).l1_price_per_unit(), Ok(U256::ZERO));
    assert_eq!(state.nonce(OWNER), Ok(1));
}
