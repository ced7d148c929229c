//! Tests for inbox messages travelling from raw bytes to blocks.

use alloy_primitives::{address, bytes, keccak256, Address, TxKind, U256};
use rollup_exec::{
    apply_l1_to_l2_alias, split_message,
    test_utils::{user_tx, MemoryState, MockBackend},
    ChainConfig, DecodeError, DepositPayload, InboxMessage, L1CallPayload, MessageKind,
    RollupPipeline, RollupState, RollupTransaction, SegmentPayload, StateReader, TxBatchPayload,
};

const SEQUENCER: Address = address!("0x000000000000000000000000000000000000c0de");
const L1_CONTRACT: Address = address!("0x00000000000000000000000000000000000001a1");
const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
const BOB: Address = address!("0x000000000000000000000000000000000000b0b0");

fn batch() -> InboxMessage {
    InboxMessage::TxBatch(TxBatchPayload {
        timestamp: 100,
        coinbase: SEQUENCER,
        gas_limit: 0,
        txs: vec![user_tx(ALICE, 0, BOB)],
    })
}

fn l1_call() -> InboxMessage {
    InboxMessage::L1Call(L1CallPayload {
        timestamp: 101,
        l1_sender: L1_CONTRACT,
        to: TxKind::Call(BOB),
        value: U256::ZERO,
        gas_limit: 50_000,
        gas_price: 0,
        input: bytes!("0xc0ffee"),
    })
}

fn deposit() -> InboxMessage {
    InboxMessage::Deposit(DepositPayload {
        timestamp: 102,
        l1_sender: L1_CONTRACT,
        to: BOB,
        value: U256::from(10),
        deposit_id: 4,
    })
}

#[test]
fn test_decoded_payloads_match_encoded_ones() {
    let raw = InboxMessage::Bundle(vec![batch(), l1_call(), deposit()]).encode();
    let segments = split_message(&raw).unwrap();

    let kinds: Vec<_> = segments.iter().map(|segment| segment.payload.kind()).collect();
    assert_eq!(kinds, vec![MessageKind::TxBatch, MessageKind::L1Call, MessageKind::Deposit]);
    assert!(segments.iter().all(|segment| segment.origin.message_hash == keccak256(&raw)));

    let payloads: Vec<_> = segments.into_iter().map(|segment| segment.payload).collect();
    let InboxMessage::TxBatch(sent_batch) = batch() else { unreachable!() };
    let InboxMessage::L1Call(sent_call) = l1_call() else { unreachable!() };
    let InboxMessage::Deposit(sent_deposit) = deposit() else { unreachable!() };
    // Senders stay unaliased until assembly.
    assert_eq!(
        payloads,
        vec![
            SegmentPayload::TxBatch(sent_batch),
            SegmentPayload::L1Call(sent_call),
            SegmentPayload::Deposit(sent_deposit),
        ]
    );
}

#[test]
fn test_bundle_becomes_one_block_per_segment() {
    let mut pipeline = RollupPipeline::new(ChainConfig::default()).unwrap();
    let mut state = MemoryState::default();
    let mut backend = MockBackend::default();

    let raw = InboxMessage::Bundle(vec![batch(), l1_call(), deposit()]).encode();
    let blocks = pipeline.process_message(&raw, &mut state, &mut backend).unwrap();

    assert_eq!(blocks.len(), 3);
    assert_eq!(
        blocks.iter().map(|block| block.header.number).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(
        blocks.iter().map(|block| block.origin.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    let aliased = apply_l1_to_l2_alias(L1_CONTRACT);
    assert!(matches!(
        &blocks[1].transactions[..],
        [RollupTransaction::User(tx)] if tx.from == aliased && tx.nonce == 0
    ));
    assert_eq!(blocks[1].header.beneficiary, Address::ZERO);
    assert_eq!(state.nonce(aliased), Ok(1));
    assert_eq!(state.balance(BOB), Ok(U256::from(10)));

    let rollup = RollupState::new(&state);
    assert_eq!(rollup.block_count(), Ok(3));
    assert_eq!(rollup.message_count(), Ok(1));
    assert_eq!(rollup.deposit_count(), Ok(1));
    assert_eq!(rollup.last_block_timestamp(), Ok(102));
}

#[test]
fn test_malformed_bundle_child_rejects_whole_message() {
    let mut bad_deposit = deposit().encode().to_vec();
    bad_deposit.push(0x00);
    let children = vec![batch().encode(), bad_deposit.into()];

    let mut raw = vec![MessageKind::Bundle as u8];
    alloy_rlp::Encodable::encode(&children, &mut raw);

    assert_eq!(
        split_message(&raw),
        Err(DecodeError::TrailingBytes { kind: MessageKind::Deposit as u8, remaining: 1 })
    );
}

#[test]
fn test_unknown_kind_is_reported() {
    assert_eq!(split_message(&[0x09]), Err(DecodeError::UnknownKind(0x09)));
    assert_eq!(split_message(&[]), Err(DecodeError::Empty));
}
