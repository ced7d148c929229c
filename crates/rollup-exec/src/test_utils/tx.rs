use alloy_primitives::{Address, Bytes, TxKind, U256};

use crate::{DepositPayload, InboxMessage, TxBatchPayload, UserTransaction};

/// Gas limit of transactions built by [`user_tx`].
pub const USER_TX_GAS_LIMIT: u64 = 100_000;

/// A plain call from `from` to `to` with no value and no input.
pub fn user_tx(from: Address, nonce: u64, to: Address) -> UserTransaction {
    UserTransaction {
        from,
        nonce,
        gas_price: 0,
        gas_limit: USER_TX_GAS_LIMIT,
        to: TxKind::Call(to),
        value: U256::ZERO,
        input: Bytes::new(),
    }
}

/// A call from `from` to `to` carrying `input`.
pub fn call_tx(from: Address, nonce: u64, to: Address, input: impl Into<Bytes>) -> UserTransaction {
    UserTransaction { input: input.into(), ..user_tx(from, nonce, to) }
}

/// A transaction batch message.
pub fn tx_batch_message(timestamp: u64, coinbase: Address, txs: Vec<UserTransaction>) -> Bytes {
    InboxMessage::TxBatch(TxBatchPayload { timestamp, coinbase, gas_limit: 0, txs }).encode()
}

/// A deposit message.
pub fn deposit_message(
    timestamp: u64,
    l1_sender: Address,
    to: Address,
    value: U256,
    deposit_id: u64,
) -> Bytes {
    InboxMessage::Deposit(DepositPayload { timestamp, l1_sender, to, value, deposit_id }).encode()
}
