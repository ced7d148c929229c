//! Transactions produced by the block assembler.

use alloy_primitives::{keccak256, Address, Bytes, TxKind, B256, U256};
use alloy_rlp::{Encodable, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

/// Type byte of a user transaction.
pub const USER_TX_TYPE: u8 = 0x00;

/// Type byte of a deposit transaction.
pub const DEPOSIT_TX_TYPE: u8 = 0x7e;

/// A transaction submitted by an L2 user through a transaction batch, or synthesized from an L1
/// call.
///
/// The sender is explicit. Signatures are checked before a message reaches the pipeline.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Default, RlpEncodable, RlpDecodable, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct UserTransaction {
    /// The sender.
    pub from: Address,
    /// The sender nonce.
    pub nonce: u64,
    /// The price per unit of gas, in wei.
    pub gas_price: u128,
    /// The declared gas limit.
    pub gas_limit: u64,
    /// The recipient, or contract creation.
    pub to: TxKind,
    /// The value transferred.
    pub value: U256,
    /// The call data or init code.
    pub input: Bytes,
}

impl UserTransaction {
    /// Whether the transaction deploys a contract.
    pub const fn is_create(&self) -> bool {
        matches!(self.to, TxKind::Create)
    }
}

/// A transaction minting L1-deposited value on L2. It carries no gas and cannot fail.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Default, RlpEncodable, RlpDecodable, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct DepositTransaction {
    /// The aliased L1 sender.
    pub from: Address,
    /// The account credited.
    pub to: Address,
    /// The minted value.
    pub value: U256,
    /// The L1 deposit identifier, unique per deposit.
    pub deposit_id: u64,
}

/// A transaction of a rollup block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RollupTransaction {
    /// A user transaction.
    User(UserTransaction),
    /// A deposit transaction.
    Deposit(DepositTransaction),
}

impl RollupTransaction {
    /// The type byte of the transaction.
    pub const fn ty(&self) -> u8 {
        match self {
            Self::User(_) => USER_TX_TYPE,
            Self::Deposit(_) => DEPOSIT_TX_TYPE,
        }
    }

    /// Whether this is a deposit.
    pub const fn is_deposit(&self) -> bool {
        matches!(self, Self::Deposit(_))
    }

    /// The sender.
    pub const fn from(&self) -> Address {
        match self {
            Self::User(tx) => tx.from,
            Self::Deposit(tx) => tx.from,
        }
    }

    /// The declared gas limit. Deposits declare none.
    pub const fn gas_limit(&self) -> u64 {
        match self {
            Self::User(tx) => tx.gas_limit,
            Self::Deposit(_) => 0,
        }
    }

    /// The recipient.
    pub const fn to(&self) -> TxKind {
        match self {
            Self::User(tx) => tx.to,
            Self::Deposit(tx) => TxKind::Call(tx.to),
        }
    }

    /// The value transferred or minted.
    pub const fn value(&self) -> U256 {
        match self {
            Self::User(tx) => tx.value,
            Self::Deposit(tx) => tx.value,
        }
    }

    /// The call data. Empty for deposits.
    pub fn input(&self) -> &Bytes {
        static EMPTY: Bytes = Bytes::new();
        match self {
            Self::User(tx) => &tx.input,
            Self::Deposit(_) => &EMPTY,
        }
    }

    /// Length of the typed encoding, `type_byte || rlp(body)`.
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            Self::User(tx) => tx.length(),
            Self::Deposit(tx) => tx.length(),
        }
    }

    /// The typed encoding, `type_byte || rlp(body)`.
    pub fn encoded(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(self.ty());
        match self {
            Self::User(tx) => tx.encode(&mut out),
            Self::Deposit(tx) => tx.encode(&mut out),
        }
        out
    }

    /// The transaction hash, `keccak256(type_byte || rlp(body))`.
    pub fn hash(&self) -> B256 {
        keccak256(self.encoded())
    }
}

impl From<UserTransaction> for RollupTransaction {
    fn from(tx: UserTransaction) -> Self {
        Self::User(tx)
    }
}

impl From<DepositTransaction> for RollupTransaction {
    fn from(tx: DepositTransaction) -> Self {
        Self::Deposit(tx)
    }
}
