use alloy_primitives::{Address, U256};
use delegate::delegate;
use revm::database::{CacheDB, EmptyDB};

use crate::{StateError, StateReader, StateWriter};

/// An in-memory state for testing purposes.
#[derive(Debug, Default, Clone, derive_more::Deref, derive_more::DerefMut)]
pub struct MemoryState {
    #[deref]
    #[deref_mut]
    db: CacheDB<EmptyDB>,
}

impl MemoryState {
    /// Creates a new `MemoryState` from a `CacheDB`.
    pub fn from_cache_db(db: CacheDB<EmptyDB>) -> Self {
        Self { db }
    }

    /// Sets the balance for an account in the state.
    pub fn account_balance(mut self, address: Address, balance: U256) -> Self {
        self.db.set_balance(address, balance).unwrap();
        self
    }

    /// Sets the nonce for an account in the state.
    pub fn account_nonce(mut self, address: Address, nonce: u64) -> Self {
        self.db.set_nonce(address, nonce).unwrap();
        self
    }

    /// Sets a storage slot for an account in the state.
    pub fn account_storage(mut self, address: Address, slot: U256, value: U256) -> Self {
        self.db.set_storage(address, slot, value).unwrap();
        self
    }
}

impl StateReader for MemoryState {
    delegate! {
        to self.db {
            fn balance(&self, address: Address) -> Result<U256, StateError>;
            fn nonce(&self, address: Address) -> Result<u64, StateError>;
            fn storage(&self, address: Address, slot: U256) -> Result<U256, StateError>;
        }
    }
}

impl StateWriter for MemoryState {
    delegate! {
        to self.db {
            fn set_balance(&mut self, address: Address, balance: U256) -> Result<(), StateError>;
            fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<(), StateError>;
            fn set_storage(
                &mut self,
                address: Address,
                slot: U256,
                value: U256,
            ) -> Result<(), StateError>;
        }
    }
}
