//! [`StateReader`] and [`StateWriter`] for `revm`'s in-memory [`CacheDB`].

use alloy_primitives::{Address, U256};
use revm::database::{AccountState, CacheDB, DatabaseRef};

use crate::{StateError, StateReader, StateWriter};

impl<ExtDB: DatabaseRef> StateReader for CacheDB<ExtDB> {
    fn balance(&self, address: Address) -> Result<U256, StateError> {
        let info = self.basic_ref(address).map_err(StateError::database)?;
        Ok(info.map(|info| info.balance).unwrap_or_default())
    }

    fn nonce(&self, address: Address) -> Result<u64, StateError> {
        let info = self.basic_ref(address).map_err(StateError::database)?;
        Ok(info.map(|info| info.nonce).unwrap_or_default())
    }

    fn storage(&self, address: Address, slot: U256) -> Result<U256, StateError> {
        self.storage_ref(address, slot).map_err(StateError::database)
    }
}

impl<ExtDB: DatabaseRef> StateWriter for CacheDB<ExtDB> {
    fn set_balance(&mut self, address: Address, balance: U256) -> Result<(), StateError> {
        let account = self.load_account(address).map_err(StateError::database)?;
        account.info.balance = balance;
        account.account_state = AccountState::None;
        Ok(())
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<(), StateError> {
        let account = self.load_account(address).map_err(StateError::database)?;
        account.info.nonce = nonce;
        account.account_state = AccountState::None;
        Ok(())
    }

    fn set_storage(
        &mut self,
        address: Address,
        slot: U256,
        value: U256,
    ) -> Result<(), StateError> {
        self.insert_account_storage(address, slot, value).map_err(StateError::database)
    }
}
