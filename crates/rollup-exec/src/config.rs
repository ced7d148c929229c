//! Chain configuration.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    constants::origin::{
        DEFAULT_BASE_FEE, DEFAULT_BLOCK_GAS_LIMIT, DEFAULT_L1_PRICE_PER_UNIT, TX_BASE_GAS,
    },
    BlockLimits, ConfigError, RollupSpecId,
};

/// Chain id used when none is configured.
pub const DEFAULT_CHAIN_ID: u64 = 412_346;

/// Static parameters of a rollup chain.
///
/// Missing fields take their default value, so a JSON file only lists what it overrides:
///
/// ```json
/// { "chainId": 7, "spec": "Cascade", "blockGasLimit": 30000000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ChainConfig {
    /// The L2 chain id.
    pub chain_id: u64,
    /// The active rollup spec.
    pub spec: RollupSpecId,
    /// The per-block gas maximum.
    pub block_gas_limit: u64,
    /// The L2 base fee in wei, used to convert L1 posting costs into gas.
    pub base_fee: u128,
    /// The L1 price per data unit written at genesis.
    pub initial_l1_price_per_unit: U256,
    /// The account allowed to update the L1 price through `GasInfo`.
    pub chain_owner: Address,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            spec: RollupSpecId::default(),
            block_gas_limit: DEFAULT_BLOCK_GAS_LIMIT,
            base_fee: DEFAULT_BASE_FEE,
            initial_l1_price_per_unit: U256::from(DEFAULT_L1_PRICE_PER_UNIT),
            chain_owner: Address::ZERO,
        }
    }
}

impl ChainConfig {
    /// Checks that the configuration can produce blocks.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == 0 {
            return Err(ConfigError::ZeroChainId);
        }
        if self.block_gas_limit < TX_BASE_GAS {
            return Err(ConfigError::BlockGasLimitTooLow {
                limit: self.block_gas_limit,
                min: TX_BASE_GAS,
            });
        }
        Ok(())
    }

    /// The block limits derived from this configuration.
    pub const fn block_limits(&self) -> BlockLimits {
        BlockLimits::new(self.block_gas_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(ChainConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_validate() {
        let config = ChainConfig { chain_id: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroChainId));

        let config = ChainConfig { block_gas_limit: 20_999, ..Default::default() };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BlockGasLimitTooLow { limit: 20_999, min: TX_BASE_GAS })
        );
    }
}
