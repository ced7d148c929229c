//! Solidity interfaces of the rollup precompiles.

use alloy_sol_types::sol;

sol! {
    /// Read access to the rollup bookkeeping.
    interface IRollupSys {
        function blockCount() external view returns (uint256);
        function messageCount() external view returns (uint256);
        function lastBlockTimestamp() external view returns (uint256);
        function chainId() external view returns (uint256);
    }

    /// Stateless helpers.
    interface IRollupUtil {
        function keccak(bytes calldata data) external pure returns (bytes32);
        function l1ToL2Alias(address l1Address) external pure returns (address);
    }

    /// L1 data pricing.
    interface IGasInfo {
        function l1PricePerUnit() external view returns (uint256);
        function totalSurchargeGas() external view returns (uint256);
        function setL1PricePerUnit(uint256 price) external;
    }

    /// A key-value store private to each caller.
    interface ICallerStore {
        function get(bytes32 key) external view returns (bytes32);
        function set(bytes32 key, bytes32 value) external;
    }
}
