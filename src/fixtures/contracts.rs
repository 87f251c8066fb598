//! ABI bindings for the token contracts the fixtures call.

use alloy::sol;

sol! {
    /// WETH9-style wrapper around the native currency.
    interface IWrappedNative {
        function deposit() external payable;
        function transfer(address to, uint256 value) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
    }

    interface IERC20 {
        function approve(address spender, uint256 value) external returns (bool);
    }
}
