//! Fixture operations: funding accounts and generating signed sell orders.
//!
//! The free functions take any [`Chain`](crate::transport::Chain) so they can
//! run against a mock; [`FixtureSeeder`] runs them against the configured node.

pub mod contracts;
pub mod orders;
pub mod readiness;
pub mod seeder;
pub mod selector;
pub mod transfer;
pub mod zero_ex;

pub use orders::{
    generate_sell_orders, OrderHelper, OrderTerms, MAKER_ASSET, MAKER_ASSET_AMOUNT,
    SELL_ORDER_COUNT, TAKER_ASSET, TAKER_ASSET_AMOUNT,
};
pub use readiness::{
    has_sufficient_balance, network_mismatch_message, should_seed_fixtures, SUFFICIENT_BALANCE_WEI,
};
pub use seeder::FixtureSeeder;
pub use selector::{select_funded_account, MAKER_ACCOUNT_INDEX};
pub use transfer::{send_native, send_wrapped_native, wrapped_native_balance};
pub use zero_ex::ZeroExOrderHelper;
