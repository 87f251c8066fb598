//! Text of the "switch your wallet network" prompt shown to browser users.

pub const ROPSTEN_NETWORK_ID: u64 = 3;

/// Name of the network the user should switch their wallet to.
pub fn target_network_name(remote_network_id: u64) -> &'static str {
    if remote_network_id == ROPSTEN_NETWORK_ID {
        "Ropsten"
    } else {
        "localhost:8545"
    }
}

pub fn change_network_message(remote_network_id: u64) -> String {
    format!(
        "Please change the network in MetaMask to {} and refresh",
        target_network_name(remote_network_id)
    )
}
