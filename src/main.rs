use alloy::primitives::U256;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use dex_fixtures::domain::{format_address, parse_address};
use dex_fixtures::prompt::change_network_message;
use dex_fixtures::{Config, FixtureSeeder};
use std::str::FromStr;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dex-fixtures", version, about = "Seed a local node with exchange fixtures")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send native currency from a funded development account
    #[command(name = "send-native")]
    SendNative(TransferCmd),
    /// Wrap native currency and send the tokens
    #[command(name = "send-wrapped")]
    SendWrapped(TransferCmd),
    /// Check whether an address holds enough native currency for fixtures
    #[command(name = "check-balance")]
    CheckBalance(BalanceCmd),
    /// Print a batch of signed sell orders as JSON
    #[command(name = "sell-orders")]
    SellOrders(SellOrdersCmd),
    /// Print the wallet network prompt for a remote network id
    #[command(name = "network-prompt")]
    NetworkPrompt(NetworkPromptCmd),
}

#[derive(Args, Debug)]
struct TransferCmd {
    #[arg(long, help = "Recipient address")]
    to: String,
    #[arg(long, help = "Amount in wei (decimal or 0x-hex)")]
    wei: String,
}

#[derive(Args, Debug)]
struct BalanceCmd {
    #[arg(long)]
    address: String,
}

#[derive(Args, Debug)]
struct SellOrdersCmd {
    #[arg(long, help = "Address allowed to fill the orders")]
    taker: String,
}

#[derive(Args, Debug)]
struct NetworkPromptCmd {
    #[arg(long)]
    remote_network_id: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, FixtureSeeder::new(config)).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command, seeder: FixtureSeeder) -> Result<()> {
    if let Command::NetworkPrompt(cmd) = &command {
        println!("{}", change_network_message(cmd.remote_network_id));
        return Ok(());
    }

    if !seeder.should_seed_fixtures() {
        info!("LOCAL_NODE is not set; skipping fixture seeding");
        return Ok(());
    }

    if let Some(prompt) = seeder
        .network_mismatch_message()
        .await
        .context("querying node network id")?
    {
        return Err(anyhow!(prompt));
    }

    match command {
        Command::SendNative(cmd) => {
            let to = parse_address(&cmd.to)?;
            let hash = seeder.send_native(to, parse_wei(&cmd.wei)?).await?;
            println!("{:#x}", hash);
        }
        Command::SendWrapped(cmd) => {
            let to = parse_address(&cmd.to)?;
            let hash = seeder.send_wrapped_native(to, parse_wei(&cmd.wei)?).await?;
            println!("{:#x}", hash);
        }
        Command::CheckBalance(cmd) => {
            let address = parse_address(&cmd.address)?;
            let sufficient = seeder.has_sufficient_balance(address).await?;
            let wrapped = seeder.wrapped_native_balance(address).await?;
            println!(
                "{} sufficient={} wrapped_wei={}",
                format_address(&address),
                sufficient,
                wrapped
            );
        }
        Command::SellOrders(cmd) => {
            let taker = parse_address(&cmd.taker)?;
            let orders = seeder.generate_sell_orders(taker).await?;
            println!("{}", serde_json::to_string_pretty(&orders)?);
        }
        Command::NetworkPrompt(_) => {}
    }

    Ok(())
}

fn parse_wei(raw: &str) -> Result<U256> {
    U256::from_str(raw.trim()).map_err(|e| anyhow!("invalid wei amount {}: {}", raw, e))
}
