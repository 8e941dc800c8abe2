use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kiosk_ops::cli::policy::PolicyEdits;
use kiosk_ops::cli::publish::PublishArgs;
use kiosk_ops::config::OpsConfig;
use kiosk_ops::rpc::SuiRpcClient;
use kiosk_ops::signer::Keypair;
use tracing_subscriber;

#[derive(Parser)]
#[command(name = "kiosk-ops")]
#[command(about = "Operator commands for tokenized assets in Sui kiosks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Fullnode RPC endpoint override
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Sign with the buyer mnemonic instead of the admin one
    #[arg(long, global = true)]
    buyer: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a new asset package from the bytecode template
    Publish {
        #[command(flatten)]
        args: PublishArgs,
    },

    /// Mint a tokenized asset and send it to the signer
    Mint {
        /// Units of the asset the token represents
        #[arg(long, default_value = "1")]
        balance: u64,

        /// Metadata keys, paired with --value by position
        #[arg(long = "key")]
        keys: Vec<String>,

        /// Metadata values, paired with --key by position
        #[arg(long = "value")]
        values: Vec<String>,
    },

    /// List an item in a kiosk for sale
    List {
        /// Kiosk holding the item (defaults to the configured one)
        #[arg(long)]
        kiosk: Option<String>,

        /// Item to list (defaults to the configured one)
        #[arg(long)]
        item: Option<String>,

        /// Price in MIST
        #[arg(long, default_value_t = kiosk_ops::cli::DEFAULT_LIST_PRICE)]
        price: u64,
    },

    /// Take an item off sale
    Delist {
        #[arg(long)]
        kiosk: Option<String>,

        #[arg(long)]
        item: Option<String>,
    },

    /// Place an item into a kiosk
    Place {
        #[arg(long)]
        kiosk: Option<String>,

        #[arg(long)]
        item: Option<String>,
    },

    /// Lock an item in a kiosk under its transfer policy
    Lock {
        #[arg(long)]
        kiosk: Option<String>,

        #[arg(long)]
        item: Option<String>,

        /// Transfer policy object (defaults to the configured one)
        #[arg(long)]
        policy: Option<String>,
    },

    /// Create a new personal kiosk
    NewKiosk,

    /// Convert an existing kiosk to a personal one
    ConvertKiosk {
        #[arg(long)]
        kiosk: Option<String>,
    },

    /// Add or remove transfer policy rules
    Policy {
        /// Transfer policy object (defaults to the configured one)
        #[arg(long)]
        policy: Option<String>,

        #[command(flatten)]
        edits: PolicyEdits,
    },

    /// Show circulating and maximum supply of the asset
    Supply,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let mut config = OpsConfig::load()?;
    if let Some(rpc_url) = cli.rpc_url {
        config.rpc_url = rpc_url;
    }

    let client = SuiRpcClient::new(&config.rpc_url);

    // Supply is a read, no signer needed
    if let Commands::Supply = cli.command {
        return kiosk_ops::cli::supply::execute(&client, &config).await;
    }

    let mnemonic = if cli.buyer {
        config
            .buyer_mnemonic
            .as_deref()
            .context("No buyer mnemonic configured; set `buyer_mnemonic`")?
    } else if config.admin_mnemonic.is_empty() {
        anyhow::bail!(
            "No mnemonic configured; set `admin_mnemonic` or the KIOSK_OPS_MNEMONIC variable"
        );
    } else {
        &config.admin_mnemonic
    };
    let keypair = Keypair::derive(mnemonic)?;
    tracing::debug!(address = %keypair.address(), "signer resolved");

    match cli.command {
        Commands::Publish { args } => {
            kiosk_ops::cli::publish::execute(&client, &keypair, &config, args).await?;
        }
        Commands::Mint {
            balance,
            keys,
            values,
        } => {
            kiosk_ops::cli::mint::execute(&client, &keypair, &config, balance, keys, values)
                .await?;
        }
        Commands::List { kiosk, item, price } => {
            kiosk_ops::cli::list::execute(&client, &keypair, &config, kiosk, item, price).await?;
        }
        Commands::Delist { kiosk, item } => {
            kiosk_ops::cli::delist::execute(&client, &keypair, &config, kiosk, item).await?;
        }
        Commands::Place { kiosk, item } => {
            kiosk_ops::cli::place::execute(&client, &keypair, &config, kiosk, item).await?;
        }
        Commands::Lock { kiosk, item, policy } => {
            kiosk_ops::cli::lock::execute(&client, &keypair, &config, kiosk, item, policy).await?;
        }
        Commands::NewKiosk => {
            kiosk_ops::cli::new_kiosk::execute(&client, &keypair, &config).await?;
        }
        Commands::ConvertKiosk { kiosk } => {
            kiosk_ops::cli::convert_kiosk::execute(&client, &keypair, &config, kiosk).await?;
        }
        Commands::Policy { policy, edits } => {
            kiosk_ops::cli::policy::execute(&client, &keypair, &config, policy, edits).await?;
        }
        Commands::Supply => unreachable!(),
    }

    Ok(())
}
