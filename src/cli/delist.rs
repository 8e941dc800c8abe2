use crate::config::OpsConfig;
use crate::effects;
use crate::kiosk::{self, KioskTransaction};
use crate::rpc::SuiRpcClient;
use crate::signer::Keypair;
use crate::tx::{ProgrammableTransactionBuilder, SuiAddress, TypeTag};
use anyhow::{Context, Result};

/// Take a tokenized asset off sale in the target kiosk.
pub async fn execute(
    client: &SuiRpcClient,
    keypair: &Keypair,
    config: &OpsConfig,
    kiosk_id: Option<String>,
    item: Option<String>,
) -> Result<()> {
    let kiosk_id = match &kiosk_id {
        Some(id) => id.as_str(),
        None => config.target_kiosk()?,
    };
    let item_id = match &item {
        Some(id) => id.as_str(),
        None => config.tokenized_asset_id()?,
    };
    let item_type: TypeTag = config
        .tokenized_asset_type
        .parse()
        .context("config: tokenized_asset_type")?;

    let sender = keypair.address();
    let cap = kiosk::find_kiosk_cap(client, &sender, kiosk_id, &config.personal_kiosk_package)
        .await?;
    let kiosk_arg = client.get_shared_object_arg(kiosk_id, true).await?;

    tracing::info!(kiosk = kiosk_id, item = item_id, "delisting item");

    let mut builder = ProgrammableTransactionBuilder::new();
    let mut tx = KioskTransaction::new(&mut builder, kiosk_arg, &cap, &config.personal_kiosk_package)?;
    tx.delist(item_type, SuiAddress::parse(item_id)?)?;
    tx.finalize();

    let response = crate::cli::sign_and_execute(client, keypair, config, builder).await?;
    effects::ensure_success(&response)?;

    println!("✓ Delisted item {}", item_id);
    println!("  Digest: {}", response.digest);
    Ok(())
}
