use crate::config::OpsConfig;
use crate::effects;
use crate::kiosk::{self, KioskTransaction, ITEM_FIELD_TYPE};
use crate::rpc::SuiRpcClient;
use crate::signer::Keypair;
use crate::tx::{ObjectArg, ProgrammableTransactionBuilder, TypeTag};
use anyhow::{Context, Result};

/// Place a tokenized asset into the target kiosk without locking it.
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
    let item_ref = client.get_object_ref(item_id).await?;

    tracing::info!(kiosk = kiosk_id, item = item_id, "placing item");

    let mut builder = ProgrammableTransactionBuilder::new();
    let mut tx = KioskTransaction::new(&mut builder, kiosk_arg, &cap, &config.personal_kiosk_package)?;
    tx.place(item_type, ObjectArg::ImmOrOwnedObject(item_ref))?;
    tx.finalize();

    let response = crate::cli::sign_and_execute(client, keypair, config, builder).await?;
    let tx_effects = effects::ensure_success(&response)?;

    println!("✓ Placed item in kiosk {}", kiosk_id);
    println!("  Digest: {}", response.digest);
    if let Some(field) = effects::find_created_by_type(client, tx_effects, ITEM_FIELD_TYPE).await? {
        println!("  Item field: {}", field);
    }
    Ok(())
}
