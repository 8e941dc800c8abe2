use crate::config::OpsConfig;
use crate::effects;
use crate::kiosk::{self, KIOSK_TYPE};
use crate::rpc::SuiRpcClient;
use crate::signer::Keypair;
use crate::tx::ProgrammableTransactionBuilder;
use anyhow::{Context, Result};

/// Create a fresh shared kiosk whose owner cap is wrapped into a personal
/// kiosk cap held by the signer.
pub async fn execute(
    client: &SuiRpcClient,
    keypair: &Keypair,
    config: &OpsConfig,
) -> Result<()> {
    if config.personal_kiosk_package.is_empty() {
        anyhow::bail!("set `personal_kiosk_package` in the config first");
    }

    tracing::info!("creating personal kiosk");

    let mut builder = ProgrammableTransactionBuilder::new();
    kiosk::create_personal_kiosk(&mut builder, &config.personal_kiosk_package)?;

    let response = crate::cli::sign_and_execute(client, keypair, config, builder).await?;
    let tx_effects = effects::ensure_success(&response)?;

    let kiosk_id = effects::find_created_by_type(client, tx_effects, KIOSK_TYPE)
        .await?
        .context("no kiosk among created objects")?;

    println!("✓ Created personal kiosk");
    println!("  Digest: {}", response.digest);
    println!("  Kiosk: {}", kiosk_id);
    println!("\nSave it as `target_kiosk` in the config to use it by default.");
    Ok(())
}
