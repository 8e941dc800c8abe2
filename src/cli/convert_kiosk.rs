use crate::config::OpsConfig;
use crate::effects;
use crate::kiosk::{self, KioskCap};
use crate::rpc::SuiRpcClient;
use crate::signer::Keypair;
use crate::tx::ProgrammableTransactionBuilder;
use anyhow::Result;

/// Wrap the bare owner cap of an existing kiosk into a personal kiosk cap.
pub async fn execute(
    client: &SuiRpcClient,
    keypair: &Keypair,
    config: &OpsConfig,
    kiosk_id: Option<String>,
) -> Result<()> {
    if config.personal_kiosk_package.is_empty() {
        anyhow::bail!("set `personal_kiosk_package` in the config first");
    }
    let kiosk_id = match &kiosk_id {
        Some(id) => id.as_str(),
        None => config.target_kiosk()?,
    };

    let sender = keypair.address();
    let cap = kiosk::find_kiosk_cap(client, &sender, kiosk_id, &config.personal_kiosk_package)
        .await?;
    let cap_ref = match cap {
        KioskCap::Owned(cap_ref) => cap_ref,
        KioskCap::Personal(_) => {
            anyhow::bail!("kiosk {} is already personal", kiosk_id);
        }
    };
    let kiosk_arg = client.get_shared_object_arg(kiosk_id, true).await?;

    tracing::info!(kiosk = kiosk_id, "converting kiosk to personal");

    let mut builder = ProgrammableTransactionBuilder::new();
    kiosk::convert_kiosk_to_personal(
        &mut builder,
        kiosk_arg,
        cap_ref,
        &config.personal_kiosk_package,
    )?;

    let response = crate::cli::sign_and_execute(client, keypair, config, builder).await?;
    effects::ensure_success(&response)?;

    println!("✓ Converted kiosk {} to personal", kiosk_id);
    println!("  Digest: {}", response.digest);
    Ok(())
}
