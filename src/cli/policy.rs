use crate::config::OpsConfig;
use crate::effects;
use crate::policy::{self, PolicyTransaction};
use crate::rpc::SuiRpcClient;
use crate::signer::Keypair;
use crate::tx::{ProgrammableTransactionBuilder, TypeTag};
use anyhow::{Context, Result};

/// Rule edits requested on the command line. Everything is optional; at
/// least one edit must be set.
#[derive(Debug, Default, clap::Args)]
pub struct PolicyEdits {
    /// Add a royalty rule with this percentage (0-100, fractions allowed)
    #[arg(long)]
    pub royalty_percentage: Option<f64>,

    /// Minimum royalty per sale in MIST, used with --royalty-percentage
    #[arg(long, default_value_t = 0)]
    pub royalty_min: u64,

    /// Add the kiosk lock rule
    #[arg(long)]
    pub lock: bool,

    /// Add a floor price rule at this price in MIST
    #[arg(long)]
    pub floor_price: Option<u64>,

    /// Add the personal kiosk rule
    #[arg(long)]
    pub personal: bool,

    /// Remove the royalty rule
    #[arg(long)]
    pub remove_royalty: bool,

    /// Remove the kiosk lock rule
    #[arg(long)]
    pub remove_lock: bool,

    /// Remove the floor price rule
    #[arg(long)]
    pub remove_floor_price: bool,

    /// Remove the personal kiosk rule
    #[arg(long)]
    pub remove_personal: bool,
}

impl PolicyEdits {
    fn is_empty(&self) -> bool {
        self.royalty_percentage.is_none()
            && !self.lock
            && self.floor_price.is_none()
            && !self.personal
            && !self.remove_royalty
            && !self.remove_lock
            && !self.remove_floor_price
            && !self.remove_personal
    }
}

/// Apply rule edits to the transfer policy of the tokenized-asset type.
pub async fn execute(
    client: &SuiRpcClient,
    keypair: &Keypair,
    config: &OpsConfig,
    policy_id: Option<String>,
    edits: PolicyEdits,
) -> Result<()> {
    if edits.is_empty() {
        anyhow::bail!("nothing to do; pass at least one rule flag (see --help)");
    }
    if config.rules_package.is_empty() {
        anyhow::bail!("set `rules_package` in the config first");
    }
    let policy_id = match &policy_id {
        Some(id) => id.as_str(),
        None => config.transfer_policy()?,
    };
    let item_type: TypeTag = config
        .tokenized_asset_type
        .parse()
        .context("config: tokenized_asset_type")?;

    let sender = keypair.address();
    let cap = policy::find_policy_cap(client, &sender, &config.tokenized_asset_type, policy_id)
        .await?;
    let policy_arg = client.get_shared_object_arg(policy_id, true).await?;

    tracing::info!(policy = policy_id, "editing transfer policy rules");

    let mut builder = ProgrammableTransactionBuilder::new();
    let mut tx = PolicyTransaction::new(
        &mut builder,
        policy_arg,
        cap,
        item_type,
        &config.rules_package,
    )?;

    let mut applied = Vec::new();
    if let Some(percentage) = edits.royalty_percentage {
        let basis_points = policy::percentage_to_basis_points(percentage)?;
        tx.add_royalty_rule(basis_points, edits.royalty_min)?;
        applied.push(format!("+royalty {}bp", basis_points));
    }
    if edits.lock {
        tx.add_lock_rule()?;
        applied.push("+lock".to_string());
    }
    if let Some(floor) = edits.floor_price {
        tx.add_floor_price_rule(floor)?;
        applied.push(format!("+floor {}", floor));
    }
    if edits.personal {
        tx.add_personal_kiosk_rule()?;
        applied.push("+personal".to_string());
    }
    if edits.remove_royalty {
        tx.remove_royalty_rule();
        applied.push("-royalty".to_string());
    }
    if edits.remove_lock {
        tx.remove_lock_rule();
        applied.push("-lock".to_string());
    }
    if edits.remove_floor_price {
        tx.remove_floor_price_rule();
        applied.push("-floor".to_string());
    }
    if edits.remove_personal {
        tx.remove_personal_kiosk_rule();
        applied.push("-personal".to_string());
    }

    let response = crate::cli::sign_and_execute(client, keypair, config, builder).await?;
    effects::ensure_success(&response)?;

    println!("✓ Updated transfer policy {}", policy_id);
    println!("  Digest: {}", response.digest);
    println!("  Edits: {}", applied.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_edits_detected() {
        assert!(PolicyEdits::default().is_empty());
        let edits = PolicyEdits {
            lock: true,
            ..Default::default()
        };
        assert!(!edits.is_empty());
    }
}
