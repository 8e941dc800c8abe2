use crate::config::OpsConfig;
use crate::effects;
use crate::rpc::SuiRpcClient;
use crate::signer::Keypair;
use crate::template::{patch_asset_template, AssetTemplateFields};
use crate::tx::{ProgrammableTransactionBuilder, SuiAddress};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Fields for the new asset module, patched into the embedded template.
#[derive(Debug, clap::Args)]
pub struct PublishArgs {
    /// Move module name for the new asset (snake_case)
    #[arg(long)]
    pub module_name: String,

    /// Maximum supply of the tokenized asset
    #[arg(long)]
    pub total_supply: u64,

    #[arg(long)]
    pub symbol: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: String,

    #[arg(long)]
    pub icon_url: String,

    /// Allow burning minted assets back into the supply
    #[arg(long)]
    pub burnable: bool,

    /// Extra compiled modules to publish alongside (.mv bytes or hex dumps)
    #[arg(long = "module")]
    pub modules: Vec<PathBuf>,
}

/// Publish a new asset package built from the embedded bytecode template.
pub async fn execute(
    client: &SuiRpcClient,
    keypair: &Keypair,
    config: &OpsConfig,
    args: PublishArgs,
) -> Result<()> {
    if config.asset_tokenization_package.is_empty() {
        anyhow::bail!("set `asset_tokenization_package` in the config first");
    }

    let fields = AssetTemplateFields {
        module_name: args.module_name.clone(),
        total_supply: args.total_supply,
        symbol: args.symbol,
        name: args.name,
        description: args.description,
        icon_url: args.icon_url,
        burnable: args.burnable,
    };
    let mut modules = vec![patch_asset_template(&fields)?];
    for path in &args.modules {
        modules.push(read_module(path)?);
    }

    let dependencies = vec![
        SuiAddress::parse("0x1")?,
        SuiAddress::parse("0x2")?,
        SuiAddress::parse(&config.asset_tokenization_package)?,
    ];

    tracing::info!(
        module = args.module_name,
        modules = modules.len(),
        "publishing asset package"
    );

    let mut builder = ProgrammableTransactionBuilder::new();
    let upgrade_cap = builder.publish(modules, dependencies);
    let recipient = builder.pure(&keypair.address())?;
    builder.transfer_objects(vec![upgrade_cap], recipient);

    let response = crate::cli::sign_and_execute(client, keypair, config, builder).await?;
    let tx_effects = effects::ensure_success(&response)?;

    let package = effects::created_package(tx_effects)
        .context("no package among created objects")?;

    println!("✓ Published asset package");
    println!("  Digest: {}", response.digest);
    println!("  Package: {}", package);
    println!(
        "\nSet `tokenized_asset_type` to {}::tokenized_asset::TokenizedAsset<{}::{}::{}> \
         and record the created AssetCap as `asset_cap`.",
        config.asset_tokenization_package,
        package,
        args.module_name,
        args.module_name.to_uppercase()
    );
    Ok(())
}

/// A module file is either raw compiled bytes (`.mv`) or a hex dump.
fn read_module(path: &Path) -> Result<Vec<u8>> {
    let raw = std::fs::read(path)
        .with_context(|| format!("failed to read module {}", path.display()))?;
    if path.extension().map_or(false, |ext| ext == "mv") {
        return Ok(raw);
    }
    let text = String::from_utf8(raw)
        .with_context(|| format!("module {} is neither .mv nor hex", path.display()))?;
    let cleaned = text.trim().trim_start_matches("0x");
    hex::decode(cleaned).with_context(|| format!("bad hex in module {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_module_hex_and_raw() {
        let dir = tempfile::tempdir().unwrap();

        let hex_path = dir.path().join("mod.hex");
        std::fs::write(&hex_path, "a11ceb0b\n").unwrap();
        assert_eq!(read_module(&hex_path).unwrap(), vec![0xa1, 0x1c, 0xeb, 0x0b]);

        let mv_path = dir.path().join("mod.mv");
        std::fs::write(&mv_path, [0xa1, 0x1c, 0xeb, 0x0b]).unwrap();
        assert_eq!(read_module(&mv_path).unwrap(), vec![0xa1, 0x1c, 0xeb, 0x0b]);

        let bad_path = dir.path().join("mod.txt");
        std::fs::write(&bad_path, "not hex at all").unwrap();
        assert!(read_module(&bad_path).is_err());
    }
}
