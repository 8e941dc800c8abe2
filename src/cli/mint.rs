use crate::config::OpsConfig;
use crate::effects;
use crate::rpc::SuiRpcClient;
use crate::signer::Keypair;
use crate::tx::{ObjectArg, ProgrammableTransactionBuilder, SuiAddress, TypeTag};
use anyhow::{Context, Result};

/// Mint a tokenized asset with `balance` units and optional metadata
/// key/value pairs, then transfer it to the signer.
pub async fn execute(
    client: &SuiRpcClient,
    keypair: &Keypair,
    config: &OpsConfig,
    balance: u64,
    keys: Vec<String>,
    values: Vec<String>,
) -> Result<()> {
    if keys.len() != values.len() {
        anyhow::bail!(
            "metadata keys and values must pair up ({} keys, {} values)",
            keys.len(),
            values.len()
        );
    }

    let package = SuiAddress::parse(&config.asset_tokenization_package)?;
    let item_type: TypeTag = config
        .tokenized_asset_type
        .parse()
        .context("config: tokenized_asset_type")?;
    let otw_type = one_time_witness(&item_type)?;

    tracing::info!(%otw_type, balance, "minting tokenized asset");

    let mut builder = ProgrammableTransactionBuilder::new();
    let asset_cap = client.get_object_ref(&config.asset_cap).await?;
    let cap_arg = builder.obj(ObjectArg::ImmOrOwnedObject(asset_cap))?;
    let keys_arg = builder.pure(&keys)?;
    let values_arg = builder.pure(&values)?;
    let balance_arg = builder.pure(&balance)?;

    let minted = builder.move_call(
        package,
        "tokenized_asset",
        "mint",
        vec![otw_type],
        vec![cap_arg, keys_arg, values_arg, balance_arg],
    );
    let recipient = builder.pure(&keypair.address())?;
    builder.transfer_objects(vec![minted], recipient);

    let response = crate::cli::sign_and_execute(client, keypair, config, builder).await?;
    let tx_effects = effects::ensure_success(&response)?;

    let minted_id =
        effects::find_created_by_type(client, tx_effects, &config.tokenized_asset_type)
            .await?
            .or_else(|| effects::first_created(tx_effects))
            .context("no created object in effects")?;

    println!("✓ Minted tokenized asset");
    println!("  Digest: {}", response.digest);
    println!("  Tokenized Asset: {}", minted_id);
    Ok(())
}

/// The one-time witness is the single type parameter of the configured
/// tokenized-asset type.
fn one_time_witness(item_type: &TypeTag) -> Result<TypeTag> {
    match item_type {
        TypeTag::Struct(tag) if tag.type_params.len() == 1 => Ok(tag.type_params[0].clone()),
        _ => anyhow::bail!(
            "tokenized_asset_type must be a struct with one type parameter, got {}",
            item_type
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_time_witness_extraction() {
        let item: TypeTag = "0xaa::tokenized_asset::TokenizedAsset<0xbb::template::TEMPLATE>"
            .parse()
            .unwrap();
        let otw = one_time_witness(&item).unwrap();
        assert_eq!(
            otw,
            "0xbb::template::TEMPLATE".parse::<TypeTag>().unwrap()
        );
    }

    #[test]
    fn test_one_time_witness_requires_type_param() {
        let plain: TypeTag = "0x2::kiosk::Kiosk".parse().unwrap();
        assert!(one_time_witness(&plain).is_err());
        assert!(one_time_witness(&TypeTag::U64).is_err());
    }
}
