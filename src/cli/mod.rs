pub mod convert_kiosk;
pub mod delist;
pub mod list;
pub mod lock;
pub mod mint;
pub mod new_kiosk;
pub mod place;
pub mod policy;
pub mod publish;
pub mod supply;

use crate::config::OpsConfig;
use crate::rpc::models::TransactionBlockResponse;
use crate::rpc::SuiRpcClient;
use crate::signer::Keypair;
use crate::tx::ProgrammableTransactionBuilder;
use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Price used by `list` when no `--price` is given, in MIST.
pub const DEFAULT_LIST_PRICE: u64 = 100_000;

/// Finish, sign and submit one built transaction: gas price and payment from
/// the fullnode, BCS bytes signed over the intent digest, execution with
/// effects requested. Every command funnels through here.
pub(crate) async fn sign_and_execute(
    client: &SuiRpcClient,
    keypair: &Keypair,
    config: &OpsConfig,
    builder: ProgrammableTransactionBuilder,
) -> Result<TransactionBlockResponse> {
    let sender = keypair.address();
    let gas_price = client.reference_gas_price().await?;
    let payment = client.select_gas(&sender, config.gas_budget).await?;

    let data = builder.finish(sender, payment, gas_price, config.gas_budget);
    let tx_bytes = data.to_bcs_bytes()?;
    let signature = keypair.sign_transaction(&tx_bytes);

    let response = client
        .execute_transaction_block(&BASE64.encode(&tx_bytes), &[signature])
        .await?;
    tracing::info!(digest = %response.digest, "transaction submitted");
    Ok(response)
}
