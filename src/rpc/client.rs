use crate::error::{OpsError, Result};
use crate::rpc::models::{
    CoinPage, ObjectData, ObjectPage, ObjectResponse, RpcEnvelope, TransactionBlockResponse,
};
use crate::tx::types::{ObjectArg, ObjectDigest, ObjectRef, SuiAddress};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// Thin JSON-RPC 2.0 client for the fullnode. One instance per run; every
/// operation is a sequential request/response exchange.
pub struct SuiRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl SuiRpcClient {
    pub fn new(url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(method, id, "rpc call");

        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let envelope: RpcEnvelope<T> = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = envelope.error {
            return Err(OpsError::Rpc(format!(
                "{} failed with code {}: {}",
                method, error.code, error.message
            )));
        }
        envelope
            .result
            .ok_or_else(|| OpsError::Rpc(format!("{} returned neither result nor error", method)))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn get_object(&self, object_id: &str, options: Value) -> Result<ObjectData> {
        let response: ObjectResponse = self
            .call("sui_getObject", json!([object_id, options]))
            .await?;
        response
            .data
            .ok_or_else(|| OpsError::ObjectNotFound(object_id.to_string()))
    }

    /// Resolve the (id, version, digest) triple for an owned object input.
    pub async fn get_object_ref(&self, object_id: &str) -> Result<ObjectRef> {
        let data = self.get_object(object_id, json!({})).await?;
        object_ref_from_data(&data)
    }

    /// Resolve a shared object input; the initial shared version comes from
    /// the owner field, not the current version.
    pub async fn get_shared_object_arg(&self, object_id: &str, mutable: bool) -> Result<ObjectArg> {
        let data = self
            .get_object(object_id, json!({"showOwner": true}))
            .await?;
        let initial_shared_version = data
            .owner
            .as_ref()
            .and_then(|owner| owner.initial_shared_version())
            .ok_or_else(|| {
                OpsError::Rpc(format!("object {} is not shared", object_id))
            })?;
        Ok(ObjectArg::SharedObject {
            id: SuiAddress::parse(&data.object_id)?,
            initial_shared_version,
            mutable,
        })
    }

    /// The declared Move type of an object, e.g. `0x2::kiosk::Kiosk`.
    pub async fn get_object_type(&self, object_id: &str) -> Result<Option<String>> {
        let data = self.get_object(object_id, json!({"showType": true})).await?;
        Ok(data.object_type)
    }

    /// All owned objects of one struct type, following pagination.
    pub async fn get_owned_objects_of_type(
        &self,
        address: &SuiAddress,
        struct_type: &str,
    ) -> Result<Vec<ObjectData>> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let query = json!({
                "filter": {"StructType": struct_type},
                "options": {"showContent": true, "showType": true},
            });
            let page: ObjectPage = self
                .call(
                    "suix_getOwnedObjects",
                    json!([address.to_string(), query, cursor, null]),
                )
                .await?;
            results.extend(page.data.into_iter().filter_map(|r| r.data));
            if !page.has_next_page {
                return Ok(results);
            }
            cursor = page.next_cursor;
        }
    }

    pub async fn reference_gas_price(&self) -> Result<u64> {
        let price: String = self.call("suix_getReferenceGasPrice", json!([])).await?;
        price
            .parse()
            .map_err(|_| OpsError::Rpc(format!("unparseable gas price: {}", price)))
    }

    /// Pick owned SUI coins until they cover the budget.
    pub async fn select_gas(&self, owner: &SuiAddress, budget: u64) -> Result<Vec<ObjectRef>> {
        let mut payment = Vec::new();
        let mut covered: u64 = 0;
        let mut cursor: Option<String> = None;
        loop {
            let page: CoinPage = self
                .call(
                    "suix_getCoins",
                    json!([owner.to_string(), SUI_COIN_TYPE, cursor, null]),
                )
                .await?;
            for coin in &page.data {
                payment.push(ObjectRef {
                    id: SuiAddress::parse(&coin.coin_object_id)?,
                    version: coin.version,
                    digest: ObjectDigest::from_base58(&coin.digest)?,
                });
                covered = covered.saturating_add(coin.balance);
                if covered >= budget {
                    return Ok(payment);
                }
            }
            if !page.has_next_page {
                return Err(OpsError::InsufficientGas {
                    needed: budget,
                    available: covered,
                });
            }
            cursor = page.next_cursor;
        }
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    pub async fn execute_transaction_block(
        &self,
        tx_bytes_b64: &str,
        signatures: &[String],
    ) -> Result<TransactionBlockResponse> {
        self.call(
            "sui_executeTransactionBlock",
            json!([
                tx_bytes_b64,
                signatures,
                {
                    "showEffects": true,
                    "showObjectChanges": true,
                },
                "WaitForLocalExecution",
            ]),
        )
        .await
    }
}

pub fn object_ref_from_data(data: &ObjectData) -> Result<ObjectRef> {
    Ok(ObjectRef {
        id: SuiAddress::parse(&data.object_id)?,
        version: data.version,
        digest: ObjectDigest::from_base58(&data.digest)?,
    })
}
