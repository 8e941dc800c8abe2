//! Response shapes for the handful of fullnode methods the operations use.
//! Only the fields the commands read are modeled; everything else rides along
//! as raw JSON.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The fullnode is inconsistent about versions: object reads return them as
/// decimal strings, effects return them as numbers.
pub fn flexible_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcEnvelope<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

// ============================================================================
// Objects
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ObjectResponse {
    pub data: Option<ObjectData>,
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    pub object_id: String,
    #[serde(deserialize_with = "flexible_u64")]
    pub version: u64,
    pub digest: String,
    #[serde(rename = "type")]
    pub object_type: Option<String>,
    pub owner: Option<Owner>,
    pub content: Option<ObjectContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Owner {
    Immutable(String),
    Address {
        #[serde(rename = "AddressOwner")]
        address_owner: String,
    },
    Object {
        #[serde(rename = "ObjectOwner")]
        object_owner: String,
    },
    Shared {
        #[serde(rename = "Shared")]
        shared: SharedOwner,
    },
    Other(Value),
}

/// The fullnode serializes this field snake_case, unlike the camelCase used
/// everywhere else in object responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedOwner {
    #[serde(deserialize_with = "flexible_u64")]
    pub initial_shared_version: u64,
}

impl Owner {
    pub fn is_immutable(&self) -> bool {
        matches!(self, Owner::Immutable(s) if s == "Immutable")
    }

    pub fn initial_shared_version(&self) -> Option<u64> {
        match self {
            Owner::Shared { shared } => Some(shared.initial_shared_version),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
    pub data_type: String,
    #[serde(rename = "type")]
    pub object_type: Option<String>,
    #[serde(default)]
    pub fields: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPage {
    pub data: Vec<ObjectResponse>,
    pub has_next_page: bool,
    pub next_cursor: Option<String>,
}

// ============================================================================
// Coins
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinPage {
    pub data: Vec<Coin>,
    pub has_next_page: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    pub coin_object_id: String,
    #[serde(deserialize_with = "flexible_u64")]
    pub version: u64,
    pub digest: String,
    #[serde(deserialize_with = "flexible_u64")]
    pub balance: u64,
}

// ============================================================================
// Transaction execution
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlockResponse {
    pub digest: String,
    pub effects: Option<TransactionEffects>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEffects {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub created: Vec<OwnedObjectRef>,
    pub transaction_digest: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExecutionStatus {
    pub status: String,
    pub error: Option<String>,
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Deserialize)]
pub struct OwnedObjectRef {
    pub owner: Owner,
    pub reference: SuiObjectRef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiObjectRef {
    pub object_id: String,
    #[serde(deserialize_with = "flexible_u64")]
    pub version: u64,
    pub digest: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_variants_parse() {
        let shared: Owner =
            serde_json::from_str(r#"{"Shared":{"initial_shared_version":42}}"#).unwrap();
        assert_eq!(shared.initial_shared_version(), Some(42));

        let immutable: Owner = serde_json::from_str(r#""Immutable""#).unwrap();
        assert!(immutable.is_immutable());

        let address: Owner =
            serde_json::from_str(r#"{"AddressOwner":"0xabc"}"#).unwrap();
        assert!(!address.is_immutable());
        assert_eq!(address.initial_shared_version(), None);
    }

    #[test]
    fn test_effects_parse_with_created() {
        let json = r#"{
            "status": {"status": "success"},
            "created": [
                {
                    "owner": "Immutable",
                    "reference": {"objectId": "0x1234", "version": 5, "digest": "9bJzNq"}
                },
                {
                    "owner": {"ObjectOwner": "0xdead"},
                    "reference": {"objectId": "0x5678", "version": "6", "digest": "9bJzNq"}
                }
            ],
            "transactionDigest": "D1gEsT"
        }"#;
        let effects: TransactionEffects = serde_json::from_str(json).unwrap();
        assert!(effects.status.is_success());
        assert_eq!(effects.created.len(), 2);
        assert!(effects.created[0].owner.is_immutable());
        assert_eq!(effects.created[1].reference.version, 6);
    }

    #[test]
    fn test_effects_without_created_defaults_empty() {
        let effects: TransactionEffects = serde_json::from_str(
            r#"{"status": {"status": "failure", "error": "MoveAbort"}}"#,
        )
        .unwrap();
        assert!(!effects.status.is_success());
        assert!(effects.created.is_empty());
        assert_eq!(effects.status.error.as_deref(), Some("MoveAbort"));
    }

    #[test]
    fn test_coin_balance_parses_string() {
        let coin: Coin = serde_json::from_str(
            r#"{"coinObjectId": "0x1", "version": "8", "digest": "abc", "balance": "1000000"}"#,
        )
        .unwrap();
        assert_eq!(coin.balance, 1_000_000);
        assert_eq!(coin.version, 8);
    }
}
