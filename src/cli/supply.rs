use crate::config::OpsConfig;
use crate::rpc::SuiRpcClient;
use anyhow::{Context, Result};
use serde_json::json;

/// Read the circulating and maximum supply off the AssetCap. No transaction.
pub async fn execute(client: &SuiRpcClient, config: &OpsConfig) -> Result<()> {
    if config.asset_cap.is_empty() {
        anyhow::bail!("set `asset_cap` in the config first");
    }

    let data = client
        .get_object(&config.asset_cap, json!({"showContent": true}))
        .await?;
    let content = data.content.as_ref().context("AssetCap has no content")?;

    let circulating = content
        .fields
        .get("supply")
        .and_then(|supply| supply.get("fields"))
        .and_then(|fields| fields.get("value"))
        .and_then(field_u64)
        .context("AssetCap content missing supply.value")?;
    let total = content
        .fields
        .get("total_supply")
        .and_then(field_u64)
        .context("AssetCap content missing total_supply")?;

    println!("Circulating supply: {}", circulating);
    println!("Total supply:       {}", total);
    Ok(())
}

/// u64 fields arrive as JSON strings from the fullnode.
fn field_u64(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_u64_accepts_both_encodings() {
        assert_eq!(field_u64(&json!("42")), Some(42));
        assert_eq!(field_u64(&json!(42)), Some(42));
        assert_eq!(field_u64(&json!(null)), None);
        assert_eq!(field_u64(&json!("nope")), None);
    }
}
