//! Extraction of interesting created objects out of transaction effects. Each
//! operation cares about exactly one object: a package, a kiosk, a minted
//! asset, or a dynamic field written by the kiosk module.

use crate::error::{OpsError, Result};
use crate::rpc::models::{TransactionBlockResponse, TransactionEffects};
use crate::rpc::SuiRpcClient;

/// Fail the command when execution did not succeed, mirroring the status
/// check every original script performed before reading `created`.
pub fn ensure_success(response: &TransactionBlockResponse) -> Result<&TransactionEffects> {
    let effects = response
        .effects
        .as_ref()
        .ok_or_else(|| OpsError::ExecutionFailed("response carried no effects".to_string()))?;
    if !effects.status.is_success() {
        let detail = effects
            .status
            .error
            .clone()
            .unwrap_or_else(|| effects.status.status.clone());
        return Err(OpsError::ExecutionFailed(detail));
    }
    Ok(effects)
}

/// The single immutable created object: the package ID after a publish.
pub fn created_package(effects: &TransactionEffects) -> Option<String> {
    effects
        .created
        .iter()
        .find(|entry| entry.owner.is_immutable())
        .map(|entry| entry.reference.object_id.clone())
}

pub fn first_created(effects: &TransactionEffects) -> Option<String> {
    effects
        .created
        .first()
        .map(|entry| entry.reference.object_id.clone())
}

/// Walk the created objects and return the one whose on-chain type matches.
/// The type is not part of the effects, so each candidate costs one
/// `sui_getObject` round trip, like the original scripts' lookup loops.
pub async fn find_created_by_type(
    client: &SuiRpcClient,
    effects: &TransactionEffects,
    target_type: &str,
) -> Result<Option<String>> {
    for entry in &effects.created {
        let object_id = &entry.reference.object_id;
        match client.get_object_type(object_id).await {
            Ok(Some(object_type)) if object_type == target_type => {
                return Ok(Some(object_id.clone()));
            }
            Ok(_) => {}
            Err(OpsError::ObjectNotFound(_)) => {
                // Wrapped into another object before we could look; skip
                tracing::debug!(object_id, "created object no longer addressable");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}
