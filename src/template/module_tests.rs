use super::module::{CompiledModule, Table, KIND_IDENTIFIERS, KIND_MODULE_HANDLES};
use super::{
    patch_asset_template, AssetTemplateFields, ConstantType, TemplateModule, TEMPLATE_BYTECODE_HEX,
};
use crate::error::OpsError;
use std::collections::BTreeMap;

fn template_bytes() -> Vec<u8> {
    hex::decode(TEMPLATE_BYTECODE_HEX).unwrap()
}

fn renames(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(old, new)| (old.to_string(), new.to_string()))
        .collect()
}

#[test]
fn test_embedded_template_parses() {
    let template = TemplateModule::embedded().unwrap();

    let identifiers = template.identifiers();
    assert_eq!(identifiers.len(), 25);
    assert!(identifiers.iter().any(|i| i == "TEMPLATE"));
    assert!(identifiers.iter().any(|i| i == "template"));
    assert!(identifiers.iter().any(|i| i == "new_asset"));

    // The compiler already emits a sorted pool
    let mut sorted = identifiers.to_vec();
    sorted.sort();
    assert_eq!(identifiers, &sorted[..]);
}

#[test]
fn test_embedded_constants_hold_placeholders() {
    let template = TemplateModule::embedded().unwrap();
    let constants = template.constants();
    assert_eq!(constants.len(), 7);

    // u64 total supply placeholder
    assert_eq!(constants[0].type_, vec![0x3]);
    assert_eq!(constants[0].data, 100u64.to_le_bytes().to_vec());

    // string placeholders are vector<u8> with a BCS length prefix
    assert_eq!(constants[1].type_, vec![0xA, 0x2]);
    assert_eq!(constants[1].data, b"\x06Symbol".to_vec());
    assert_eq!(constants[2].data, b"\x04Name".to_vec());

    // burnable flag
    assert_eq!(constants[5].type_, vec![0x1]);
    assert_eq!(constants[5].data, vec![0x1]);
}

#[test]
fn test_serialize_without_changes_is_identity() {
    let bytes = template_bytes();
    let module = CompiledModule::deserialize(&bytes).unwrap();
    assert_eq!(module.serialize().unwrap(), bytes);
}

#[test]
fn test_rename_sorts_pool_and_remaps_handles() {
    let mut template = TemplateModule::embedded().unwrap();
    template
        .rename_identifiers(&renames(&[
            ("TEMPLATE", "MAGICAL_ASSET"),
            ("template", "magical_asset"),
        ]))
        .unwrap();

    // Round trip through bytes to prove the rewrite stays parseable
    let reparsed = TemplateModule::from_bytes(&template.to_bytes().unwrap()).unwrap();
    let identifiers = reparsed.identifiers();

    assert!(identifiers.iter().any(|i| i == "MAGICAL_ASSET"));
    assert!(identifiers.iter().any(|i| i == "magical_asset"));
    assert!(!identifiers.iter().any(|i| i == "TEMPLATE"));
    let mut sorted = identifiers.to_vec();
    sorted.sort();
    assert_eq!(identifiers, &sorted[..]);

    // The self module handle must still point at the renamed module
    let module = CompiledModule::deserialize(&template.to_bytes().unwrap()).unwrap();
    let Some(Table::ModuleHandles(handles)) = module.table(KIND_MODULE_HANDLES) else {
        panic!("module handles table missing");
    };
    let self_handle = &handles[module.self_module_handle_idx as usize];
    assert_eq!(
        module.identifiers()[self_handle.name as usize],
        "magical_asset"
    );
}

#[test]
fn test_rename_unknown_identifier_rejected() {
    let mut template = TemplateModule::embedded().unwrap();
    let err = template
        .rename_identifiers(&renames(&[("NOT_THERE", "X")]))
        .unwrap_err();
    assert!(matches!(err, OpsError::Bytecode(_)));
}

#[test]
fn test_rename_to_duplicate_rejected() {
    let mut template = TemplateModule::embedded().unwrap();
    let err = template
        .rename_identifiers(&renames(&[("TEMPLATE", "template")]))
        .unwrap_err();
    assert!(matches!(err, OpsError::DuplicateIdentifier(_)));
}

#[test]
fn test_update_constant_by_index() {
    let mut template = TemplateModule::embedded().unwrap();
    template
        .update_constant(0, &200u64, &100u64, ConstantType::U64)
        .unwrap();
    assert_eq!(template.constants()[0].data, 200u64.to_le_bytes().to_vec());
}

#[test]
fn test_update_constant_guards() {
    let mut template = TemplateModule::embedded().unwrap();

    // wrong index
    assert!(matches!(
        template
            .update_constant(99, &1u64, &100u64, ConstantType::U64)
            .unwrap_err(),
        OpsError::ConstantIndexOutOfRange(99)
    ));

    // wrong type for the slot
    assert!(matches!(
        template
            .update_constant(0, &true, &true, ConstantType::Bool)
            .unwrap_err(),
        OpsError::ConstantTypeMismatch { index: 0, .. }
    ));

    // right type, wrong expected value
    assert!(matches!(
        template
            .update_constant(0, &200u64, &42u64, ConstantType::U64)
            .unwrap_err(),
        OpsError::ConstantValueMismatch { index: 0 }
    ));
}

#[test]
fn test_update_constants_by_value() {
    let mut template = TemplateModule::embedded().unwrap();
    let updated = template
        .update_constants(
            &"MA".to_string(),
            &"Symbol".to_string(),
            ConstantType::VectorU8,
        )
        .unwrap();
    assert_eq!(updated, 1);
    assert_eq!(template.constants()[1].data, b"\x02MA".to_vec());

    // Value no longer present
    assert!(template
        .update_constants(
            &"MA".to_string(),
            &"Symbol".to_string(),
            ConstantType::VectorU8,
        )
        .is_err());
}

#[test]
fn test_patch_asset_template_full_flow() {
    let fields = AssetTemplateFields {
        module_name: "magical_asset".to_string(),
        total_supply: 200,
        symbol: "MA".to_string(),
        name: "Magical Asset".to_string(),
        description: "A magical asset that can be used for magical things!".to_string(),
        icon_url: "new-icon_url".to_string(),
        burnable: true,
    };
    let bytes = patch_asset_template(&fields).unwrap();

    let patched = TemplateModule::from_bytes(&bytes).unwrap();
    assert!(patched.identifiers().iter().any(|i| i == "MAGICAL_ASSET"));
    assert!(patched.identifiers().iter().any(|i| i == "magical_asset"));

    let constants = patched.constants();
    assert_eq!(constants[0].data, 200u64.to_le_bytes().to_vec());
    assert_eq!(constants[1].data, b"\x02MA".to_vec());
    assert_eq!(constants[4].data, b"\x0cnew-icon_url".to_vec());
}

#[test]
fn test_patch_rejects_bad_module_names() {
    for bad in ["", "Magical", "0asset", "has-dash", "has space"] {
        let fields = AssetTemplateFields {
            module_name: bad.to_string(),
            total_supply: 1,
            symbol: "X".to_string(),
            name: "X".to_string(),
            description: "X".to_string(),
            icon_url: "X".to_string(),
            burnable: false,
        };
        assert!(patch_asset_template(&fields).is_err(), "accepted {:?}", bad);
    }
}

#[test]
fn test_bad_magic_rejected() {
    let mut bytes = template_bytes();
    bytes[0] = 0xFF;
    assert!(matches!(
        CompiledModule::deserialize(&bytes).unwrap_err(),
        OpsError::Bytecode(_)
    ));
}

#[test]
fn test_unsupported_version_rejected() {
    let mut bytes = template_bytes();
    // version is the u32 LE right after the magic
    bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
    let err = CompiledModule::deserialize(&bytes).unwrap_err();
    assert!(matches!(err, OpsError::Bytecode(ref m) if m.contains("version")));

    bytes[4..8].copy_from_slice(&5u32.to_le_bytes());
    assert!(CompiledModule::deserialize(&bytes).is_err());
}

#[test]
fn test_truncated_module_rejected() {
    let bytes = template_bytes();
    assert!(CompiledModule::deserialize(&bytes[..bytes.len() / 2]).is_err());
    assert!(CompiledModule::deserialize(&[]).is_err());
}

#[test]
fn test_identifier_table_is_structurally_decoded() {
    let bytes = template_bytes();
    let module = CompiledModule::deserialize(&bytes).unwrap();
    match module.table(KIND_IDENTIFIERS) {
        Some(Table::Identifiers(identifiers)) => assert_eq!(identifiers.len(), 25),
        other => panic!("expected decoded identifiers, got {:?}", other),
    }
}
