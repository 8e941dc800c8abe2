//! In-place patching of the pre-compiled tokenized-asset template module:
//! rename the module identifiers and rewrite the placeholder constants, then
//! re-serialize for `publish`.

pub mod module;
#[cfg(test)]
mod module_tests;

use crate::error::{OpsError, Result};
use module::{
    CompiledModule, Constant, Table, KIND_CONSTANT_POOL, KIND_FRIEND_DECLS, KIND_FUNCTION_HANDLES,
    KIND_IDENTIFIERS, KIND_MODULE_HANDLES, KIND_STRUCT_DEFS, KIND_STRUCT_HANDLES,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Pre-compiled bytecode of the `template` module. Obtained by compiling the
/// template package and dumping `build/template/bytecode_modules/template.mv`
/// as hex; must be rebuilt whenever the asset-tokenization package it depends
/// on is republished.
pub const TEMPLATE_BYTECODE_HEX: &str = "a11ceb0b060000000a010010021026033637046d0a05776e07e501e90108ce036006ae043e0aec04050cf10455001400090107010e01130215021602170004020001000c01000101010c01000102030700030207010000040307000605020007060700000a000100010b0a0b01020213030400030d010701000312080701000418030500050f0801010c05101001010c06110d0e00070c030600030604060109060c070f02080007080600070b040108070b010108000b0201080008050b0401080708050803010a02010803010805010807010b04010900010900010800080900030803080508050b0401080701070806020b010109000b02010900010b02010800010608060105010b01010800020900050841737365744361700d41737365744d65746164617461064f7074696f6e06537472696e670854454d504c415445095478436f6e746578740355726c0561736369690b64756d6d795f6669656c640c666e66745f666163746f727904696e6974096e65775f6173736574156e65775f756e736166655f66726f6d5f6279746573046e6f6e65066f7074696f6e137075626c69635f73686172655f6f626a6563740f7075626c69635f7472616e736665720673656e64657204736f6d6506737472696e670874656d706c617465087472616e736665720a74785f636f6e746578740375726c0475746638000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000010000000000000000000000000000000000000000000000000000000000000002030864000000000000000a02070653796d626f6c0a0205044e616d650a020c0b4465736372697074696f6e0a02090869636f6e5f75726c0101010a0201000002010801000000000229070111020c08070211050c07070311050c050704070621041038000c0205140704110938010c020b020c060b0007000b080b070b050b0607050a0138020c040c030b0438030b030b012e110838040200";

/// Placeholder values baked into the template's constant pool.
const PLACEHOLDER_SUPPLY: u64 = 100;
const PLACEHOLDER_SYMBOL: &str = "Symbol";
const PLACEHOLDER_NAME: &str = "Name";
const PLACEHOLDER_DESCRIPTION: &str = "Description";
const PLACEHOLDER_ICON_URL: &str = "icon_url";
const PLACEHOLDER_BURNABLE: bool = true;

/// Constant types the patcher can rewrite, named by their serialized
/// signature token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    /// `vector<u8>`, which is also how string constants are stored.
    VectorU8,
}

impl ConstantType {
    fn token(self) -> &'static [u8] {
        match self {
            ConstantType::Bool => &[0x1],
            ConstantType::U8 => &[0x2],
            ConstantType::U64 => &[0x3],
            ConstantType::U128 => &[0x4],
            ConstantType::Address => &[0x5],
            ConstantType::U16 => &[0xD],
            ConstantType::U32 => &[0xE],
            ConstantType::U256 => &[0xF],
            ConstantType::VectorU8 => &[0xA, 0x2],
        }
    }

    fn describe(token: &[u8]) -> String {
        match token {
            [0x1] => "bool".to_string(),
            [0x2] => "u8".to_string(),
            [0x3] => "u64".to_string(),
            [0x4] => "u128".to_string(),
            [0x5] => "address".to_string(),
            [0xD] => "u16".to_string(),
            [0xE] => "u32".to_string(),
            [0xF] => "u256".to_string(),
            [0xA, 0x2] => "vector<u8>".to_string(),
            other => format!("token {}", hex::encode(other)),
        }
    }
}

/// A compiled template module held open for patching.
#[derive(Debug)]
pub struct TemplateModule {
    inner: CompiledModule,
}

impl TemplateModule {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CompiledModule::deserialize(bytes)?,
        })
    }

    /// The built-in tokenized-asset template.
    pub fn embedded() -> Result<Self> {
        let bytes = hex::decode(TEMPLATE_BYTECODE_HEX)
            .map_err(|e| OpsError::Bytecode(format!("embedded template: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn identifiers(&self) -> &[String] {
        self.inner.identifiers()
    }

    pub fn constants(&self) -> &[Constant] {
        self.inner.constants()
    }

    /// Rename identifiers per `renames` (old name -> new name). The pool is
    /// re-sorted bytewise — the on-chain loader rejects unsorted pools — and
    /// every table referencing a name index is remapped.
    pub fn rename_identifiers(&mut self, renames: &BTreeMap<String, String>) -> Result<&mut Self> {
        let identifiers = self.inner.identifiers().to_vec();
        for old in renames.keys() {
            if !identifiers.iter().any(|identifier| identifier == old) {
                return Err(OpsError::Bytecode(format!(
                    "identifier not present in module: {}",
                    old
                )));
            }
        }

        let patched: Vec<String> = identifiers
            .iter()
            .map(|identifier| {
                renames
                    .get(identifier)
                    .cloned()
                    .unwrap_or_else(|| identifier.clone())
            })
            .collect();

        let mut sorted = patched.clone();
        sorted.sort();
        for pair in sorted.windows(2) {
            if pair[0] == pair[1] {
                return Err(OpsError::DuplicateIdentifier(pair[0].clone()));
            }
        }

        let remap: Vec<u32> = patched
            .iter()
            .map(|identifier| {
                sorted
                    .iter()
                    .position(|candidate| candidate == identifier)
                    .expect("sorted pool contains every patched identifier") as u32
            })
            .collect();
        let remap_index = |index: &mut u32| {
            if let Some(new_index) = remap.get(*index as usize) {
                *index = *new_index;
            }
        };

        for (kind, table) in &mut self.inner.tables {
            match (*kind, table) {
                (KIND_MODULE_HANDLES, Table::ModuleHandles(handles))
                | (KIND_FRIEND_DECLS, Table::FriendDecls(handles)) => {
                    for handle in handles {
                        remap_index(&mut handle.name);
                    }
                }
                (KIND_STRUCT_HANDLES, Table::StructHandles(handles)) => {
                    for handle in handles {
                        remap_index(&mut handle.name);
                    }
                }
                (KIND_FUNCTION_HANDLES, Table::FunctionHandles(handles)) => {
                    for handle in handles {
                        remap_index(&mut handle.name);
                    }
                }
                (KIND_STRUCT_DEFS, Table::StructDefs(defs)) => {
                    for def in defs {
                        if let module::FieldInfo::Declared(fields) = &mut def.field_info {
                            for field in fields {
                                remap_index(&mut field.name);
                            }
                        }
                    }
                }
                (KIND_IDENTIFIERS, table) => {
                    *table = Table::Identifiers(sorted.clone());
                }
                _ => {}
            }
        }
        Ok(self)
    }

    /// Replace every constant whose declared type and current BCS value match
    /// the expected ones. Returns how many constants were rewritten; matching
    /// on the current value keeps a stale template from being patched into
    /// the wrong slot.
    pub fn update_constants<T: Serialize>(
        &mut self,
        new_value: &T,
        expected_value: &T,
        type_: ConstantType,
    ) -> Result<usize> {
        let new_data = bcs::to_bytes(new_value).map_err(|e| OpsError::Encoding(e.to_string()))?;
        let expected_data =
            bcs::to_bytes(expected_value).map_err(|e| OpsError::Encoding(e.to_string()))?;

        let Some(Table::ConstantPool(constants)) = self.inner.table_mut(KIND_CONSTANT_POOL) else {
            return Err(OpsError::Bytecode("module has no constant pool".to_string()));
        };

        let mut updated = 0;
        for constant in constants.iter_mut() {
            if constant.type_ == type_.token() && constant.data == expected_data {
                constant.data = new_data.clone();
                updated += 1;
            }
        }
        if updated == 0 {
            return Err(OpsError::Bytecode(format!(
                "no {} constant holds the expected value",
                ConstantType::describe(type_.token())
            )));
        }
        Ok(updated)
    }

    /// Replace the constant at `index`, guarded by the expected type and
    /// current value.
    pub fn update_constant<T: Serialize>(
        &mut self,
        index: usize,
        new_value: &T,
        expected_value: &T,
        type_: ConstantType,
    ) -> Result<&mut Self> {
        let new_data = bcs::to_bytes(new_value).map_err(|e| OpsError::Encoding(e.to_string()))?;
        let expected_data =
            bcs::to_bytes(expected_value).map_err(|e| OpsError::Encoding(e.to_string()))?;

        let Some(Table::ConstantPool(constants)) = self.inner.table_mut(KIND_CONSTANT_POOL) else {
            return Err(OpsError::Bytecode("module has no constant pool".to_string()));
        };
        let constant = constants
            .get_mut(index)
            .ok_or(OpsError::ConstantIndexOutOfRange(index))?;

        if constant.type_ != type_.token() {
            return Err(OpsError::ConstantTypeMismatch {
                index,
                expected: ConstantType::describe(type_.token()),
                actual: ConstantType::describe(&constant.type_),
            });
        }
        if constant.data != expected_data {
            return Err(OpsError::ConstantValueMismatch { index });
        }
        constant.data = new_data;
        Ok(self)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.inner.serialize()
    }
}

/// Everything `publish` substitutes into the template.
#[derive(Debug, Clone)]
pub struct AssetTemplateFields {
    pub module_name: String,
    pub total_supply: u64,
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub icon_url: String,
    pub burnable: bool,
}

/// Patch the embedded template for one asset: module/witness rename plus the
/// six placeholder constants, in the same order the original publish script
/// applied them.
pub fn patch_asset_template(fields: &AssetTemplateFields) -> Result<Vec<u8>> {
    validate_module_name(&fields.module_name)?;

    let mut template = TemplateModule::embedded()?;

    let mut renames = BTreeMap::new();
    renames.insert(
        "template".to_string(),
        fields.module_name.to_lowercase(),
    );
    renames.insert(
        "TEMPLATE".to_string(),
        fields.module_name.to_uppercase(),
    );
    template.rename_identifiers(&renames)?;

    template.update_constants(&fields.total_supply, &PLACEHOLDER_SUPPLY, ConstantType::U64)?;
    template.update_constants(
        &fields.symbol,
        &PLACEHOLDER_SYMBOL.to_string(),
        ConstantType::VectorU8,
    )?;
    template.update_constants(
        &fields.name,
        &PLACEHOLDER_NAME.to_string(),
        ConstantType::VectorU8,
    )?;
    template.update_constants(
        &fields.description,
        &PLACEHOLDER_DESCRIPTION.to_string(),
        ConstantType::VectorU8,
    )?;
    template.update_constants(
        &fields.icon_url,
        &PLACEHOLDER_ICON_URL.to_string(),
        ConstantType::VectorU8,
    )?;
    template.update_constants(&fields.burnable, &PLACEHOLDER_BURNABLE, ConstantType::Bool)?;

    template.to_bytes()
}

fn validate_module_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_lowercase() || c == '_')
        .unwrap_or(false);
    let valid_rest = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_start || !valid_rest {
        return Err(OpsError::Bytecode(format!(
            "invalid module name: {:?} (want snake_case identifier)",
            name
        )));
    }
    Ok(())
}
