//! Minimal reader/writer for the serialized Move module envelope: magic,
//! version, ULEB table headers, table payloads, self-module-handle index.
//!
//! Only the tables that reference the identifier pool are decoded
//! structurally (handles, struct defs, identifiers, constant pool); every
//! other table is carried through as opaque bytes. Re-serialization keeps the
//! original table order and recomputes offsets, which is all a rename or a
//! constant patch can disturb.

use crate::error::{OpsError, Result};

const MAGIC: [u8; 4] = [0xA1, 0x1C, 0xEB, 0x0B];

/// Binary format versions whose table layout and signature token codes this
/// parser understands. u16/u32/u256 tokens arrived in version 6.
const MIN_VERSION: u32 = 6;
const MAX_VERSION: u32 = 6;

pub const KIND_MODULE_HANDLES: u8 = 1;
pub const KIND_STRUCT_HANDLES: u8 = 2;
pub const KIND_FUNCTION_HANDLES: u8 = 3;
pub const KIND_CONSTANT_POOL: u8 = 6;
pub const KIND_IDENTIFIERS: u8 = 7;
pub const KIND_STRUCT_DEFS: u8 = 10;
pub const KIND_FRIEND_DECLS: u8 = 11;

// Serialized signature token codes (binary format v6).
const TOKEN_BOOL: u8 = 0x1;
const TOKEN_ADDRESS: u8 = 0x5;
const TOKEN_REFERENCE: u8 = 0x6;
const TOKEN_MUT_REFERENCE: u8 = 0x7;
const TOKEN_STRUCT: u8 = 0x8;
const TOKEN_TYPE_PARAMETER: u8 = 0x9;
const TOKEN_VECTOR: u8 = 0xA;
const TOKEN_STRUCT_INST: u8 = 0xB;
const TOKEN_U256: u8 = 0xF;

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleHandle {
    pub address: u32,
    pub name: u32,
}

#[derive(Debug, Clone)]
pub struct StructHandle {
    pub module: u32,
    pub name: u32,
    pub abilities: u32,
    /// (abilities, is_phantom) per type parameter.
    pub type_parameters: Vec<(u32, u8)>,
}

#[derive(Debug, Clone)]
pub struct FunctionHandle {
    pub module: u32,
    pub name: u32,
    pub parameters: u32,
    pub return_: u32,
    pub type_parameters: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: u32,
    /// Raw signature token; opaque, only skipped over during parsing.
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum FieldInfo {
    Native,
    Declared(Vec<FieldDef>),
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub struct_handle: u32,
    pub field_info: FieldInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    /// Serialized signature token naming the constant's type.
    pub type_: Vec<u8>,
    /// BCS bytes of the value.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Table {
    ModuleHandles(Vec<ModuleHandle>),
    StructHandles(Vec<StructHandle>),
    FunctionHandles(Vec<FunctionHandle>),
    Identifiers(Vec<String>),
    ConstantPool(Vec<Constant>),
    StructDefs(Vec<StructDef>),
    FriendDecls(Vec<ModuleHandle>),
    Opaque(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub version: u32,
    /// Tables in original header order.
    pub tables: Vec<(u8, Table)>,
    pub self_module_handle_idx: u32,
}

impl CompiledModule {
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        let magic = reader.take(4)?;
        if magic != MAGIC {
            return Err(OpsError::Bytecode(format!(
                "bad magic: {}",
                hex::encode(magic)
            )));
        }
        let version = reader.u32_le()?;
        if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
            return Err(OpsError::Bytecode(format!(
                "unsupported binary format version {}",
                version
            )));
        }
        let table_count = reader.uleb()?;

        let mut headers = Vec::with_capacity(table_count as usize);
        for _ in 0..table_count {
            let kind = reader.uleb()? as u8;
            let offset = reader.uleb()? as usize;
            let length = reader.uleb()? as usize;
            headers.push((kind, offset, length));
        }

        let data_start = reader.position();
        let data_end = data_start
            + headers
                .iter()
                .map(|(_, offset, length)| offset + length)
                .max()
                .unwrap_or(0);
        if data_end > bytes.len() {
            return Err(OpsError::Bytecode(
                "table header points past end of module".to_string(),
            ));
        }

        let mut tables = Vec::with_capacity(headers.len());
        for (kind, offset, length) in headers {
            let payload = &bytes[data_start + offset..data_start + offset + length];
            tables.push((kind, parse_table(kind, payload)?));
        }

        let mut trailer = Reader::new(&bytes[data_end..]);
        let self_module_handle_idx = trailer.uleb()? as u32;
        if !trailer.is_empty() {
            return Err(OpsError::Bytecode(
                "trailing bytes after module".to_string(),
            ));
        }

        Ok(Self {
            version,
            tables,
            self_module_handle_idx,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payloads: Vec<(u8, Vec<u8>)> = self
            .tables
            .iter()
            .map(|(kind, table)| (*kind, serialize_table(table)))
            .collect();

        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.version.to_le_bytes());
        write_uleb(&mut out, self.tables.len() as u64);

        let mut offset = 0u64;
        for (kind, payload) in &payloads {
            write_uleb(&mut out, *kind as u64);
            write_uleb(&mut out, offset);
            write_uleb(&mut out, payload.len() as u64);
            offset += payload.len() as u64;
        }
        for (_, payload) in &payloads {
            out.extend_from_slice(payload);
        }
        write_uleb(&mut out, self.self_module_handle_idx as u64);
        Ok(out)
    }

    pub fn table(&self, kind: u8) -> Option<&Table> {
        self.tables
            .iter()
            .find(|(table_kind, _)| *table_kind == kind)
            .map(|(_, table)| table)
    }

    pub fn table_mut(&mut self, kind: u8) -> Option<&mut Table> {
        self.tables
            .iter_mut()
            .find(|(table_kind, _)| *table_kind == kind)
            .map(|(_, table)| table)
    }

    pub fn identifiers(&self) -> &[String] {
        match self.table(KIND_IDENTIFIERS) {
            Some(Table::Identifiers(identifiers)) => identifiers,
            _ => &[],
        }
    }

    pub fn constants(&self) -> &[Constant] {
        match self.table(KIND_CONSTANT_POOL) {
            Some(Table::ConstantPool(constants)) => constants,
            _ => &[],
        }
    }
}

fn parse_table(kind: u8, payload: &[u8]) -> Result<Table> {
    let mut reader = Reader::new(payload);
    let table = match kind {
        KIND_MODULE_HANDLES => Table::ModuleHandles(parse_module_handles(&mut reader)?),
        KIND_FRIEND_DECLS => Table::FriendDecls(parse_module_handles(&mut reader)?),
        KIND_STRUCT_HANDLES => {
            let mut handles = Vec::new();
            while !reader.is_empty() {
                let module = reader.uleb()? as u32;
                let name = reader.uleb()? as u32;
                let abilities = reader.uleb()? as u32;
                let count = reader.uleb()?;
                let mut type_parameters = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let param_abilities = reader.uleb()? as u32;
                    let is_phantom = reader.u8()?;
                    type_parameters.push((param_abilities, is_phantom));
                }
                handles.push(StructHandle {
                    module,
                    name,
                    abilities,
                    type_parameters,
                });
            }
            Table::StructHandles(handles)
        }
        KIND_FUNCTION_HANDLES => {
            let mut handles = Vec::new();
            while !reader.is_empty() {
                let module = reader.uleb()? as u32;
                let name = reader.uleb()? as u32;
                let parameters = reader.uleb()? as u32;
                let return_ = reader.uleb()? as u32;
                let count = reader.uleb()?;
                let mut type_parameters = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    type_parameters.push(reader.uleb()? as u32);
                }
                handles.push(FunctionHandle {
                    module,
                    name,
                    parameters,
                    return_,
                    type_parameters,
                });
            }
            Table::FunctionHandles(handles)
        }
        KIND_IDENTIFIERS => {
            let mut identifiers = Vec::new();
            while !reader.is_empty() {
                let length = reader.uleb()? as usize;
                let bytes = reader.take(length)?;
                let identifier = String::from_utf8(bytes.to_vec())
                    .map_err(|_| OpsError::Bytecode("identifier is not utf-8".to_string()))?;
                identifiers.push(identifier);
            }
            Table::Identifiers(identifiers)
        }
        KIND_CONSTANT_POOL => {
            let mut constants = Vec::new();
            while !reader.is_empty() {
                let type_ = read_token(&mut reader)?;
                let length = reader.uleb()? as usize;
                let data = reader.take(length)?.to_vec();
                constants.push(Constant { type_, data });
            }
            Table::ConstantPool(constants)
        }
        KIND_STRUCT_DEFS => {
            let mut defs = Vec::new();
            while !reader.is_empty() {
                let struct_handle = reader.uleb()? as u32;
                let tag = reader.u8()?;
                let field_info = match tag {
                    0x1 => FieldInfo::Native,
                    0x2 => {
                        let count = reader.uleb()?;
                        let mut fields = Vec::with_capacity(count as usize);
                        for _ in 0..count {
                            let name = reader.uleb()? as u32;
                            let signature = read_token(&mut reader)?;
                            fields.push(FieldDef { name, signature });
                        }
                        FieldInfo::Declared(fields)
                    }
                    other => {
                        return Err(OpsError::Bytecode(format!(
                            "unknown field info tag: {}",
                            other
                        )))
                    }
                };
                defs.push(StructDef {
                    struct_handle,
                    field_info,
                });
            }
            Table::StructDefs(defs)
        }
        _ => Table::Opaque(payload.to_vec()),
    };

    if !matches!(table, Table::Opaque(_)) && !reader.is_empty() {
        return Err(OpsError::Bytecode(format!(
            "table kind {} has trailing bytes",
            kind
        )));
    }
    Ok(table)
}

fn parse_module_handles(reader: &mut Reader<'_>) -> Result<Vec<ModuleHandle>> {
    let mut handles = Vec::new();
    while !reader.is_empty() {
        let address = reader.uleb()? as u32;
        let name = reader.uleb()? as u32;
        handles.push(ModuleHandle { address, name });
    }
    Ok(handles)
}

/// Consume one serialized signature token, returning its raw bytes.
fn read_token(reader: &mut Reader<'_>) -> Result<Vec<u8>> {
    let start = reader.position();
    skip_token(reader)?;
    Ok(reader.slice_from(start).to_vec())
}

fn skip_token(reader: &mut Reader<'_>) -> Result<()> {
    let code = reader.u8()?;
    match code {
        TOKEN_BOOL..=TOKEN_ADDRESS => Ok(()),
        0xC..=TOKEN_U256 => Ok(()), // signer, u16, u32, u256
        TOKEN_REFERENCE | TOKEN_MUT_REFERENCE | TOKEN_VECTOR => skip_token(reader),
        TOKEN_STRUCT | TOKEN_TYPE_PARAMETER => {
            reader.uleb()?;
            Ok(())
        }
        TOKEN_STRUCT_INST => {
            reader.uleb()?;
            let count = reader.uleb()?;
            for _ in 0..count {
                skip_token(reader)?;
            }
            Ok(())
        }
        other => Err(OpsError::Bytecode(format!(
            "unknown signature token: {:#x}",
            other
        ))),
    }
}

fn serialize_table(table: &Table) -> Vec<u8> {
    let mut out = Vec::new();
    match table {
        Table::ModuleHandles(handles) | Table::FriendDecls(handles) => {
            for handle in handles {
                write_uleb(&mut out, handle.address as u64);
                write_uleb(&mut out, handle.name as u64);
            }
        }
        Table::StructHandles(handles) => {
            for handle in handles {
                write_uleb(&mut out, handle.module as u64);
                write_uleb(&mut out, handle.name as u64);
                write_uleb(&mut out, handle.abilities as u64);
                write_uleb(&mut out, handle.type_parameters.len() as u64);
                for (abilities, is_phantom) in &handle.type_parameters {
                    write_uleb(&mut out, *abilities as u64);
                    out.push(*is_phantom);
                }
            }
        }
        Table::FunctionHandles(handles) => {
            for handle in handles {
                write_uleb(&mut out, handle.module as u64);
                write_uleb(&mut out, handle.name as u64);
                write_uleb(&mut out, handle.parameters as u64);
                write_uleb(&mut out, handle.return_ as u64);
                write_uleb(&mut out, handle.type_parameters.len() as u64);
                for abilities in &handle.type_parameters {
                    write_uleb(&mut out, *abilities as u64);
                }
            }
        }
        Table::Identifiers(identifiers) => {
            for identifier in identifiers {
                write_uleb(&mut out, identifier.len() as u64);
                out.extend_from_slice(identifier.as_bytes());
            }
        }
        Table::ConstantPool(constants) => {
            for constant in constants {
                out.extend_from_slice(&constant.type_);
                write_uleb(&mut out, constant.data.len() as u64);
                out.extend_from_slice(&constant.data);
            }
        }
        Table::StructDefs(defs) => {
            for def in defs {
                write_uleb(&mut out, def.struct_handle as u64);
                match &def.field_info {
                    FieldInfo::Native => out.push(0x1),
                    FieldInfo::Declared(fields) => {
                        out.push(0x2);
                        write_uleb(&mut out, fields.len() as u64);
                        for field in fields {
                            write_uleb(&mut out, field.name as u64);
                            out.extend_from_slice(&field.signature);
                        }
                    }
                }
            }
        }
        Table::Opaque(payload) => out.extend_from_slice(payload),
    }
    out
}

fn write_uleb(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn is_empty(&self) -> bool {
        self.position >= self.bytes.len()
    }

    fn slice_from(&self, start: usize) -> &'a [u8] {
        &self.bytes[start..self.position]
    }

    fn u8(&mut self) -> Result<u8> {
        let byte = *self
            .bytes
            .get(self.position)
            .ok_or_else(|| OpsError::Bytecode("unexpected end of bytecode".to_string()))?;
        self.position += 1;
        Ok(byte)
    }

    fn u32_le(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.position + count > self.bytes.len() {
            return Err(OpsError::Bytecode(
                "unexpected end of bytecode".to_string(),
            ));
        }
        let slice = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    fn uleb(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.u8()?;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(OpsError::Bytecode("uleb128 overflow".to_string()));
            }
        }
    }
}
