//! BCS shapes for a programmable transaction, matching the wire layout the
//! fullnode expects in `sui_executeTransactionBlock`. Enum variant order is
//! load-bearing: BCS encodes variants by position.

use crate::error::{OpsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 32-byte account address, rendered `0x`-prefixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuiAddress(pub [u8; 32]);

/// Object IDs share the address representation.
pub type ObjectId = SuiAddress;

impl SuiAddress {
    pub const ZERO: SuiAddress = SuiAddress([0u8; 32]);

    /// Parse a hex address, accepting the short forms the original scripts
    /// normalized (`0x2` -> 32 bytes, left padded).
    pub fn parse(s: &str) -> Result<Self> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        if hex_part.is_empty() || hex_part.len() > 64 {
            return Err(OpsError::InvalidAddress(s.to_string()));
        }
        let padded = format!("{:0>64}", hex_part);
        let bytes =
            hex::decode(&padded).map_err(|_| OpsError::InvalidAddress(s.to_string()))?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(SuiAddress(out))
    }
}

impl fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for SuiAddress {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// (id, version, digest) triple identifying one version of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub id: ObjectId,
    pub version: u64,
    pub digest: ObjectDigest,
}

/// 32-byte object digest, carried between RPC responses and inputs as the
/// base58 string the fullnode uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDigest(pub Vec<u8>);

impl ObjectDigest {
    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| OpsError::Encoding(format!("invalid base58 digest: {}", s)))?;
        if bytes.len() != 32 {
            return Err(OpsError::Encoding(format!(
                "digest must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(ObjectDigest(bytes))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObjectArg {
    ImmOrOwnedObject(ObjectRef),
    SharedObject {
        id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    },
    Receiving(ObjectRef),
}

impl ObjectArg {
    pub fn id(&self) -> ObjectId {
        match self {
            ObjectArg::ImmOrOwnedObject(oref) | ObjectArg::Receiving(oref) => oref.id,
            ObjectArg::SharedObject { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CallArg {
    Pure(Vec<u8>),
    Object(ObjectArg),
}

/// Reference to an input or an earlier command's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgrammableMoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    MoveCall(Box<ProgrammableMoveCall>),
    TransferObjects(Vec<Argument>, Argument),
    SplitCoins(Argument, Vec<Argument>),
    MergeCoins(Argument, Vec<Argument>),
    Publish(Vec<Vec<u8>>, Vec<ObjectId>),
    MakeMoveVec(Option<TypeTag>, Vec<Argument>),
    Upgrade(Vec<Vec<u8>>, Vec<ObjectId>, ObjectId, Argument),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransactionKind {
    ProgrammableTransaction(ProgrammableTransaction),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasData {
    pub payment: Vec<ObjectRef>,
    pub owner: SuiAddress,
    pub price: u64,
    pub budget: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransactionExpiration {
    None,
    Epoch(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDataV1 {
    pub kind: TransactionKind,
    pub sender: SuiAddress,
    pub gas_data: GasData,
    pub expiration: TransactionExpiration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransactionData {
    V1(TransactionDataV1),
}

impl TransactionData {
    pub fn to_bcs_bytes(&self) -> Result<Vec<u8>> {
        bcs::to_bytes(self).map_err(|e| OpsError::Encoding(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    U16,
    U32,
    U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructTag {
    pub address: SuiAddress,
    pub module: String,
    pub name: String,
    pub type_params: Vec<TypeTag>,
}

impl StructTag {
    pub fn new(address: SuiAddress, module: &str, name: &str, type_params: Vec<TypeTag>) -> Self {
        Self {
            address,
            module: module.to_string(),
            name: name.to_string(),
            type_params,
        }
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if !self.type_params.is_empty() {
            write!(f, "<")?;
            for (i, param) in self.type_params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", param)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::U8 => write!(f, "u8"),
            TypeTag::U16 => write!(f, "u16"),
            TypeTag::U32 => write!(f, "u32"),
            TypeTag::U64 => write!(f, "u64"),
            TypeTag::U128 => write!(f, "u128"),
            TypeTag::U256 => write!(f, "u256"),
            TypeTag::Address => write!(f, "address"),
            TypeTag::Signer => write!(f, "signer"),
            TypeTag::Vector(inner) => write!(f, "vector<{}>", inner),
            TypeTag::Struct(tag) => write!(f, "{}", tag),
        }
    }
}

impl FromStr for TypeTag {
    type Err = OpsError;

    /// Parse type strings of the form the config carries, e.g.
    /// `0xP::tokenized_asset::TokenizedAsset<0xQ::template::TEMPLATE>`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parser = TypeTagParser { input: s, pos: 0 };
        let tag = parser.parse_tag()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(OpsError::InvalidTypeTag(s.to_string()));
        }
        Ok(tag)
    }
}

struct TypeTagParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeTagParser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        while self.rest().starts_with(' ') {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn take_segment(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn err(&self) -> OpsError {
        OpsError::InvalidTypeTag(self.input.to_string())
    }

    fn parse_tag(&mut self) -> Result<TypeTag> {
        self.skip_ws();
        let rest = self.rest();
        for (token, tag) in [
            ("bool", TypeTag::Bool),
            ("u8", TypeTag::U8),
            ("u16", TypeTag::U16),
            ("u32", TypeTag::U32),
            ("u64", TypeTag::U64),
            ("u128", TypeTag::U128),
            ("u256", TypeTag::U256),
            ("address", TypeTag::Address),
            ("signer", TypeTag::Signer),
        ] {
            if rest == token
                || (rest.starts_with(token)
                    && !rest[token.len()..]
                        .starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_'))
            {
                self.pos += token.len();
                return Ok(tag);
            }
        }

        if self.eat("vector<") {
            let inner = self.parse_tag()?;
            self.skip_ws();
            if !self.eat(">") {
                return Err(self.err());
            }
            return Ok(TypeTag::Vector(Box::new(inner)));
        }

        // Struct tag: address::module::Name[<params>]
        let addr_str = self.take_segment();
        let address = SuiAddress::parse(addr_str).map_err(|_| self.err())?;
        if !self.eat("::") {
            return Err(self.err());
        }
        let module = self.take_segment().to_string();
        if module.is_empty() || !self.eat("::") {
            return Err(self.err());
        }
        let name = self.take_segment().to_string();
        if name.is_empty() {
            return Err(self.err());
        }

        let mut type_params = Vec::new();
        if self.eat("<") {
            loop {
                type_params.push(self.parse_tag()?);
                self.skip_ws();
                if self.eat(",") {
                    continue;
                }
                if self.eat(">") {
                    break;
                }
                return Err(self.err());
            }
        }

        Ok(TypeTag::Struct(Box::new(StructTag {
            address,
            module,
            name,
            type_params,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_pads_short_forms() {
        let two = SuiAddress::parse("0x2").unwrap();
        assert_eq!(two.0[31], 2);
        assert_eq!(&two.0[..31], &[0u8; 31]);
        assert_eq!(
            two.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000002"
        );
    }

    #[test]
    fn test_address_parse_rejects_garbage() {
        assert!(SuiAddress::parse("0x").is_err());
        assert!(SuiAddress::parse("0xzz").is_err());
        assert!(SuiAddress::parse(&format!("0x{}", "1".repeat(65))).is_err());
    }

    #[test]
    fn test_address_bcs_is_raw_32_bytes() {
        let addr = SuiAddress::parse("0x2").unwrap();
        let bytes = bcs::to_bytes(&addr).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[31], 2);
    }

    #[test]
    fn test_argument_bcs_layout() {
        // Variant index as ULEB, then the payload
        assert_eq!(bcs::to_bytes(&Argument::GasCoin).unwrap(), vec![0]);
        assert_eq!(bcs::to_bytes(&Argument::Input(3)).unwrap(), vec![1, 3, 0]);
        assert_eq!(bcs::to_bytes(&Argument::Result(1)).unwrap(), vec![2, 1, 0]);
        assert_eq!(
            bcs::to_bytes(&Argument::NestedResult(1, 2)).unwrap(),
            vec![3, 1, 0, 2, 0]
        );
    }

    #[test]
    fn test_type_tag_parse_primitives() {
        assert_eq!("u64".parse::<TypeTag>().unwrap(), TypeTag::U64);
        assert_eq!("bool".parse::<TypeTag>().unwrap(), TypeTag::Bool);
        assert_eq!(
            "vector<u8>".parse::<TypeTag>().unwrap(),
            TypeTag::Vector(Box::new(TypeTag::U8))
        );
    }

    #[test]
    fn test_type_tag_parse_nested_struct() {
        let tag: TypeTag = "0xabc::tokenized_asset::TokenizedAsset<0xdef::template::TEMPLATE>"
            .parse()
            .unwrap();
        match tag {
            TypeTag::Struct(outer) => {
                assert_eq!(outer.module, "tokenized_asset");
                assert_eq!(outer.name, "TokenizedAsset");
                assert_eq!(outer.type_params.len(), 1);
                match &outer.type_params[0] {
                    TypeTag::Struct(inner) => assert_eq!(inner.name, "TEMPLATE"),
                    other => panic!("expected struct param, got {:?}", other),
                }
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_type_tag_rejects_trailing_input() {
        assert!("u64garbage".parse::<TypeTag>().is_err());
        assert!("0x2::kiosk::Kiosk<".parse::<TypeTag>().is_err());
    }

    #[test]
    fn test_type_tag_display_round_trip() {
        let s = "0x0000000000000000000000000000000000000000000000000000000000000002::kiosk::Kiosk";
        let tag: TypeTag = s.parse().unwrap();
        assert_eq!(tag.to_string(), s);
        assert_eq!(tag.to_string().parse::<TypeTag>().unwrap(), tag);
    }

    #[test]
    fn test_base58_digest_round_trip() {
        // 32 '1' characters encode 32 zero bytes
        let digest = ObjectDigest::from_base58("11111111111111111111111111111111").unwrap();
        assert_eq!(digest.0, vec![0u8; 32]);
        assert!(ObjectDigest::from_base58("0OIl").is_err());
        assert!(ObjectDigest::from_base58("abc").is_err());
    }
}
