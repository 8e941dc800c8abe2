use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("no kiosk owner cap for kiosk {0}")]
    KioskCapNotFound(String),

    #[error("no transfer policy cap for policy {0}")]
    PolicyCapNotFound(String),

    #[error("transaction failed: {0}")]
    ExecutionFailed(String),

    #[error("not enough gas: need {needed} MIST, owned coins hold {available}")]
    InsufficientGas { needed: u64, available: u64 },

    #[error("invalid address or object id: {0}")]
    InvalidAddress(String),

    #[error("invalid type tag: {0}")]
    InvalidTypeTag(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("malformed bytecode: {0}")]
    Bytecode(String),

    #[error("constant {index} has type {actual}, expected {expected}")]
    ConstantTypeMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("constant {index} does not hold the expected current value")]
    ConstantValueMismatch { index: usize },

    #[error("no constant at index {0}")]
    ConstantIndexOutOfRange(usize),

    #[error("identifier rename produces duplicate: {0}")]
    DuplicateIdentifier(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OpsError>;
