pub mod cli;
pub mod config;
pub mod effects;
pub mod error;
pub mod kiosk;
pub mod policy;
pub mod rpc;
pub mod signer;
pub mod template;
pub mod tx;

pub use error::{OpsError, Result};
