pub mod builder;
pub mod types;

pub use builder::ProgrammableTransactionBuilder;
pub use types::{
    Argument, CallArg, Command, GasData, ObjectArg, ObjectId, ObjectRef, StructTag, SuiAddress,
    TransactionData, TypeTag,
};
