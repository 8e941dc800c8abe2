use crate::error::{OpsError, Result};
use crate::tx::types::{
    Argument, CallArg, Command, GasData, ObjectArg, ObjectId, ObjectRef, ProgrammableMoveCall,
    ProgrammableTransaction, SuiAddress, TransactionData, TransactionDataV1, TransactionExpiration,
    TransactionKind, TypeTag,
};
use serde::Serialize;

/// Accumulates inputs and commands for one programmable transaction. Object
/// inputs are deduplicated by ID so that a kiosk used by several commands in
/// the same transaction resolves to a single input slot.
#[derive(Default)]
pub struct ProgrammableTransactionBuilder {
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
}

impl ProgrammableTransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object input, reusing an existing slot for the same ID.
    pub fn obj(&mut self, arg: ObjectArg) -> Result<Argument> {
        let id = arg.id();
        for (index, input) in self.inputs.iter().enumerate() {
            if let CallArg::Object(existing) = input {
                if existing.id() == id {
                    return Ok(Argument::Input(index as u16));
                }
            }
        }
        self.push_input(CallArg::Object(arg))
    }

    /// BCS-encode a pure value as an input.
    pub fn pure<T: Serialize>(&mut self, value: &T) -> Result<Argument> {
        let bytes = bcs::to_bytes(value).map_err(|e| OpsError::Encoding(e.to_string()))?;
        self.push_input(CallArg::Pure(bytes))
    }

    fn push_input(&mut self, input: CallArg) -> Result<Argument> {
        let index = u16::try_from(self.inputs.len())
            .map_err(|_| OpsError::Encoding("too many transaction inputs".to_string()))?;
        self.inputs.push(input);
        Ok(Argument::Input(index))
    }

    pub fn move_call(
        &mut self,
        package: ObjectId,
        module: &str,
        function: &str,
        type_arguments: Vec<TypeTag>,
        arguments: Vec<Argument>,
    ) -> Argument {
        self.push_command(Command::MoveCall(Box::new(ProgrammableMoveCall {
            package,
            module: module.to_string(),
            function: function.to_string(),
            type_arguments,
            arguments,
        })))
    }

    pub fn transfer_objects(&mut self, objects: Vec<Argument>, recipient: Argument) -> Argument {
        self.push_command(Command::TransferObjects(objects, recipient))
    }

    pub fn publish(&mut self, modules: Vec<Vec<u8>>, dependencies: Vec<ObjectId>) -> Argument {
        self.push_command(Command::Publish(modules, dependencies))
    }

    fn push_command(&mut self, command: Command) -> Argument {
        self.commands.push(command);
        Argument::Result((self.commands.len() - 1) as u16)
    }

    /// Pick apart the tuple returned by the previous command.
    pub fn nested(&self, result: Argument, index: u16) -> Argument {
        match result {
            Argument::Result(command) => Argument::NestedResult(command, index),
            other => other,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn finish(
        self,
        sender: SuiAddress,
        gas_payment: Vec<ObjectRef>,
        gas_price: u64,
        gas_budget: u64,
    ) -> TransactionData {
        TransactionData::V1(TransactionDataV1 {
            kind: TransactionKind::ProgrammableTransaction(ProgrammableTransaction {
                inputs: self.inputs,
                commands: self.commands,
            }),
            sender,
            gas_data: GasData {
                payment: gas_payment,
                owner: sender,
                price: gas_price,
                budget: gas_budget,
            },
            expiration: TransactionExpiration::None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::types::ObjectDigest;

    fn owned(id_byte: u8) -> ObjectArg {
        ObjectArg::ImmOrOwnedObject(ObjectRef {
            id: SuiAddress([id_byte; 32]),
            version: 7,
            digest: ObjectDigest(vec![1u8; 32]),
        })
    }

    #[test]
    fn test_object_inputs_deduplicate_by_id() {
        let mut builder = ProgrammableTransactionBuilder::new();
        let a = builder.obj(owned(1)).unwrap();
        let b = builder.obj(owned(2)).unwrap();
        let a_again = builder.obj(owned(1)).unwrap();

        assert_eq!(a, Argument::Input(0));
        assert_eq!(b, Argument::Input(1));
        assert_eq!(a_again, a);
    }

    #[test]
    fn test_pure_values_are_bcs_encoded() {
        let mut builder = ProgrammableTransactionBuilder::new();
        builder.pure(&100_000u64).unwrap();
        builder.pure(&vec!["a".to_string(), "bc".to_string()]).unwrap();

        let data = builder.finish(SuiAddress::ZERO, vec![], 1000, 1_000_000);
        let TransactionData::V1(v1) = data;
        let TransactionKind::ProgrammableTransaction(pt) = v1.kind;
        match &pt.inputs[0] {
            CallArg::Pure(bytes) => assert_eq!(bytes, &100_000u64.to_le_bytes().to_vec()),
            other => panic!("expected pure input, got {:?}", other),
        }
        match &pt.inputs[1] {
            // vector<string>: count, then ULEB length + utf8 per element
            CallArg::Pure(bytes) => assert_eq!(bytes, &[2, 1, b'a', 2, b'b', b'c']),
            other => panic!("expected pure input, got {:?}", other),
        }
    }

    #[test]
    fn test_commands_number_their_results() {
        let mut builder = ProgrammableTransactionBuilder::new();
        let first = builder.move_call(SuiAddress::ZERO, "kiosk", "new", vec![], vec![]);
        let second = builder.move_call(SuiAddress::ZERO, "kiosk", "close", vec![], vec![]);

        assert_eq!(first, Argument::Result(0));
        assert_eq!(second, Argument::Result(1));
        assert_eq!(builder.nested(first, 1), Argument::NestedResult(0, 1));
    }

    #[test]
    fn test_finish_produces_signable_bcs() {
        let mut builder = ProgrammableTransactionBuilder::new();
        let item = builder.obj(owned(9)).unwrap();
        builder.transfer_objects(vec![item], Argument::GasCoin);

        let data = builder.finish(
            SuiAddress([5; 32]),
            vec![ObjectRef {
                id: SuiAddress([6; 32]),
                version: 3,
                digest: ObjectDigest(vec![2u8; 32]),
            }],
            750,
            5_000_000,
        );
        let bytes = data.to_bcs_bytes().unwrap();

        // V1 variant tag, then the programmable kind tag
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], 0);
        // sender address appears verbatim
        assert!(bytes.windows(32).any(|w| w == [5u8; 32]));
    }
}
