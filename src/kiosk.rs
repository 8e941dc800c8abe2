//! Kiosk transaction composition. Mirrors the call sequences the marketplace
//! SDK emits: plain kiosks pass their `KioskOwnerCap` directly, personal
//! kiosks hold the cap inside a `PersonalKioskCap` and every mutation has to
//! borrow it out (`borrow_val`) and hand it back (`return_val`) within the
//! same transaction.

use crate::error::{OpsError, Result};
use crate::rpc::client::object_ref_from_data;
use crate::rpc::SuiRpcClient;
use crate::tx::{
    Argument, ObjectArg, ObjectRef, ProgrammableTransactionBuilder, SuiAddress, TypeTag,
};

pub const SUI_FRAMEWORK: &str = "0x2";
pub const KIOSK_MODULE: &str = "kiosk";
pub const PERSONAL_KIOSK_MODULE: &str = "personal_kiosk";

pub const KIOSK_TYPE: &str = "0x2::kiosk::Kiosk";
pub const KIOSK_OWNER_CAP_TYPE: &str = "0x2::kiosk::KioskOwnerCap";

/// Dynamic field types written by the kiosk module; place/lock/list commands
/// search created objects for these.
pub const ITEM_FIELD_TYPE: &str =
    "0x2::dynamic_field::Field<0x2::dynamic_object_field::Wrapper<0x2::kiosk::Item>, 0x2::object::ID>";
pub const LOCK_FIELD_TYPE: &str = "0x2::dynamic_field::Field<0x2::kiosk::Lock, bool>";
pub const LISTING_FIELD_TYPE: &str = "0x2::dynamic_field::Field<0x2::kiosk::Listing, u64>";

/// The owner cap for a kiosk, as discovered among the signer's objects.
#[derive(Debug, Clone)]
pub enum KioskCap {
    /// A bare `KioskOwnerCap` owned by the signer.
    Owned(ObjectRef),
    /// A `PersonalKioskCap` wrapping the owner cap.
    Personal(ObjectRef),
}

/// Find the cap for `kiosk_id` among the objects owned by `address`, checking
/// bare caps first and personal wrappers second.
pub async fn find_kiosk_cap(
    client: &SuiRpcClient,
    address: &SuiAddress,
    kiosk_id: &str,
    personal_kiosk_package: &str,
) -> Result<KioskCap> {
    let target = SuiAddress::parse(kiosk_id)?;

    for data in client
        .get_owned_objects_of_type(address, KIOSK_OWNER_CAP_TYPE)
        .await?
    {
        let kiosk_field = data
            .content
            .as_ref()
            .and_then(|content| content.fields.get("for"))
            .and_then(|value| value.as_str());
        if let Some(kiosk) = kiosk_field {
            if SuiAddress::parse(kiosk)? == target {
                return Ok(KioskCap::Owned(object_ref_from_data(&data)?));
            }
        }
    }

    if !personal_kiosk_package.is_empty() {
        let personal_cap_type = format!(
            "{}::{}::PersonalKioskCap",
            personal_kiosk_package, PERSONAL_KIOSK_MODULE
        );
        for data in client
            .get_owned_objects_of_type(address, &personal_cap_type)
            .await?
        {
            let kiosk_field = data
                .content
                .as_ref()
                .and_then(|content| content.fields.get("cap"))
                .and_then(|cap| cap.get("fields"))
                .and_then(|fields| fields.get("for"))
                .and_then(|value| value.as_str());
            if let Some(kiosk) = kiosk_field {
                if SuiAddress::parse(kiosk)? == target {
                    return Ok(KioskCap::Personal(object_ref_from_data(&data)?));
                }
            }
        }
    }

    Err(OpsError::KioskCapNotFound(kiosk_id.to_string()))
}

/// One kiosk mutation in flight. Holds the resolved kiosk/cap arguments and
/// the borrow that must be returned before the transaction is complete.
pub struct KioskTransaction<'a> {
    builder: &'a mut ProgrammableTransactionBuilder,
    framework: SuiAddress,
    kiosk: Argument,
    cap: Argument,
    /// (personal package, personal cap input, borrow hot potato)
    borrow: Option<(SuiAddress, Argument, Argument)>,
    finalized: bool,
}

impl<'a> KioskTransaction<'a> {
    pub fn new(
        builder: &'a mut ProgrammableTransactionBuilder,
        kiosk: ObjectArg,
        cap: &KioskCap,
        personal_kiosk_package: &str,
    ) -> Result<Self> {
        let framework = SuiAddress::parse(SUI_FRAMEWORK)?;
        let kiosk = builder.obj(kiosk)?;

        let (cap_arg, borrow) = match cap {
            KioskCap::Owned(cap_ref) => {
                let arg = builder.obj(ObjectArg::ImmOrOwnedObject(cap_ref.clone()))?;
                (arg, None)
            }
            KioskCap::Personal(personal_ref) => {
                let package = SuiAddress::parse(personal_kiosk_package)?;
                let personal_arg =
                    builder.obj(ObjectArg::ImmOrOwnedObject(personal_ref.clone()))?;
                let result = builder.move_call(
                    package,
                    PERSONAL_KIOSK_MODULE,
                    "borrow_val",
                    vec![],
                    vec![personal_arg],
                );
                let cap_arg = builder.nested(result, 0);
                let borrow_arg = builder.nested(result, 1);
                (cap_arg, Some((package, personal_arg, borrow_arg)))
            }
        };

        Ok(Self {
            builder,
            framework,
            kiosk,
            cap: cap_arg,
            borrow,
            finalized: false,
        })
    }

    pub fn place(&mut self, item_type: TypeTag, item: ObjectArg) -> Result<()> {
        let item = self.builder.obj(item)?;
        self.builder.move_call(
            self.framework,
            KIOSK_MODULE,
            "place",
            vec![item_type],
            vec![self.kiosk, self.cap, item],
        );
        Ok(())
    }

    pub fn lock(&mut self, item_type: TypeTag, policy: ObjectArg, item: ObjectArg) -> Result<()> {
        let policy = self.builder.obj(policy)?;
        let item = self.builder.obj(item)?;
        self.builder.move_call(
            self.framework,
            KIOSK_MODULE,
            "lock",
            vec![item_type],
            vec![self.kiosk, self.cap, policy, item],
        );
        Ok(())
    }

    pub fn list(&mut self, item_type: TypeTag, item_id: SuiAddress, price: u64) -> Result<()> {
        let item_id = self.builder.pure(&item_id)?;
        let price = self.builder.pure(&price)?;
        self.builder.move_call(
            self.framework,
            KIOSK_MODULE,
            "list",
            vec![item_type],
            vec![self.kiosk, self.cap, item_id, price],
        );
        Ok(())
    }

    pub fn delist(&mut self, item_type: TypeTag, item_id: SuiAddress) -> Result<()> {
        let item_id = self.builder.pure(&item_id)?;
        self.builder.move_call(
            self.framework,
            KIOSK_MODULE,
            "delist",
            vec![item_type],
            vec![self.kiosk, self.cap, item_id],
        );
        Ok(())
    }

    /// Return a borrowed cap. Must be the last kiosk interaction, exactly as
    /// the SDK requires of its `finalize()`.
    pub fn finalize(mut self) {
        if let Some((package, personal_arg, borrow_arg)) = self.borrow.take() {
            self.builder.move_call(
                package,
                PERSONAL_KIOSK_MODULE,
                "return_val",
                vec![],
                vec![personal_arg, self.cap, borrow_arg],
            );
        }
        self.finalized = true;
    }
}

impl Drop for KioskTransaction<'_> {
    fn drop(&mut self) {
        // A dropped borrow would produce an unexecutable transaction; make
        // the bug loud in tests and debug runs.
        debug_assert!(
            self.finalized || self.borrow.is_none(),
            "KioskTransaction dropped without finalize() while holding a borrowed cap"
        );
    }
}

/// Commands for `new-kiosk`: create a kiosk, wrap its cap into a personal
/// cap, share the kiosk and send the wrapper to the sender.
pub fn create_personal_kiosk(
    builder: &mut ProgrammableTransactionBuilder,
    personal_kiosk_package: &str,
) -> Result<()> {
    let framework = SuiAddress::parse(SUI_FRAMEWORK)?;
    let package = SuiAddress::parse(personal_kiosk_package)?;

    let created = builder.move_call(framework, KIOSK_MODULE, "new", vec![], vec![]);
    let kiosk = builder.nested(created, 0);
    let cap = builder.nested(created, 1);

    let personal_cap = builder.move_call(
        package,
        PERSONAL_KIOSK_MODULE,
        "new",
        vec![],
        vec![kiosk, cap],
    );

    builder.move_call(
        framework,
        "transfer",
        "public_share_object",
        vec![KIOSK_TYPE.parse()?],
        vec![kiosk],
    );
    builder.move_call(
        package,
        PERSONAL_KIOSK_MODULE,
        "transfer_to_sender",
        vec![],
        vec![personal_cap],
    );
    Ok(())
}

/// Commands for `convert-kiosk`: consume the bare owner cap of an existing
/// shared kiosk and wrap it into a personal cap sent back to the sender.
pub fn convert_kiosk_to_personal(
    builder: &mut ProgrammableTransactionBuilder,
    kiosk: ObjectArg,
    cap: ObjectRef,
    personal_kiosk_package: &str,
) -> Result<()> {
    let package = SuiAddress::parse(personal_kiosk_package)?;
    let kiosk = builder.obj(kiosk)?;
    let cap = builder.obj(ObjectArg::ImmOrOwnedObject(cap))?;

    let personal_cap = builder.move_call(
        package,
        PERSONAL_KIOSK_MODULE,
        "new",
        vec![],
        vec![kiosk, cap],
    );
    builder.move_call(
        package,
        PERSONAL_KIOSK_MODULE,
        "transfer_to_sender",
        vec![],
        vec![personal_cap],
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::types::{
        Command, ObjectDigest, TransactionData, TransactionKind,
    };

    fn object_ref(byte: u8) -> ObjectRef {
        ObjectRef {
            id: SuiAddress([byte; 32]),
            version: 1,
            digest: ObjectDigest(vec![byte; 32]),
        }
    }

    fn shared_kiosk() -> ObjectArg {
        ObjectArg::SharedObject {
            id: SuiAddress([0xAA; 32]),
            initial_shared_version: 10,
            mutable: true,
        }
    }

    fn item_type() -> TypeTag {
        "0x2::kiosk::Item".parse().unwrap()
    }

    fn commands_of(builder: ProgrammableTransactionBuilder) -> Vec<Command> {
        let TransactionData::V1(v1) = builder.finish(SuiAddress::ZERO, vec![], 1, 1);
        let TransactionKind::ProgrammableTransaction(pt) = v1.kind;
        pt.commands
    }

    fn call_name(command: &Command) -> (String, String) {
        match command {
            Command::MoveCall(call) => (call.module.clone(), call.function.clone()),
            other => panic!("expected move call, got {:?}", other),
        }
    }

    #[test]
    fn test_owned_cap_emits_single_call() {
        let mut builder = ProgrammableTransactionBuilder::new();
        let cap = KioskCap::Owned(object_ref(1));
        let mut tx = KioskTransaction::new(&mut builder, shared_kiosk(), &cap, "").unwrap();
        tx.list(item_type(), SuiAddress([3; 32]), 100_000).unwrap();
        tx.finalize();

        let commands = commands_of(builder);
        assert_eq!(commands.len(), 1);
        assert_eq!(call_name(&commands[0]), ("kiosk".into(), "list".into()));
    }

    #[test]
    fn test_personal_cap_borrows_and_returns() {
        let mut builder = ProgrammableTransactionBuilder::new();
        let cap = KioskCap::Personal(object_ref(2));
        let mut tx =
            KioskTransaction::new(&mut builder, shared_kiosk(), &cap, "0xbeef").unwrap();
        tx.delist(item_type(), SuiAddress([3; 32])).unwrap();
        tx.finalize();

        let commands = commands_of(builder);
        assert_eq!(commands.len(), 3);
        assert_eq!(
            call_name(&commands[0]),
            ("personal_kiosk".into(), "borrow_val".into())
        );
        assert_eq!(call_name(&commands[1]), ("kiosk".into(), "delist".into()));
        assert_eq!(
            call_name(&commands[2]),
            ("personal_kiosk".into(), "return_val".into())
        );

        // The kiosk op consumes the borrowed cap, not an input
        match &commands[1] {
            Command::MoveCall(call) => {
                assert_eq!(call.arguments[1], Argument::NestedResult(0, 0));
            }
            _ => unreachable!(),
        }
        // return_val gets the cap and the borrow hot potato back
        match &commands[2] {
            Command::MoveCall(call) => {
                assert_eq!(call.arguments[1], Argument::NestedResult(0, 0));
                assert_eq!(call.arguments[2], Argument::NestedResult(0, 1));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_lock_passes_policy_before_item() {
        let mut builder = ProgrammableTransactionBuilder::new();
        let cap = KioskCap::Owned(object_ref(1));
        let mut tx = KioskTransaction::new(&mut builder, shared_kiosk(), &cap, "").unwrap();
        tx.lock(
            item_type(),
            ObjectArg::SharedObject {
                id: SuiAddress([0xBB; 32]),
                initial_shared_version: 5,
                mutable: false,
            },
            ObjectArg::ImmOrOwnedObject(object_ref(4)),
        )
        .unwrap();
        tx.finalize();

        let commands = commands_of(builder);
        match &commands[0] {
            Command::MoveCall(call) => {
                assert_eq!(call.function, "lock");
                assert_eq!(call.arguments.len(), 4);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_create_personal_kiosk_shares_then_transfers() {
        let mut builder = ProgrammableTransactionBuilder::new();
        create_personal_kiosk(&mut builder, "0xbeef").unwrap();

        let commands = commands_of(builder);
        let names: Vec<_> = commands.iter().map(call_name).collect();
        assert_eq!(
            names,
            vec![
                ("kiosk".to_string(), "new".to_string()),
                ("personal_kiosk".to_string(), "new".to_string()),
                ("transfer".to_string(), "public_share_object".to_string()),
                ("personal_kiosk".to_string(), "transfer_to_sender".to_string()),
            ]
        );
    }

    #[test]
    fn test_convert_consumes_owned_cap() {
        let mut builder = ProgrammableTransactionBuilder::new();
        convert_kiosk_to_personal(&mut builder, shared_kiosk(), object_ref(7), "0xbeef").unwrap();

        let commands = commands_of(builder);
        assert_eq!(commands.len(), 2);
        assert_eq!(
            call_name(&commands[0]),
            ("personal_kiosk".into(), "new".into())
        );
    }
}
