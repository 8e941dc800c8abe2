//! Transfer-policy rule edits. Rules live in the network's kiosk rules
//! package; removal goes through the framework's generic
//! `transfer_policy::remove_rule<T, Rule, Config>`.

use crate::error::{OpsError, Result};
use crate::rpc::client::object_ref_from_data;
use crate::rpc::SuiRpcClient;
use crate::tx::{
    Argument, ObjectArg, ObjectRef, ProgrammableTransactionBuilder, StructTag, SuiAddress, TypeTag,
};

const TRANSFER_POLICY_MODULE: &str = "transfer_policy";
const ROYALTY_RULE_MODULE: &str = "royalty_rule";
const LOCK_RULE_MODULE: &str = "kiosk_lock_rule";
const FLOOR_PRICE_RULE_MODULE: &str = "floor_price_rule";
const PERSONAL_KIOSK_RULE_MODULE: &str = "personal_kiosk_rule";

pub const MAX_BASIS_POINTS: u16 = 10_000;

/// The SDK helper the original script used: whole percentage to basis points.
pub fn percentage_to_basis_points(percentage: f64) -> Result<u16> {
    if !(0.0..=100.0).contains(&percentage) {
        return Err(OpsError::Encoding(format!(
            "royalty percentage out of range: {}",
            percentage
        )));
    }
    Ok((percentage * 100.0).ceil() as u16)
}

/// Find the signer's `TransferPolicyCap<T>` for one policy object.
pub async fn find_policy_cap(
    client: &SuiRpcClient,
    address: &SuiAddress,
    item_type: &str,
    policy_id: &str,
) -> Result<ObjectRef> {
    let cap_type = format!("0x2::transfer_policy::TransferPolicyCap<{}>", item_type);
    let target = SuiAddress::parse(policy_id)?;

    for data in client.get_owned_objects_of_type(address, &cap_type).await? {
        let policy_field = data
            .content
            .as_ref()
            .and_then(|content| content.fields.get("policy_id"))
            .and_then(|value| value.as_str());
        if let Some(policy) = policy_field {
            if SuiAddress::parse(policy)? == target {
                return Ok(object_ref_from_data(&data)?);
            }
        }
    }
    Err(OpsError::PolicyCapNotFound(policy_id.to_string()))
}

/// Rule edits against one policy; calls chain like the SDK's
/// `TransferPolicyTransaction`.
pub struct PolicyTransaction<'a> {
    builder: &'a mut ProgrammableTransactionBuilder,
    framework: SuiAddress,
    rules_package: SuiAddress,
    item_type: TypeTag,
    policy: Argument,
    cap: Argument,
}

impl<'a> PolicyTransaction<'a> {
    pub fn new(
        builder: &'a mut ProgrammableTransactionBuilder,
        policy: ObjectArg,
        cap: ObjectRef,
        item_type: TypeTag,
        rules_package: &str,
    ) -> Result<Self> {
        let policy = builder.obj(policy)?;
        let cap = builder.obj(ObjectArg::ImmOrOwnedObject(cap))?;
        Ok(Self {
            builder,
            framework: SuiAddress::parse("0x2")?,
            rules_package: SuiAddress::parse(rules_package)?,
            item_type,
            policy,
            cap,
        })
    }

    pub fn add_royalty_rule(&mut self, basis_points: u16, min_amount: u64) -> Result<&mut Self> {
        if basis_points > MAX_BASIS_POINTS {
            return Err(OpsError::Encoding(format!(
                "royalty above 100%: {} bp",
                basis_points
            )));
        }
        let bp = self.builder.pure(&basis_points)?;
        let min = self.builder.pure(&min_amount)?;
        self.add_rule(ROYALTY_RULE_MODULE, vec![bp, min]);
        Ok(self)
    }

    pub fn add_lock_rule(&mut self) -> Result<&mut Self> {
        self.add_rule(LOCK_RULE_MODULE, vec![]);
        Ok(self)
    }

    pub fn add_floor_price_rule(&mut self, floor_price: u64) -> Result<&mut Self> {
        let floor = self.builder.pure(&floor_price)?;
        self.add_rule(FLOOR_PRICE_RULE_MODULE, vec![floor]);
        Ok(self)
    }

    pub fn add_personal_kiosk_rule(&mut self) -> Result<&mut Self> {
        self.add_rule(PERSONAL_KIOSK_RULE_MODULE, vec![]);
        Ok(self)
    }

    pub fn remove_royalty_rule(&mut self) -> &mut Self {
        self.remove_rule(ROYALTY_RULE_MODULE, self.rule_config(ROYALTY_RULE_MODULE))
    }

    pub fn remove_lock_rule(&mut self) -> &mut Self {
        self.remove_rule(LOCK_RULE_MODULE, self.rule_config(LOCK_RULE_MODULE))
    }

    pub fn remove_floor_price_rule(&mut self) -> &mut Self {
        self.remove_rule(
            FLOOR_PRICE_RULE_MODULE,
            self.rule_config(FLOOR_PRICE_RULE_MODULE),
        )
    }

    pub fn remove_personal_kiosk_rule(&mut self) -> &mut Self {
        // The personal kiosk rule keeps no state; its config type is bool
        self.remove_rule(PERSONAL_KIOSK_RULE_MODULE, TypeTag::Bool)
    }

    fn add_rule(&mut self, rule_module: &str, extra_args: Vec<Argument>) {
        let mut arguments = vec![self.policy, self.cap];
        arguments.extend(extra_args);
        self.builder.move_call(
            self.rules_package,
            rule_module,
            "add",
            vec![self.item_type.clone()],
            arguments,
        );
    }

    fn remove_rule(&mut self, rule_module: &str, config: TypeTag) -> &mut Self {
        let rule = TypeTag::Struct(Box::new(StructTag::new(
            self.rules_package,
            rule_module,
            "Rule",
            vec![],
        )));
        self.builder.move_call(
            self.framework,
            TRANSFER_POLICY_MODULE,
            "remove_rule",
            vec![self.item_type.clone(), rule, config],
            vec![self.policy, self.cap],
        );
        self
    }

    fn rule_config(&self, rule_module: &str) -> TypeTag {
        TypeTag::Struct(Box::new(StructTag::new(
            self.rules_package,
            rule_module,
            "Config",
            vec![],
        )))
    }
}
