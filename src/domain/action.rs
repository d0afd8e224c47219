//! 动作目录
//!
//! 每种动作只携带链上原生结构所需字段，序列化顺序与系统合约 ABI 一致

use std::fmt;

use serde::Serialize;

use crate::abi::{pack, AbiEncode, AbiWriter, Name};
use crate::crypto::EosPublicKey;
use crate::domain::asset::Asset;

/// 授权权限名 `active`
pub const ACTIVE_PERMISSION: Name = Name::from_raw(0x3232_eda8_0000_0000);

/// 动作种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Transfer,
    NewAccount,
    BuyRamBytes,
    DelegateBandwidth,
    UndelegateBandwidth,
    VoteProducer,
    BidName,
    SellRam,
}

impl ActionKind {
    /// 链上动作名
    pub fn action_name(&self) -> &'static str {
        match self {
            ActionKind::Transfer => "transfer",
            ActionKind::NewAccount => "newaccount",
            ActionKind::BuyRamBytes => "buyrambytes",
            ActionKind::DelegateBandwidth => "delegatebw",
            ActionKind::UndelegateBandwidth => "undelegatebw",
            ActionKind::VoteProducer => "voteproducer",
            ActionKind::BidName => "bidname",
            ActionKind::SellRam => "sellram",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

impl PermissionLevel {
    pub fn active(actor: Name) -> Self {
        Self {
            actor,
            permission: ACTIVE_PERMISSION,
        }
    }
}

impl AbiEncode for PermissionLevel {
    fn encode(&self, writer: &mut AbiWriter) {
        writer.write_name(&self.actor);
        writer.write_name(&self.permission);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 权限结构（newaccount）
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyWeight {
    /// 文本形式，仅用于展示
    pub key: String,
    #[serde(skip)]
    pub public_key: EosPublicKey,
    pub weight: u16,
}

impl AbiEncode for KeyWeight {
    fn encode(&self, writer: &mut AbiWriter) {
        self.public_key.encode(writer);
        writer.write_u16(self.weight);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionLevelWeight {
    pub permission: PermissionLevel,
    pub weight: u16,
}

impl AbiEncode for PermissionLevelWeight {
    fn encode(&self, writer: &mut AbiWriter) {
        self.permission.encode(writer);
        writer.write_u16(self.weight);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitWeight {
    pub wait_sec: u32,
    pub weight: u16,
}

impl AbiEncode for WaitWeight {
    fn encode(&self, writer: &mut AbiWriter) {
        writer.write_u32(self.wait_sec);
        writer.write_u16(self.weight);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Authority {
    pub threshold: u32,
    pub keys: Vec<KeyWeight>,
    pub accounts: Vec<PermissionLevelWeight>,
    pub waits: Vec<WaitWeight>,
}

impl Authority {
    /// 单密钥、阈值 1
    pub fn single_key(public_key: EosPublicKey, key_prefix: &str) -> Self {
        Self {
            threshold: 1,
            keys: vec![KeyWeight {
                key: public_key.to_legacy_string(key_prefix),
                public_key,
                weight: 1,
            }],
            accounts: Vec::new(),
            waits: Vec::new(),
        }
    }
}

impl AbiEncode for Authority {
    fn encode(&self, writer: &mut AbiWriter) {
        writer.write_u32(self.threshold);
        writer.write_vec(&self.keys);
        writer.write_vec(&self.accounts);
        writer.write_vec(&self.waits);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 动作负载
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub from: Name,
    pub to: Name,
    pub quantity: Asset,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAccount {
    pub creator: Name,
    pub name: Name,
    pub owner: Authority,
    pub active: Authority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyRamBytes {
    pub payer: Name,
    pub receiver: Name,
    pub bytes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelegateBandwidth {
    pub from: Name,
    pub receiver: Name,
    pub stake_net_quantity: Asset,
    pub stake_cpu_quantity: Asset,
    pub transfer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UndelegateBandwidth {
    pub from: Name,
    pub receiver: Name,
    pub unstake_net_quantity: Asset,
    pub unstake_cpu_quantity: Asset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteProducer {
    pub voter: Name,
    pub proxy: Name,
    pub producers: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidName {
    pub bidder: Name,
    pub newname: Name,
    pub bid: Asset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellRam {
    pub account: Name,
    pub bytes: i64,
}

/// 动作负载（带标签的变体）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionData {
    Transfer(Transfer),
    NewAccount(NewAccount),
    BuyRamBytes(BuyRamBytes),
    DelegateBandwidth(DelegateBandwidth),
    UndelegateBandwidth(UndelegateBandwidth),
    VoteProducer(VoteProducer),
    BidName(BidName),
    SellRam(SellRam),
}

impl ActionData {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionData::Transfer(_) => ActionKind::Transfer,
            ActionData::NewAccount(_) => ActionKind::NewAccount,
            ActionData::BuyRamBytes(_) => ActionKind::BuyRamBytes,
            ActionData::DelegateBandwidth(_) => ActionKind::DelegateBandwidth,
            ActionData::UndelegateBandwidth(_) => ActionKind::UndelegateBandwidth,
            ActionData::VoteProducer(_) => ActionKind::VoteProducer,
            ActionData::BidName(_) => ActionKind::BidName,
            ActionData::SellRam(_) => ActionKind::SellRam,
        }
    }

    /// 需要授权的账户
    pub fn actor(&self) -> Name {
        match self {
            ActionData::Transfer(a) => a.from,
            ActionData::NewAccount(a) => a.creator,
            ActionData::BuyRamBytes(a) => a.payer,
            ActionData::DelegateBandwidth(a) => a.from,
            ActionData::UndelegateBandwidth(a) => a.from,
            ActionData::VoteProducer(a) => a.voter,
            ActionData::BidName(a) => a.bidder,
            ActionData::SellRam(a) => a.account,
        }
    }
}

impl AbiEncode for ActionData {
    fn encode(&self, writer: &mut AbiWriter) {
        match self {
            ActionData::Transfer(a) => {
                writer.write_name(&a.from);
                writer.write_name(&a.to);
                a.quantity.encode(writer);
                writer.write_string(&a.memo);
            }
            ActionData::NewAccount(a) => {
                writer.write_name(&a.creator);
                writer.write_name(&a.name);
                a.owner.encode(writer);
                a.active.encode(writer);
            }
            ActionData::BuyRamBytes(a) => {
                writer.write_name(&a.payer);
                writer.write_name(&a.receiver);
                writer.write_u32(a.bytes);
            }
            ActionData::DelegateBandwidth(a) => {
                writer.write_name(&a.from);
                writer.write_name(&a.receiver);
                a.stake_net_quantity.encode(writer);
                a.stake_cpu_quantity.encode(writer);
                writer.write_bool(a.transfer);
            }
            ActionData::UndelegateBandwidth(a) => {
                writer.write_name(&a.from);
                writer.write_name(&a.receiver);
                a.unstake_net_quantity.encode(writer);
                a.unstake_cpu_quantity.encode(writer);
            }
            ActionData::VoteProducer(a) => {
                writer.write_name(&a.voter);
                writer.write_name(&a.proxy);
                writer.write_vec(&a.producers);
            }
            ActionData::BidName(a) => {
                writer.write_name(&a.bidder);
                writer.write_name(&a.newname);
                a.bid.encode(writer);
            }
            ActionData::SellRam(a) => {
                writer.write_name(&a.account);
                writer.write_i64(a.bytes);
            }
        }
    }
}

/// 完整动作：合约、动作名、授权、负载
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub account: Name,
    pub name: Name,
    pub authorization: Vec<PermissionLevel>,
    pub data: ActionData,
    /// 负载的十六进制二进制形式
    pub hex_data: String,
}

impl Action {
    /// 由动作作者的 `active` 权限授权
    pub fn new(contract: Name, data: ActionData) -> Self {
        let name = Name::parse(data.kind().action_name()).unwrap_or_default();
        let hex_data = hex::encode(pack(&data));
        Self {
            account: contract,
            name,
            authorization: vec![PermissionLevel::active(data.actor())],
            data,
            hex_data,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.data.kind()
    }
}

impl AbiEncode for Action {
    fn encode(&self, writer: &mut AbiWriter) {
        writer.write_name(&self.account);
        writer.write_name(&self.name);
        writer.write_vec(&self.authorization);
        writer.write_bytes(&pack(&self.data));
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::asset::Symbol;

    fn name(s: &str) -> Name {
        Name::parse(s).unwrap()
    }

    #[test]
    fn test_all_action_names_are_valid() {
        for kind in [
            ActionKind::Transfer,
            ActionKind::NewAccount,
            ActionKind::BuyRamBytes,
            ActionKind::DelegateBandwidth,
            ActionKind::UndelegateBandwidth,
            ActionKind::VoteProducer,
            ActionKind::BidName,
            ActionKind::SellRam,
        ] {
            assert_eq!(name(kind.action_name()).to_string(), kind.action_name());
        }
    }

    #[test]
    fn test_transfer_encoding() {
        let quantity = Asset::from_decimal(Decimal::from(1), &Symbol::native()).unwrap();
        let action = Action::new(
            name("eosio.token"),
            ActionData::Transfer(Transfer {
                from: name("alice"),
                to: name("bob"),
                quantity,
                memo: "hi".to_string(),
            }),
        );

        assert_eq!(action.name.to_string(), "transfer");
        assert_eq!(action.authorization, vec![PermissionLevel::active(name("alice"))]);
        // from(8) + to(8) + asset(16) + memo(1 + 2)
        assert_eq!(action.hex_data.len(), 35 * 2);
        assert!(action.hex_data.starts_with("0000000000855c34"));
    }

    #[test]
    fn test_action_json_shape() {
        let action = Action::new(
            name("eosio"),
            ActionData::BuyRamBytes(BuyRamBytes {
                payer: name("alice"),
                receiver: name("bob"),
                bytes: 4000,
            }),
        );
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["account"], "eosio");
        assert_eq!(json["name"], "buyrambytes");
        assert_eq!(json["authorization"][0]["permission"], "active");
        assert_eq!(json["data"]["bytes"], 4000);
    }
}
