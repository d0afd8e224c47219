//! 离线交易构建器
//!
//! 每个操作：校验交易头 → 取签名密钥 → 组装动作 → 打包签名
//! 全程无网络访问，返回的交易 `broadcast = false`，由调用方自行广播

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::abi::Name;
use crate::config::{BuilderConfig, Config};
use crate::crypto::{EosPrivateKey, EosPublicKey};
use crate::domain::action::{
    Action, ActionData, Authority, BidName, BuyRamBytes, DelegateBandwidth, NewAccount, SellRam,
    Transfer, UndelegateBandwidth, VoteProducer,
};
use crate::domain::asset::{Asset, Symbol};
use crate::domain::key_node::KeyNode;
use crate::domain::transaction::{SignedTransaction, Transaction, TransactionHeaders};
use crate::error::{Result, SignerError};
use crate::utils::non_blank;

/// memo 最大字节数
pub const MAX_MEMO_BYTES: usize = 256;
/// 单次投票最多生产者数
pub const MAX_VOTE_PRODUCERS: usize = 30;
/// 账户名最大长度；13 位名称只能用作动作名等非账户名称
pub const MAX_ACCOUNT_NAME_LEN: usize = 12;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 请求
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 转账请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
    /// `EOS` 或 `4,EOS`；缺省为链原生符号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// 注册账户请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterAccountRequest {
    pub creator: String,
    pub name: String,
    /// 缺省为签名节点的公钥
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_key: Option<String>,
    /// 缺省为签名节点的公钥
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_bytes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_cpu: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_net: Option<Decimal>,
}

/// 抵押请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateRequest {
    pub from: String,
    pub receiver: String,
    pub stake_net: Decimal,
    pub stake_cpu: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub transfer: bool,
}

/// 赎回请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndelegateRequest {
    pub from: String,
    pub receiver: String,
    pub unstake_net: Decimal,
    pub unstake_cpu: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// 投票请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub voter: String,
    pub producers: Vec<String>,
}

/// 竞拍名称请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidNameRequest {
    pub bidder: String,
    pub newname: String,
    pub bid: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// 购买 RAM 请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyRamRequest {
    pub payer: String,
    /// 缺省为付款人
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub bytes: u32,
}

/// 出售 RAM 请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellRamRequest {
    pub account: String,
    pub bytes: i64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 构建器
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 离线交易构建器
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    config: BuilderConfig,
}

impl TransactionBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.builder_config())
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// 转账（代币合约 transfer）
    pub fn transfer(
        &self,
        node: &KeyNode,
        request: &TransferRequest,
        headers: &TransactionHeaders,
    ) -> Result<SignedTransaction> {
        self.finalize("transfer", node, headers, || {
            let symbol = self.symbol(request.symbol.as_deref())?;
            let quantity = positive_asset("amount", request.amount, &symbol)?;

            let memo = request.memo.clone().unwrap_or_default();
            if memo.len() > MAX_MEMO_BYTES {
                return Err(SignerError::invalid_memo(format!(
                    "Memo is {} bytes, maximum is {}",
                    memo.len(),
                    MAX_MEMO_BYTES
                )));
            }

            let data = ActionData::Transfer(Transfer {
                from: account("from", &request.from)?,
                to: account("to", &request.to)?,
                quantity,
                memo,
            });
            Ok(vec![Action::new(self.config.chain.token_contract, data)])
        })
    }

    /// 注册账户：newaccount + buyrambytes + delegatebw
    pub fn register_account(
        &self,
        node: &KeyNode,
        request: &RegisterAccountRequest,
        headers: &TransactionHeaders,
    ) -> Result<SignedTransaction> {
        self.finalize("register_account", node, headers, || {
            let creator = account("creator", &request.creator)?;
            let name = account("name", &request.name)?;

            let owner = self.public_key_or(node, "owner_key", request.owner_key.as_deref())?;
            let active = self.public_key_or(node, "active_key", request.active_key.as_deref())?;

            let defaults = &self.config.resources;
            let ram_bytes = request.ram_bytes.unwrap_or(defaults.ram_bytes);
            if ram_bytes == 0 {
                return Err(SignerError::invalid_amount("RAM bytes must be greater than 0")
                    .with_field("ram_bytes"));
            }

            let symbol = &self.config.chain.symbol;
            let stake_cpu = request.stake_cpu.unwrap_or(defaults.stake_cpu);
            let stake_cpu = asset("stake_cpu", stake_cpu, symbol)?;
            let stake_net = request.stake_net.unwrap_or(defaults.stake_net);
            let stake_net = asset("stake_net", stake_net, symbol)?;
            require_stake(&stake_net, &stake_cpu)?;

            let prefix = &self.config.chain.key_prefix;
            let system = self.config.chain.system_contract;
            Ok(vec![
                Action::new(
                    system,
                    ActionData::NewAccount(NewAccount {
                        creator,
                        name,
                        owner: Authority::single_key(owner, prefix),
                        active: Authority::single_key(active, prefix),
                    }),
                ),
                Action::new(
                    system,
                    ActionData::BuyRamBytes(BuyRamBytes {
                        payer: creator,
                        receiver: name,
                        bytes: ram_bytes,
                    }),
                ),
                Action::new(
                    system,
                    ActionData::DelegateBandwidth(DelegateBandwidth {
                        from: creator,
                        receiver: name,
                        stake_net_quantity: stake_net,
                        stake_cpu_quantity: stake_cpu,
                        // 新账户的抵押不可转移
                        transfer: false,
                    }),
                ),
            ])
        })
    }

    /// 抵押 CPU / NET
    pub fn delegate(
        &self,
        node: &KeyNode,
        request: &DelegateRequest,
        headers: &TransactionHeaders,
    ) -> Result<SignedTransaction> {
        self.finalize("delegate", node, headers, || {
            let symbol = self.symbol(request.symbol.as_deref())?;
            let stake_net = asset("stake_net", request.stake_net, &symbol)?;
            let stake_cpu = asset("stake_cpu", request.stake_cpu, &symbol)?;
            require_stake(&stake_net, &stake_cpu)?;

            let data = ActionData::DelegateBandwidth(DelegateBandwidth {
                from: account("from", &request.from)?,
                receiver: account("receiver", &request.receiver)?,
                stake_net_quantity: stake_net,
                stake_cpu_quantity: stake_cpu,
                transfer: request.transfer,
            });
            Ok(vec![Action::new(self.config.chain.system_contract, data)])
        })
    }

    /// 赎回 CPU / NET
    pub fn undelegate(
        &self,
        node: &KeyNode,
        request: &UndelegateRequest,
        headers: &TransactionHeaders,
    ) -> Result<SignedTransaction> {
        self.finalize("undelegate", node, headers, || {
            let symbol = self.symbol(request.symbol.as_deref())?;
            let unstake_net = asset("unstake_net", request.unstake_net, &symbol)?;
            let unstake_cpu = asset("unstake_cpu", request.unstake_cpu, &symbol)?;
            require_stake(&unstake_net, &unstake_cpu)?;

            let data = ActionData::UndelegateBandwidth(UndelegateBandwidth {
                from: account("from", &request.from)?,
                receiver: account("receiver", &request.receiver)?,
                unstake_net_quantity: unstake_net,
                unstake_cpu_quantity: unstake_cpu,
            });
            Ok(vec![Action::new(self.config.chain.system_contract, data)])
        })
    }

    /// 为生产者投票（不使用代理）
    pub fn vote(
        &self,
        node: &KeyNode,
        request: &VoteRequest,
        headers: &TransactionHeaders,
    ) -> Result<SignedTransaction> {
        self.finalize("vote", node, headers, || {
            let data = ActionData::VoteProducer(VoteProducer {
                voter: account("voter", &request.voter)?,
                proxy: Name::EMPTY,
                producers: producer_list(&request.producers)?,
            });
            Ok(vec![Action::new(self.config.chain.system_contract, data)])
        })
    }

    /// 竞拍高级名称
    pub fn bidname(
        &self,
        node: &KeyNode,
        request: &BidNameRequest,
        headers: &TransactionHeaders,
    ) -> Result<SignedTransaction> {
        self.finalize("bidname", node, headers, || {
            let symbol = self.symbol(request.symbol.as_deref())?;
            let data = ActionData::BidName(BidName {
                bidder: account("bidder", &request.bidder)?,
                newname: account("newname", &request.newname)?,
                bid: positive_asset("bid", request.bid, &symbol)?,
            });
            Ok(vec![Action::new(self.config.chain.system_contract, data)])
        })
    }

    /// 按字节购买 RAM
    pub fn buyram(
        &self,
        node: &KeyNode,
        request: &BuyRamRequest,
        headers: &TransactionHeaders,
    ) -> Result<SignedTransaction> {
        self.finalize("buyram", node, headers, || {
            if request.bytes == 0 {
                return Err(SignerError::invalid_amount("RAM bytes must be greater than 0")
                    .with_field("bytes"));
            }

            let payer = account("payer", &request.payer)?;
            let receiver = match non_blank(request.receiver.as_deref()) {
                Some(receiver) => account("receiver", receiver)?,
                None => payer,
            };
            let data = ActionData::BuyRamBytes(BuyRamBytes {
                payer,
                receiver,
                bytes: request.bytes,
            });
            Ok(vec![Action::new(self.config.chain.system_contract, data)])
        })
    }

    /// 出售 RAM
    pub fn sellram(
        &self,
        node: &KeyNode,
        request: &SellRamRequest,
        headers: &TransactionHeaders,
    ) -> Result<SignedTransaction> {
        self.finalize("sellram", node, headers, || {
            if request.bytes <= 0 {
                return Err(SignerError::invalid_amount("RAM bytes must be greater than 0")
                    .with_field("bytes"));
            }

            let data = ActionData::SellRam(SellRam {
                account: account("account", &request.account)?,
                bytes: request.bytes,
            });
            Ok(vec![Action::new(self.config.chain.system_contract, data)])
        })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 内部
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// 公共流程：交易头 → 签名密钥 → 动作 → 签名
    fn finalize<F>(
        &self,
        operation: &str,
        node: &KeyNode,
        headers: &TransactionHeaders,
        build_actions: F,
    ) -> Result<SignedTransaction>
    where
        F: FnOnce() -> Result<Vec<Action>>,
    {
        let headers = headers.resolve()?;
        let key = signing_key(node)?;
        let actions = build_actions()?;

        let chain_id = node.chain_id();
        if chain_id != self.config.chain.chain_id {
            tracing::warn!(
                operation,
                node_chain_id = %chain_id,
                config_chain_id = %self.config.chain.chain_id,
                "节点链 ID 与配置不同，按节点链 ID 签名"
            );
        }

        let action_count = actions.len();
        let signed = Transaction::new(headers, actions).sign(chain_id, &key)?;

        tracing::info!(
            operation,
            action_count,
            transaction_id = %signed.transaction_id,
            "交易已构建并签名"
        );
        Ok(signed)
    }

    fn symbol(&self, input: Option<&str>) -> Result<Symbol> {
        Symbol::resolve(input, &self.config.chain.symbol).map_err(|e| e.with_field("symbol"))
    }

    fn public_key_or(
        &self,
        node: &KeyNode,
        field: &str,
        key: Option<&str>,
    ) -> Result<EosPublicKey> {
        match non_blank(key) {
            Some(key) => EosPublicKey::parse_with_prefix(key, &self.config.chain.key_prefix)
                .map_err(|e| e.with_field(field)),
            None => Ok(node.eos_public_key()),
        }
    }
}

/// 节点私钥；公钥节点无法签名
fn signing_key(node: &KeyNode) -> Result<EosPrivateKey> {
    let wif = node.private_key().map(Zeroizing::new).map_err(|e| {
        SignerError::signing_key_unavailable(format!("Node cannot sign: {}", e.message))
    })?;
    EosPrivateKey::from_wif(&wif)
}

fn account(field: &str, value: &str) -> Result<Name> {
    let value = non_blank(Some(value)).ok_or_else(|| SignerError::missing_field(field))?;
    if value.len() > MAX_ACCOUNT_NAME_LEN {
        return Err(SignerError::invalid_account_name(format!(
            "Account name '{}' is longer than {} characters",
            value, MAX_ACCOUNT_NAME_LEN
        ))
        .with_field(field));
    }
    Name::parse(value).map_err(|e| e.with_field(field))
}

fn asset(field: &str, value: Decimal, symbol: &Symbol) -> Result<Asset> {
    Asset::from_decimal(value, symbol).map_err(|e| e.with_field(field))
}

fn positive_asset(field: &str, value: Decimal, symbol: &Symbol) -> Result<Asset> {
    let quantity = asset(field, value, symbol)?;
    if quantity.is_zero() {
        return Err(
            SignerError::invalid_amount(format!("{} must be greater than 0", field))
                .with_field(field),
        );
    }
    Ok(quantity)
}

fn require_stake(net: &Asset, cpu: &Asset) -> Result<()> {
    if net.is_zero() && cpu.is_zero() {
        return Err(SignerError::invalid_amount(
            "At least one of CPU or NET must be greater than 0",
        ));
    }
    Ok(())
}

/// 生产者列表：非空、无重复、不超过上限，按名称数值升序
fn producer_list(producers: &[String]) -> Result<Vec<Name>> {
    if producers.is_empty() {
        return Err(SignerError::missing_field("producers"));
    }
    if producers.len() > MAX_VOTE_PRODUCERS {
        return Err(SignerError::invalid_producer_list(format!(
            "At most {} producers may be voted for, got {}",
            MAX_VOTE_PRODUCERS,
            producers.len()
        )));
    }

    let mut names = producers
        .iter()
        .map(|p| account("producers", p))
        .collect::<Result<Vec<_>>>()?;
    names.sort();

    if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(SignerError::invalid_producer_list(format!(
            "Producer '{}' is listed more than once",
            pair[0]
        )));
    }
    Ok(names)
}
