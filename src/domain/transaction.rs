//! 交易结构、摘要与签名产物
//!
//! - [`TransactionHeaders`]：调用方给出的过期时间与引用区块
//! - [`Transaction`]：未签名交易，资源限制与延迟均为 0
//! - [`SignedTransaction`]：已签名、可序列化的产物，`broadcast` 恒为 false

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::abi::{pack, AbiEncode, AbiWriter};
use crate::crypto::{sign_digest, EosPrivateKey, EosSignature};
use crate::domain::action::Action;
use crate::domain::chain_config::ChainId;
use crate::error::{Result, SignerError};
use crate::utils::time_utils::{format_chain_time, from_unix_seconds, parse_time, to_chain_seconds};

/// 过期时间提示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expiration {
    /// Unix 秒
    UnixSeconds(i64),
    At(DateTime<Utc>),
    /// RFC 3339 或不带时区的 ISO-8601 文本
    Text(String),
}

impl Expiration {
    /// 归一化为链上秒精度时间
    pub fn resolve(&self) -> Result<TimePointSec> {
        let at = match self {
            Expiration::UnixSeconds(secs) => from_unix_seconds(*secs),
            Expiration::At(dt) => Some(*dt),
            Expiration::Text(s) => parse_time(s),
        }
        .ok_or_else(|| {
            SignerError::invalid_expiration(format!("Cannot interpret expiration {:?}", self))
        })?;

        to_chain_seconds(&at).map(TimePointSec).ok_or_else(|| {
            SignerError::invalid_expiration(format!(
                "Expiration {} is outside the chain time range",
                at
            ))
        })
    }
}

impl From<DateTime<Utc>> for Expiration {
    fn from(dt: DateTime<Utc>) -> Self {
        Expiration::At(dt)
    }
}

impl From<i64> for Expiration {
    fn from(secs: i64) -> Self {
        Expiration::UnixSeconds(secs)
    }
}

impl From<&str> for Expiration {
    fn from(s: &str) -> Self {
        Expiration::Text(s.to_string())
    }
}

impl From<String> for Expiration {
    fn from(s: String) -> Self {
        Expiration::Text(s)
    }
}

/// 链上时间：自纪元起的 u32 秒
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimePointSec(u32);

impl TimePointSec {
    pub fn as_secs(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match from_unix_seconds(self.0 as i64) {
            Some(dt) => f.write_str(&format_chain_time(&dt)),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for TimePointSec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 交易头（调用方提供）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionHeaders {
    pub expiration: Expiration,
    #[serde(default)]
    pub ref_block_num: Option<u16>,
    #[serde(default)]
    pub ref_block_prefix: Option<u32>,
}

/// 校验后的交易头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedHeaders {
    pub expiration: TimePointSec,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
}

impl TransactionHeaders {
    pub fn new(expiration: impl Into<Expiration>, ref_block_num: u16, ref_block_prefix: u32) -> Self {
        Self {
            expiration: expiration.into(),
            ref_block_num: Some(ref_block_num),
            ref_block_prefix: Some(ref_block_prefix),
        }
    }

    /// 由已知区块计算引用字段
    ///
    /// - ref_block_num: 区块号低 16 位
    /// - ref_block_prefix: 区块 ID 第 8..12 字节按小端解释
    pub fn from_reference_block(
        expiration: impl Into<Expiration>,
        block_num: u32,
        block_id_hex: &str,
    ) -> Result<Self> {
        let block_id = hex::decode(block_id_hex.trim()).map_err(|e| {
            SignerError::serialization_failed(format!("Invalid block id hex: {}", e))
                .with_field("block_id")
        })?;
        if block_id.len() != 32 {
            return Err(
                SignerError::serialization_failed("Block id must be 32 bytes").with_field("block_id")
            );
        }
        let prefix = u32::from_le_bytes([block_id[8], block_id[9], block_id[10], block_id[11]]);

        Ok(Self::new(expiration, (block_num & 0xffff) as u16, prefix))
    }

    /// 检查必填字段并归一化过期时间
    pub fn resolve(&self) -> Result<ResolvedHeaders> {
        let ref_block_num = self
            .ref_block_num
            .ok_or_else(|| SignerError::missing_field("ref_block_num"))?;
        let ref_block_prefix = self
            .ref_block_prefix
            .ok_or_else(|| SignerError::missing_field("ref_block_prefix"))?;
        let expiration = self.expiration.resolve()?;

        Ok(ResolvedHeaders {
            expiration,
            ref_block_num,
            ref_block_prefix,
        })
    }
}

/// 交易扩展（本库构建的交易始终为空）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extension {
    pub kind: u16,
    pub data: Vec<u8>,
}

impl AbiEncode for Extension {
    fn encode(&self, writer: &mut AbiWriter) {
        writer.write_u16(self.kind);
        writer.write_bytes(&self.data);
    }
}

/// 未签名交易
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub expiration: TimePointSec,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub max_net_usage_words: u32,
    pub max_cpu_usage_ms: u8,
    pub delay_sec: u32,
    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
    pub transaction_extensions: Vec<Extension>,
}

impl Transaction {
    pub fn new(headers: ResolvedHeaders, actions: Vec<Action>) -> Self {
        Self {
            expiration: headers.expiration,
            ref_block_num: headers.ref_block_num,
            ref_block_prefix: headers.ref_block_prefix,
            max_net_usage_words: 0,
            max_cpu_usage_ms: 0,
            delay_sec: 0,
            context_free_actions: Vec::new(),
            actions,
            transaction_extensions: Vec::new(),
        }
    }

    /// 打包、签名并计算交易 ID
    pub fn sign(self, chain_id: ChainId, key: &EosPrivateKey) -> Result<SignedTransaction> {
        let packed = pack(&self);
        let digest = signing_digest(&chain_id, &packed);
        let signature = sign_digest(key, &digest)?;

        Ok(SignedTransaction {
            transaction_id: hex::encode(transaction_id(&packed)),
            broadcast: false,
            chain_id,
            signatures: vec![signature],
            compression: "none".to_string(),
            packed_context_free_data: String::new(),
            packed_trx: hex::encode(&packed),
            transaction: self,
            packed,
        })
    }
}

impl AbiEncode for Transaction {
    fn encode(&self, writer: &mut AbiWriter) {
        writer.write_u32(self.expiration.as_secs());
        writer.write_u16(self.ref_block_num);
        writer.write_u32(self.ref_block_prefix);
        writer.write_varuint32(self.max_net_usage_words);
        writer.write_u8(self.max_cpu_usage_ms);
        writer.write_varuint32(self.delay_sec);
        writer.write_vec(&self.context_free_actions);
        writer.write_vec(&self.actions);
        writer.write_vec(&self.transaction_extensions);
    }
}

/// 签名摘要：sha256(chain_id ‖ packed_trx ‖ 32 个零字节)
pub fn signing_digest(chain_id: &ChainId, packed_trx: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(chain_id.as_bytes());
    hasher.update(packed_trx);
    // 无上下文无关数据
    hasher.update([0u8; 32]);
    hasher.finalize().into()
}

/// 交易 ID：sha256(packed_trx)
pub fn transaction_id(packed_trx: &[u8]) -> [u8; 32] {
    Sha256::digest(packed_trx).into()
}

/// 已签名交易（仅构建，不广播）
#[derive(Debug, Clone, Serialize)]
pub struct SignedTransaction {
    pub transaction_id: String,
    pub broadcast: bool,
    pub chain_id: ChainId,
    pub signatures: Vec<EosSignature>,
    pub compression: String,
    pub packed_context_free_data: String,
    pub packed_trx: String,
    pub transaction: Transaction,
    #[serde(skip)]
    packed: Vec<u8>,
}

impl SignedTransaction {
    pub fn actions(&self) -> &[Action] {
        &self.transaction.actions
    }

    pub fn packed_bytes(&self) -> &[u8] {
        &self.packed
    }

    /// 签名所用摘要
    pub fn signing_digest(&self) -> [u8; 32] {
        signing_digest(&self.chain_id, &self.packed)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
