//! 链配置模块
//!
//! 链 ID、原生代币符号与精度、公钥前缀、系统合约账户

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::abi::Name;
use crate::crypto::DEFAULT_KEY_PREFIX;
use crate::domain::asset::Symbol;
use crate::domain::derivation_path::bip44_path;
use crate::error::{Result, SignerError};

/// 主网链 ID
pub const MAINNET_CHAIN_ID: &str =
    "aca376f206b8fc25a6ed44dbdc66547c36c6c33e3a119ffbeaef943642f0e906";

/// SLIP-44 coin type
pub const COIN_TYPE: u32 = 194;

/// 32 字节链标识，签名摘要的一部分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId([u8; 32]);

impl ChainId {
    pub fn mainnet() -> Self {
        // 常量字符串，解析不会失败
        Self::from_hex(MAINNET_CHAIN_ID).unwrap_or(ChainId([0u8; 32]))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        ChainId(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| {
            SignerError::serialization_failed(format!("Invalid chain id hex: {}", e))
                .with_field("chain_id")
        })?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            SignerError::serialization_failed("Chain id must be 32 bytes").with_field("chain_id")
        })?;
        Ok(ChainId(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Default for ChainId {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ChainId {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ChainId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// 链配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// 链 ID
    pub chain_id: ChainId,
    /// 原生代币符号（精度,代码），如 `4,EOS`
    pub symbol: Symbol,
    /// 公钥文本前缀
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// 系统合约账户
    #[serde(default = "default_system_contract")]
    pub system_contract: Name,
    /// 代币合约账户
    #[serde(default = "default_token_contract")]
    pub token_contract: Name,
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_system_contract() -> Name {
    // 0x5530ea0000000000 = "eosio"
    Name::from_raw(0x5530_ea00_0000_0000)
}

fn default_token_contract() -> Name {
    // 0x5530ea033482a600 = "eosio.token"
    Name::from_raw(0x5530_ea03_3482_a600)
}

impl ChainConfig {
    /// 主网配置
    pub fn mainnet() -> Self {
        Self {
            chain_id: ChainId::mainnet(),
            symbol: Symbol::native(),
            key_prefix: default_key_prefix(),
            system_contract: default_system_contract(),
            token_contract: default_token_contract(),
        }
    }

    /// 标准 BIP44 路径：m/44'/194'/account'/change/index
    pub fn derivation_path(&self, account: u32, change: u32, index: u32) -> String {
        bip44_path(account, change, index)
    }
}

impl ChainConfig {
    /// 主网配置叠加环境变量覆盖
    ///
    /// 读取 `CHAIN_ID`、`CHAIN_SYMBOL`、`CHAIN_PRECISION`、`KEY_PREFIX`；
    /// 无效值记录警告并保留主网取值
    pub fn from_env() -> Self {
        let mut config = Self::mainnet();

        if let Ok(value) = std::env::var("CHAIN_ID") {
            match ChainId::from_hex(&value) {
                Ok(chain_id) => config.chain_id = chain_id,
                Err(e) => tracing::warn!("CHAIN_ID 无效，使用主网链 ID: {}", e),
            }
        }
        if let Ok(value) = std::env::var("CHAIN_SYMBOL") {
            match value.parse::<Symbol>() {
                Ok(symbol) => config.symbol = symbol,
                Err(e) => tracing::warn!("CHAIN_SYMBOL 无效，使用默认符号: {}", e),
            }
        }
        if let Ok(value) = std::env::var("CHAIN_PRECISION") {
            match value
                .trim()
                .parse::<u8>()
                .map_err(|e| e.to_string())
                .and_then(|p| {
                    Symbol::new(p, config.symbol.code()).map_err(|e| e.to_string())
                }) {
                Ok(symbol) => config.symbol = symbol,
                Err(e) => tracing::warn!("CHAIN_PRECISION 无效，使用默认精度: {}", e),
            }
        }
        if let Ok(prefix) = std::env::var("KEY_PREFIX") {
            if !prefix.trim().is_empty() {
                config.key_prefix = prefix.trim().to_string();
            }
        }

        config
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}
