//! 测试辅助模块
//! 固定密钥、种子与交易头

#![allow(dead_code)]

use ironsign::config::ResourceDefaults;
use ironsign::prelude::*;
use rust_decimal::Decimal;

/// 开发用私钥（公开的测试密钥，切勿用于主网）
pub const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
pub const DEV_PUBLIC_KEY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";

/// BIP32 测试向量 1 的种子
pub const TEST_SEED: &str = "000102030405060708090a0b0c0d0e0f";

/// BIP39 标准测试助记词
pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub fn dev_node() -> KeyNode {
    KeyNode::from_private_key(DEV_WIF, None).expect("dev key must decode")
}

pub fn seed_node() -> KeyNode {
    KeyNode::from_seed(TEST_SEED, None).expect("test seed must decode")
}

pub fn test_headers() -> TransactionHeaders {
    TransactionHeaders::new("2024-01-01T00:00:00", 1234, 5678)
}

/// 固定资源默认值的构建器，不受环境变量影响
pub fn test_builder() -> TransactionBuilder {
    TransactionBuilder::new(BuilderConfig {
        chain: ChainConfig::mainnet(),
        resources: ResourceDefaults {
            ram_bytes: 4000,
            stake_cpu: Decimal::from(1000),
            stake_net: Decimal::from(1000),
        },
    })
}
