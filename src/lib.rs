//! IronSign - 离线 HD 密钥树与交易签名库
//!
//! 从种子、助记词或扩展密钥派生密钥，离线构建并签名链上交易；不访问任何节点

pub mod abi;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use error::{Result, SignerError, SignerErrorCode};

// 统一模块导出
pub mod prelude {
    pub use crate::{
        config::{BuilderConfig, Config},
        domain::{ChainConfig, ChainId, Expiration, KeyNode, SignedTransaction, TransactionHeaders},
        error::{Result, SignerError, SignerErrorCode},
        service::TransactionBuilder,
    };
}
