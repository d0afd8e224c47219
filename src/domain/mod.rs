//! Domain 模块
//!
//! 密钥树、链参数、资产与交易模型

pub mod action;
pub mod asset;
pub mod chain_config;
pub mod derivation_path;
pub mod key_node;
pub mod transaction;

// 重新导出常用类型
pub use action::{Action, ActionData, ActionKind, Authority, PermissionLevel};
pub use asset::{Asset, Symbol};
pub use chain_config::{ChainConfig, ChainId};
pub use derivation_path::{bip44_path, is_standard_path, parse_path};
pub use key_node::{KeyNode, KeyOrigin, NodeState};
pub use transaction::{Expiration, SignedTransaction, Transaction, TransactionHeaders};
