//! 密码学原语适配层
//!
//! 曲线运算与哈希来自 bitcoin (secp256k1 / hashes)，这里只负责链上的文本编码与签名规范

pub mod keys;
pub mod signature;

pub use keys::{EosPrivateKey, EosPublicKey, DEFAULT_KEY_PREFIX, WIF_VERSION};
pub use signature::{sign_digest, EosSignature};
