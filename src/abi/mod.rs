//! 链 ABI 编解码
//!
//! 动作与交易的离线二进制序列化

pub mod encoder;
pub mod name;

pub use encoder::{pack, AbiEncode, AbiWriter};
pub use name::Name;
