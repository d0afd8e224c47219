//! 统一错误类型
//!
//! 所有失败均为确定性的输入校验失败：同步抛出、不重试、不返回部分交易

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignerErrorCode {
    // 密钥节点
    InvalidSeed,
    InvalidMnemonic,
    InvalidWif,
    InvalidPrivateKey,
    InvalidExtendedKey,
    InvalidPath,
    NotDerivable,
    KeyUnavailable,

    // 交易构建
    SigningKeyUnavailable,
    InvalidAmount,
    InvalidSymbol,
    InvalidExpiration,
    MissingRequiredField,
    InvalidAccountName,
    InvalidPublicKey,
    InvalidMemo,
    InvalidProducerList,
    SerializationFailed,
}

impl SignerErrorCode {
    /// 稳定的 snake_case 错误码（供调用方匹配）
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerErrorCode::InvalidSeed => "invalid_seed",
            SignerErrorCode::InvalidMnemonic => "invalid_mnemonic",
            SignerErrorCode::InvalidWif => "invalid_wif",
            SignerErrorCode::InvalidPrivateKey => "invalid_private_key",
            SignerErrorCode::InvalidExtendedKey => "invalid_extended_key",
            SignerErrorCode::InvalidPath => "invalid_path",
            SignerErrorCode::NotDerivable => "not_derivable",
            SignerErrorCode::KeyUnavailable => "key_unavailable",
            SignerErrorCode::SigningKeyUnavailable => "signing_key_unavailable",
            SignerErrorCode::InvalidAmount => "invalid_amount",
            SignerErrorCode::InvalidSymbol => "invalid_symbol",
            SignerErrorCode::InvalidExpiration => "invalid_expiration",
            SignerErrorCode::MissingRequiredField => "missing_required_field",
            SignerErrorCode::InvalidAccountName => "invalid_account_name",
            SignerErrorCode::InvalidPublicKey => "invalid_public_key",
            SignerErrorCode::InvalidMemo => "invalid_memo",
            SignerErrorCode::InvalidProducerList => "invalid_producer_list",
            SignerErrorCode::SerializationFailed => "serialization_failed",
        }
    }
}

impl fmt::Display for SignerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct SignerError {
    pub code: SignerErrorCode,
    pub message: String,
    /// 出错的输入字段（如 `from`、`producers`、`ref_block_num`）
    pub field: Option<String>,
}

pub type Result<T> = std::result::Result<T, SignerError>;

impl SignerError {
    pub fn new(code: SignerErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            field: None,
        }
    }

    /// 标注出错字段
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn is(&self, code: SignerErrorCode) -> bool {
        self.code == code
    }

    pub fn invalid_seed(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidSeed, msg)
    }

    pub fn invalid_mnemonic(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidMnemonic, msg)
    }

    pub fn invalid_wif(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidWif, msg)
    }

    pub fn invalid_private_key(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidPrivateKey, msg)
    }

    pub fn invalid_extended_key(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidExtendedKey, msg)
    }

    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidPath, msg)
    }

    pub fn not_derivable(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::NotDerivable, msg)
    }

    pub fn key_unavailable(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::KeyUnavailable, msg)
    }

    pub fn signing_key_unavailable(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::SigningKeyUnavailable, msg)
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidAmount, msg)
    }

    pub fn invalid_symbol(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidSymbol, msg)
    }

    pub fn invalid_expiration(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidExpiration, msg).with_field("expiration")
    }

    /// 缺少必填字段，字段名即错误上下文
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            SignerErrorCode::MissingRequiredField,
            format!("Missing required field: {}", field),
        )
        .with_field(field)
    }

    pub fn invalid_account_name(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidAccountName, msg)
    }

    pub fn invalid_public_key(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidPublicKey, msg)
    }

    pub fn invalid_memo(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidMemo, msg).with_field("memo")
    }

    pub fn invalid_producer_list(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::InvalidProducerList, msg).with_field("producers")
    }

    pub fn serialization_failed(msg: impl Into<String>) -> Self {
        Self::new(SignerErrorCode::SerializationFailed, msg)
    }
}

// 从 serde_json 错误转换
impl From<serde_json::Error> for SignerError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_failed(format!("JSON serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_carries_context() {
        let err = SignerError::missing_field("ref_block_num");
        assert!(err.is(SignerErrorCode::MissingRequiredField));
        assert_eq!(err.field.as_deref(), Some("ref_block_num"));
        assert_eq!(
            err.to_string(),
            "missing_required_field: Missing required field: ref_block_num"
        );
    }

    #[test]
    fn test_with_field_overrides() {
        let err = SignerError::invalid_amount("negative").with_field("quantity");
        assert_eq!(err.code.as_str(), "invalid_amount");
        assert_eq!(err.field.as_deref(), Some("quantity"));
    }
}
