//! 密钥文本编码
//!
//! - 私钥：WIF（版本字节 0x80，双 SHA256 校验）或 `PVT_K1_`
//! - 公钥：旧格式 `EOS…`（RIPEMD160 校验）或 `PUB_K1_`

use std::{fmt, str::FromStr};

use bitcoin::hashes::{ripemd160, Hash};
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::abi::{AbiEncode, AbiWriter};
use crate::error::{Result, SignerError};

/// WIF 版本字节
pub const WIF_VERSION: u8 = 0x80;
/// 默认公钥前缀
pub const DEFAULT_KEY_PREFIX: &str = "EOS";

const K1_SUFFIX: &[u8] = b"K1";
const PUB_K1_PREFIX: &str = "PUB_K1_";
const PVT_K1_PREFIX: &str = "PVT_K1_";

/// RIPEMD160(data ‖ suffix) 前 4 字节
pub(crate) fn ripemd160_checksum(data: &[u8], suffix: &[u8]) -> [u8; 4] {
    let mut input = Vec::with_capacity(data.len() + suffix.len());
    input.extend_from_slice(data);
    input.extend_from_slice(suffix);
    let hash = ripemd160::Hash::hash(&input).to_byte_array();
    [hash[0], hash[1], hash[2], hash[3]]
}

fn double_sha256_checksum(data: &[u8]) -> [u8; 4] {
    let hash = Sha256::digest(Sha256::digest(data));
    [hash[0], hash[1], hash[2], hash[3]]
}

/// 解码 base58 并校验 RIPEMD160 尾部校验和，返回负载
pub(crate) fn decode_ripemd160_checked(encoded: &str, suffix: &[u8]) -> Option<Vec<u8>> {
    let raw = bs58::decode(encoded).into_vec().ok()?;
    if raw.len() < 4 {
        return None;
    }
    let (payload, checksum) = raw.split_at(raw.len() - 4);
    if ripemd160_checksum(payload, suffix) != checksum {
        return None;
    }
    Some(payload.to_vec())
}

pub(crate) fn encode_ripemd160_checked(payload: &[u8], suffix: &[u8]) -> String {
    let mut raw = payload.to_vec();
    raw.extend_from_slice(&ripemd160_checksum(payload, suffix));
    bs58::encode(raw).into_string()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 私钥
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// secp256k1 私钥（32 字节标量）
#[derive(Clone, PartialEq, Eq)]
pub struct EosPrivateKey(SecretKey);

impl EosPrivateKey {
    pub fn from_secret_key(secret: SecretKey) -> Self {
        Self(secret)
    }

    /// 从 32 字节构造；非法标量（0 或 ≥ n）返回 `InvalidPrivateKey`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| SignerError::invalid_private_key(format!("Invalid secp256k1 scalar: {}", e)))
    }

    /// 解码 WIF；同时接受 `PVT_K1_` 文本和带压缩标志的 38 字节 WIF
    pub fn from_wif(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        if let Some(body) = encoded.strip_prefix(PVT_K1_PREFIX) {
            let payload = Zeroizing::new(
                decode_ripemd160_checked(body, K1_SUFFIX)
                    .ok_or_else(|| SignerError::invalid_wif("Malformed PVT_K1 private key"))?,
            );
            if payload.len() != 32 {
                return Err(SignerError::invalid_wif("PVT_K1 payload must be 32 bytes"));
            }
            return Self::from_bytes(&payload);
        }

        let raw = Zeroizing::new(
            bs58::decode(encoded)
                .into_vec()
                .map_err(|e| SignerError::invalid_wif(format!("Invalid base58: {}", e)))?,
        );

        let key_len = match raw.len() {
            37 => 32,
            38 if raw[33] == 0x01 => 33,
            n => {
                return Err(SignerError::invalid_wif(format!(
                    "Unexpected WIF length: {} bytes",
                    n
                )))
            }
        };

        let (payload, checksum) = raw.split_at(1 + key_len);
        if double_sha256_checksum(payload) != checksum {
            return Err(SignerError::invalid_wif("WIF checksum mismatch"));
        }
        if payload[0] != WIF_VERSION {
            return Err(SignerError::invalid_wif(format!(
                "Unexpected WIF version byte: 0x{:02x}",
                payload[0]
            )));
        }

        Self::from_bytes(&payload[1..33])
    }

    /// 未压缩 WIF（链上默认格式）
    pub fn to_wif(&self) -> String {
        let mut raw = Zeroizing::new(Vec::with_capacity(37));
        raw.push(WIF_VERSION);
        raw.extend_from_slice(&self.0.secret_bytes());
        let checksum = double_sha256_checksum(&raw);
        raw.extend_from_slice(&checksum);
        bs58::encode(raw.as_slice()).into_string()
    }

    pub fn to_k1_string(&self) -> String {
        let bytes = Zeroizing::new(self.0.secret_bytes());
        format!(
            "{}{}",
            PVT_K1_PREFIX,
            encode_ripemd160_checked(bytes.as_slice(), K1_SUFFIX)
        )
    }

    pub fn public_key(&self) -> EosPublicKey {
        let secp = Secp256k1::signing_only();
        EosPublicKey(PublicKey::from_secret_key(&secp, &self.0))
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.0
    }
}

impl fmt::Debug for EosPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EosPrivateKey(<hidden>)")
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 公钥
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 压缩公钥（33 字节）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EosPublicKey(PublicKey);

impl EosPublicKey {
    pub fn from_public_key(key: PublicKey) -> Self {
        Self(key)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        PublicKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| SignerError::invalid_public_key(format!("Invalid secp256k1 point: {}", e)))
    }

    /// 解析 `PUB_K1_…` 或 `<prefix>…` 格式
    pub fn parse_with_prefix(encoded: &str, prefix: &str) -> Result<Self> {
        let encoded = encoded.trim();
        let decoded = if let Some(body) = encoded.strip_prefix(PUB_K1_PREFIX) {
            decode_ripemd160_checked(body, K1_SUFFIX)
        } else if let Some(body) = encoded.strip_prefix(prefix) {
            decode_ripemd160_checked(body, b"")
        } else {
            return Err(SignerError::invalid_public_key(format!(
                "Public key must start with '{}' or '{}'",
                prefix, PUB_K1_PREFIX
            )));
        };
        let payload = decoded
            .ok_or_else(|| SignerError::invalid_public_key("Public key checksum mismatch"))?;

        if payload.len() != 33 {
            return Err(SignerError::invalid_public_key(
                "Public key payload must be 33 bytes",
            ));
        }
        Self::from_bytes(&payload)
    }

    pub fn to_bytes(&self) -> [u8; 33] {
        self.0.serialize()
    }

    /// 旧格式：`<prefix>` + base58(key ‖ ripemd160(key)[..4])
    pub fn to_legacy_string(&self, prefix: &str) -> String {
        format!("{}{}", prefix, encode_ripemd160_checked(&self.to_bytes(), b""))
    }

    pub fn to_k1_string(&self) -> String {
        format!(
            "{}{}",
            PUB_K1_PREFIX,
            encode_ripemd160_checked(&self.to_bytes(), K1_SUFFIX)
        )
    }
}

impl fmt::Display for EosPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_legacy_string(DEFAULT_KEY_PREFIX))
    }
}

impl FromStr for EosPublicKey {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_with_prefix(s, DEFAULT_KEY_PREFIX)
    }
}

impl AbiEncode for EosPublicKey {
    fn encode(&self, writer: &mut AbiWriter) {
        // 变体索引 0 = K1
        writer.write_u8(0);
        writer.write_raw(&self.to_bytes());
    }
}
