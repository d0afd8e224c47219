//! 可恢复 ECDSA 签名
//!
//! 链上只接受规范签名：r、s 的最高位为 0，且不带多余的前导零字节。
//! RFC 6979 确定性签名不满足时，附加递增的 nonce 数据重签

use std::{fmt, str::FromStr};

use bitcoin::secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, Secp256k1,
};
use serde::{Serialize, Serializer};

use super::keys::{decode_ripemd160_checked, encode_ripemd160_checked, EosPrivateKey, EosPublicKey};
use crate::error::{Result, SignerError};

const SIG_K1_PREFIX: &str = "SIG_K1_";
const K1_SUFFIX: &[u8] = b"K1";
/// 压缩公钥 + 可恢复签名的头字节偏移
const HEADER_OFFSET: u8 = 27 + 4;
const MAX_SIGN_ATTEMPTS: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EosSignature {
    recovery_id: u8,
    compact: [u8; 64],
}

/// r、s 均为规范形式
pub fn is_canonical(compact: &[u8; 64]) -> bool {
    compact[0] & 0x80 == 0
        && !(compact[0] == 0 && compact[1] & 0x80 == 0)
        && compact[32] & 0x80 == 0
        && !(compact[32] == 0 && compact[33] & 0x80 == 0)
}

fn message(digest: &[u8; 32]) -> Result<Message> {
    Message::from_digest_slice(digest)
        .map_err(|e| SignerError::serialization_failed(format!("Invalid digest: {}", e)))
}

/// 对 32 字节摘要签名，结果确定且规范
pub fn sign_digest(key: &EosPrivateKey, digest: &[u8; 32]) -> Result<EosSignature> {
    let secp = Secp256k1::signing_only();
    let msg = message(digest)?;

    for attempt in 0..MAX_SIGN_ATTEMPTS {
        let signature = if attempt == 0 {
            secp.sign_ecdsa_recoverable(&msg, key.secret_key())
        } else {
            let mut noncedata = [0u8; 32];
            noncedata[28..].copy_from_slice(&attempt.to_be_bytes());
            secp.sign_ecdsa_recoverable_with_noncedata(&msg, key.secret_key(), &noncedata)
        };

        let (recovery_id, compact) = signature.serialize_compact();
        if is_canonical(&compact) {
            tracing::trace!(attempt, "canonical signature found");
            return Ok(EosSignature {
                recovery_id: recovery_id.to_i32() as u8,
                compact,
            });
        }
    }

    Err(SignerError::serialization_failed(
        "Failed to produce a canonical signature",
    ))
}

impl EosSignature {
    /// 头字节 ‖ r ‖ s
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0] = self.recovery_id + HEADER_OFFSET;
        bytes[1..].copy_from_slice(&self.compact);
        bytes
    }

    pub fn is_canonical(&self) -> bool {
        is_canonical(&self.compact)
    }

    /// 从摘要恢复签名公钥
    pub fn recover(&self, digest: &[u8; 32]) -> Result<EosPublicKey> {
        let secp = Secp256k1::verification_only();
        let recovery_id = RecoveryId::from_i32(self.recovery_id as i32)
            .map_err(|e| SignerError::serialization_failed(format!("Bad recovery id: {}", e)))?;
        let signature = RecoverableSignature::from_compact(&self.compact, recovery_id)
            .map_err(|e| SignerError::serialization_failed(format!("Bad signature: {}", e)))?;
        let public_key = secp
            .recover_ecdsa(&message(digest)?, &signature)
            .map_err(|e| SignerError::serialization_failed(format!("Recovery failed: {}", e)))?;
        Ok(EosPublicKey::from_public_key(public_key))
    }
}

impl fmt::Display for EosSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            SIG_K1_PREFIX,
            encode_ripemd160_checked(&self.to_bytes(), K1_SUFFIX)
        )
    }
}

impl FromStr for EosSignature {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self> {
        let body = s
            .strip_prefix(SIG_K1_PREFIX)
            .ok_or_else(|| SignerError::serialization_failed("Signature must start with SIG_K1_"))?;
        let payload = decode_ripemd160_checked(body, K1_SUFFIX)
            .ok_or_else(|| SignerError::serialization_failed("Signature checksum mismatch"))?;
        if payload.len() != 65 {
            return Err(SignerError::serialization_failed(
                "Signature payload must be 65 bytes",
            ));
        }

        let recovery_id = match payload[0] {
            h @ 31..=34 => h - HEADER_OFFSET,
            h @ 27..=30 => h - 27,
            h => {
                return Err(SignerError::serialization_failed(format!(
                    "Unexpected signature header: {}",
                    h
                )))
            }
        };
        let mut compact = [0u8; 64];
        compact.copy_from_slice(&payload[1..]);
        Ok(EosSignature {
            recovery_id,
            compact,
        })
    }
}

impl Serialize for EosSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use sha2::{Digest, Sha256};

    use super::*;

    const DEV_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

    fn digest(data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }

    #[test]
    fn test_sign_is_deterministic_and_canonical() {
        let key = EosPrivateKey::from_wif(DEV_WIF).unwrap();
        let d = digest(b"ironsign");

        let a = sign_digest(&key, &d).unwrap();
        let b = sign_digest(&key, &d).unwrap();
        assert_eq!(a, b);
        assert!(a.is_canonical());
        assert!(a.to_string().starts_with("SIG_K1_"));
    }

    #[test]
    fn test_recover_matches_signer() {
        let key = EosPrivateKey::from_wif(DEV_WIF).unwrap();
        for i in 0u8..16 {
            let d = digest(&[i]);
            let sig = sign_digest(&key, &d).unwrap();
            assert!(sig.is_canonical());
            assert_eq!(sig.recover(&d).unwrap(), key.public_key());
        }
    }

    #[test]
    fn test_text_round_trip() {
        let key = EosPrivateKey::from_wif(DEV_WIF).unwrap();
        let sig = sign_digest(&key, &digest(b"text")).unwrap();
        let parsed: EosSignature = sig.to_string().parse().unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn test_canonical_rules() {
        let mut compact = [0x11u8; 64];
        assert!(is_canonical(&compact));

        compact[0] = 0x80;
        assert!(!is_canonical(&compact));

        compact[0] = 0x00;
        compact[1] = 0x10;
        assert!(!is_canonical(&compact));

        compact[1] = 0x90;
        assert!(is_canonical(&compact));
    }
}
