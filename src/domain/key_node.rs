//! HD 密钥节点
//!
//! 节点来源有三种：种子、扩展密钥、原始密钥对。只有持有扩展私钥的节点可以继续派生；
//! 派生是纯函数，返回新节点，原节点保持不变，可在多个线程间共享
//!
//! ```text
//! SeedRooted ──derive──▶ ExtendedKeyRooted(private) ──derive──▶ ExtendedKeyRooted(private)
//! ExtendedKeyRooted(public)  ── 终态
//! RawKeypair                 ── 终态
//! ```

use std::fmt;

use bip39::{Language, Mnemonic};
use bitcoin::bip32::{ChildNumber, Xpriv, Xpub};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::Network;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::{EosPrivateKey, EosPublicKey, DEFAULT_KEY_PREFIX};
use crate::domain::chain_config::ChainId;
use crate::domain::derivation_path::{bip44_path, parse_path};
use crate::error::{Result, SignerError};

/// BIP32 种子长度范围（字节）
const MIN_SEED_LEN: usize = 16;
const MAX_SEED_LEN: usize = 64;

/// 节点来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    Seed,
    ExtendedKey,
    RawKeypair,
}

/// 派生状态机的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    SeedRooted,
    ExtendedKeyRooted { private: bool },
    RawKeypair,
}

#[derive(Clone)]
enum KeyMaterial {
    ExtendedPrivate(Xpriv),
    ExtendedPublic(Xpub),
    Raw {
        private: EosPrivateKey,
        public: EosPublicKey,
    },
}

/// HD 密钥节点
#[derive(Clone)]
pub struct KeyNode {
    origin: KeyOrigin,
    material: KeyMaterial,
    chain_id: ChainId,
}

impl KeyNode {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 构造
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// 从十六进制种子创建主节点
    pub fn from_seed(seed_hex: &str, chain_id: Option<ChainId>) -> Result<Self> {
        let seed = Zeroizing::new(
            hex::decode(seed_hex.trim())
                .map_err(|e| SignerError::invalid_seed(format!("Seed is not valid hex: {}", e)))?,
        );
        Self::from_seed_bytes(&seed, chain_id)
    }

    /// 从原始种子字节创建主节点
    pub fn from_seed_bytes(seed: &[u8], chain_id: Option<ChainId>) -> Result<Self> {
        if seed.len() < MIN_SEED_LEN || seed.len() > MAX_SEED_LEN {
            return Err(SignerError::invalid_seed(format!(
                "Seed must be {}-{} bytes, got {}",
                MIN_SEED_LEN,
                MAX_SEED_LEN,
                seed.len()
            )));
        }

        let master = Xpriv::new_master(Network::Bitcoin, seed)
            .map_err(|e| SignerError::invalid_seed(format!("Failed to derive master key: {}", e)))?;

        tracing::debug!("master key node created from seed");
        Ok(Self {
            origin: KeyOrigin::Seed,
            material: KeyMaterial::ExtendedPrivate(master),
            chain_id: chain_id.unwrap_or_default(),
        })
    }

    /// 从 BIP39 助记词创建主节点（空密码）
    pub fn from_mnemonic(words: &str, chain_id: Option<ChainId>) -> Result<Self> {
        Self::from_mnemonic_with_passphrase(words, "", chain_id)
    }

    pub fn from_mnemonic_with_passphrase(
        words: &str,
        passphrase: &str,
        chain_id: Option<ChainId>,
    ) -> Result<Self> {
        let mnemonic = Mnemonic::parse_in(Language::English, words.trim())
            .map_err(|e| SignerError::invalid_mnemonic(format!("Invalid mnemonic: {}", e)))?;
        let seed = Zeroizing::new(mnemonic.to_seed(passphrase));
        Self::from_seed_bytes(seed.as_slice(), chain_id)
    }

    /// 生成新的英文助记词（12/15/18/21/24 词）
    pub fn generate_mnemonic(word_count: usize) -> Result<String> {
        if !matches!(word_count, 12 | 15 | 18 | 21 | 24) {
            return Err(SignerError::invalid_mnemonic(format!(
                "Word count must be 12, 15, 18, 21 or 24, got {}",
                word_count
            )));
        }

        let mut entropy = Zeroizing::new(vec![0u8; word_count / 3 * 4]);
        rand::thread_rng().fill_bytes(&mut entropy);

        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
            .map_err(|e| SignerError::invalid_mnemonic(format!("Failed to generate mnemonic: {}", e)))?;
        Ok(mnemonic.to_string())
    }

    /// 包装外部扩展密钥（xprv 或 xpub），不校验深度
    pub fn from_extended_key(key: &str, chain_id: Option<ChainId>) -> Result<Self> {
        let key = key.trim();
        let material = if let Ok(xpriv) = key.parse::<Xpriv>() {
            KeyMaterial::ExtendedPrivate(xpriv)
        } else if let Ok(xpub) = key.parse::<Xpub>() {
            KeyMaterial::ExtendedPublic(xpub)
        } else {
            return Err(SignerError::invalid_extended_key(
                "Not a valid extended private or public key",
            ));
        };

        Ok(Self {
            origin: KeyOrigin::ExtendedKey,
            material,
            chain_id: chain_id.unwrap_or_default(),
        })
    }

    /// 从 WIF 私钥创建原始密钥对节点（不可派生）
    pub fn from_private_key(wif: &str, chain_id: Option<ChainId>) -> Result<Self> {
        let private = EosPrivateKey::from_wif(wif)?;
        let public = private.public_key();
        Ok(Self {
            origin: KeyOrigin::RawKeypair,
            material: KeyMaterial::Raw { private, public },
            chain_id: chain_id.unwrap_or_default(),
        })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 派生
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// 沿路径派生，路径相对于当前节点
    pub fn derive_path(&self, path: &str) -> Result<KeyNode> {
        let xpriv = self.derivable()?;
        let path = parse_path(path)?;

        let secp = Secp256k1::new();
        let derived = xpriv
            .derive_priv(&secp, &path)
            .map_err(|e| SignerError::invalid_path(format!("Derivation failed: {}", e)))?;

        tracing::debug!(depth = derived.depth, "derived key node along path");
        Ok(self.child(derived))
    }

    /// 单步派生；index ≥ 2^31 为硬化派生
    pub fn derive_child(&self, index: u32) -> Result<KeyNode> {
        let xpriv = self.derivable()?;

        let secp = Secp256k1::new();
        let child = [ChildNumber::from(index)];
        let derived = xpriv
            .derive_priv(&secp, &child)
            .map_err(|e| SignerError::invalid_path(format!("Derivation failed: {}", e)))?;

        tracing::debug!(depth = derived.depth, index, "derived child key node");
        Ok(self.child(derived))
    }

    /// 派生标准账户路径 m/44'/194'/account'/change/index
    pub fn derive_account(&self, account: u32, change: u32, index: u32) -> Result<KeyNode> {
        self.derive_path(&bip44_path(account, change, index))
    }

    fn derivable(&self) -> Result<&Xpriv> {
        match &self.material {
            KeyMaterial::ExtendedPrivate(xpriv) => Ok(xpriv),
            KeyMaterial::ExtendedPublic(_) => Err(SignerError::not_derivable(
                "Public-only extended key cannot derive children",
            )),
            KeyMaterial::Raw { .. } => Err(SignerError::not_derivable(
                "Raw private key has no chain code to derive from",
            )),
        }
    }

    fn child(&self, derived: Xpriv) -> KeyNode {
        KeyNode {
            origin: KeyOrigin::ExtendedKey,
            material: KeyMaterial::ExtendedPrivate(derived),
            chain_id: self.chain_id,
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 导出
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn public_extended_key(&self) -> Result<String> {
        match &self.material {
            KeyMaterial::ExtendedPrivate(xpriv) => {
                let secp = Secp256k1::signing_only();
                Ok(Xpub::from_priv(&secp, xpriv).to_string())
            }
            KeyMaterial::ExtendedPublic(xpub) => Ok(xpub.to_string()),
            KeyMaterial::Raw { .. } => Err(SignerError::key_unavailable(
                "Raw keypair has no chain code for an extended public key",
            )),
        }
    }

    pub fn private_extended_key(&self) -> Result<String> {
        match &self.material {
            KeyMaterial::ExtendedPrivate(xpriv) => Ok(xpriv.to_string()),
            KeyMaterial::ExtendedPublic(_) => Err(SignerError::key_unavailable(
                "Public-only node has no private extended key",
            )),
            KeyMaterial::Raw { .. } => Err(SignerError::key_unavailable(
                "Raw keypair has no chain code for an extended private key",
            )),
        }
    }

    /// 公钥（`EOS…` 格式），总是可用
    ///
    /// 前缀固定为 `EOS`；前缀不同的链使用 [`KeyNode::public_key_with_prefix`]，
    /// 与交易权限中渲染的公钥一致
    pub fn public_key(&self) -> String {
        self.eos_public_key().to_legacy_string(DEFAULT_KEY_PREFIX)
    }

    /// 按链配置的前缀渲染公钥
    pub fn public_key_with_prefix(&self, prefix: &str) -> String {
        self.eos_public_key().to_legacy_string(prefix)
    }

    pub fn eos_public_key(&self) -> EosPublicKey {
        match &self.material {
            KeyMaterial::ExtendedPrivate(xpriv) => {
                let secp = Secp256k1::signing_only();
                EosPublicKey::from_public_key(Xpub::from_priv(&secp, xpriv).public_key)
            }
            KeyMaterial::ExtendedPublic(xpub) => EosPublicKey::from_public_key(xpub.public_key),
            KeyMaterial::Raw { public, .. } => *public,
        }
    }

    /// WIF 私钥，仅持有私钥材料的节点可用
    pub fn private_key(&self) -> Result<String> {
        match &self.material {
            KeyMaterial::ExtendedPrivate(xpriv) => {
                Ok(EosPrivateKey::from_secret_key(xpriv.private_key).to_wif())
            }
            KeyMaterial::Raw { private, .. } => Ok(private.to_wif()),
            KeyMaterial::ExtendedPublic(_) => Err(SignerError::key_unavailable(
                "Public-only node has no private key",
            )),
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 状态
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn origin(&self) -> KeyOrigin {
        self.origin
    }

    pub fn state(&self) -> NodeState {
        match (&self.origin, &self.material) {
            (KeyOrigin::Seed, _) => NodeState::SeedRooted,
            (_, KeyMaterial::ExtendedPrivate(_)) => NodeState::ExtendedKeyRooted { private: true },
            (_, KeyMaterial::ExtendedPublic(_)) => NodeState::ExtendedKeyRooted { private: false },
            (_, KeyMaterial::Raw { .. }) => NodeState::RawKeypair,
        }
    }

    /// 树中深度；原始密钥对没有深度
    pub fn depth(&self) -> Option<u8> {
        match &self.material {
            KeyMaterial::ExtendedPrivate(xpriv) => Some(xpriv.depth),
            KeyMaterial::ExtendedPublic(xpub) => Some(xpub.depth),
            KeyMaterial::Raw { .. } => None,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }
}

impl fmt::Debug for KeyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyNode")
            .field("state", &self.state())
            .field("depth", &self.depth())
            .field("public_key", &self.public_key())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignerErrorCode;

    const SEED: &str = "000102030405060708090a0b0c0d0e0f";
    const MASTER_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";
    const MASTER_XPRV: &str = "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi";
    const HARDENED_0_XPRV: &str = "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7";

    #[test]
    fn test_master_from_seed() {
        let node = KeyNode::from_seed(SEED, None).unwrap();
        assert_eq!(node.public_extended_key().unwrap(), MASTER_XPUB);
        assert_eq!(node.private_extended_key().unwrap(), MASTER_XPRV);
        assert_eq!(node.state(), NodeState::SeedRooted);
        assert_eq!(node.depth(), Some(0));
        assert_eq!(node.chain_id(), ChainId::mainnet());
    }

    #[test]
    fn test_hardened_child() {
        let node = KeyNode::from_seed(SEED, None).unwrap();
        let child = node.derive_path("m/0'").unwrap();
        assert_eq!(child.private_extended_key().unwrap(), HARDENED_0_XPRV);
        assert_eq!(
            node.derive_child(0x8000_0000).unwrap().private_extended_key().unwrap(),
            HARDENED_0_XPRV
        );
        assert_eq!(child.state(), NodeState::ExtendedKeyRooted { private: true });
    }

    #[test]
    fn test_derivation_does_not_mutate_parent() {
        let node = KeyNode::from_seed(SEED, None).unwrap();
        let _ = node.derive_path("m/44'/194'/0'/0/0").unwrap();
        assert_eq!(node.public_extended_key().unwrap(), MASTER_XPUB);
        assert_eq!(node.depth(), Some(0));
    }

    #[test]
    fn test_invalid_seed() {
        for bad in ["zz", "", "0001"] {
            let err = KeyNode::from_seed(bad, None).unwrap_err();
            assert!(err.is(SignerErrorCode::InvalidSeed), "{}", bad);
        }
    }

    #[test]
    fn test_generate_mnemonic() {
        let words = KeyNode::generate_mnemonic(12).unwrap();
        assert_eq!(words.split_whitespace().count(), 12);
        assert!(KeyNode::from_mnemonic(&words, None).is_ok());

        let err = KeyNode::generate_mnemonic(13).unwrap_err();
        assert!(err.is(SignerErrorCode::InvalidMnemonic));
    }

    #[test]
    fn test_debug_hides_private_material() {
        let node = KeyNode::from_seed(SEED, None).unwrap();
        let debug = format!("{:?}", node);
        assert!(!debug.contains("xprv"));
        assert!(debug.contains("SeedRooted"));
    }
}
