//! 密钥树集成测试
//!
//! 使用 BIP32 / BIP39 公开测试向量验证派生结果

mod common;

use common::*;
use ironsign::domain::{KeyOrigin, NodeState};
use ironsign::prelude::*;

const HARDENED: u32 = 0x8000_0000;

#[test]
fn test_wif_round_trip() {
    for wif in [
        DEV_WIF,
        "5HpjE2Hs7vjU4SN3YyPQCdhzCu92WoEeuE6PWNuiPyTu3ESGnzn",
    ] {
        let node = KeyNode::from_private_key(wif, None).unwrap();
        assert_eq!(node.private_key().unwrap(), wif);
    }
}

#[test]
fn test_k1_private_key_text_is_accepted() {
    let node = KeyNode::from_private_key(
        "PVT_K1_2bfGi9rYsXQSXXTvJbDAPhHLQUojjaNLomdm3cEJ1XTzMqUt3V",
        None,
    )
    .unwrap();
    assert_eq!(node.private_key().unwrap(), DEV_WIF);
    assert_eq!(node.public_key(), DEV_PUBLIC_KEY);
}

#[test]
fn test_invalid_wif() {
    let err = KeyNode::from_private_key("5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD4", None)
        .unwrap_err();
    assert!(err.is(SignerErrorCode::InvalidWif));

    let err = KeyNode::from_private_key("not a key", None).unwrap_err();
    assert!(err.is(SignerErrorCode::InvalidWif));
}

#[test]
fn test_single_step_path_equals_child() {
    let master = seed_node();

    for (path, index) in [("m/0", 0), ("m/0'", HARDENED), ("m/7h", HARDENED + 7)] {
        let by_path = master.derive_path(path).unwrap();
        let by_child = master.derive_child(index).unwrap();
        assert_eq!(
            by_path.private_extended_key().unwrap(),
            by_child.private_extended_key().unwrap(),
            "{}",
            path
        );
    }
}

#[test]
fn test_bip32_vector_one() {
    let master = seed_node();
    assert_eq!(master.state(), NodeState::SeedRooted);
    assert_eq!(
        master.private_extended_key().unwrap(),
        "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
    );

    let child = master.derive_path("m/0'").unwrap();
    assert_eq!(child.depth(), Some(1));
    assert_eq!(
        child.public_extended_key().unwrap(),
        "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw"
    );
    assert_eq!(child.state(), NodeState::ExtendedKeyRooted { private: true });
}

#[test]
fn test_standard_account_path() {
    let node = seed_node().derive_account(0, 0, 0).unwrap();
    assert_eq!(node.private_key().unwrap(), "5HsSKo8fQBMDfK1nwoyViB122kKpEkNr6iW5REit8brP2iVKdPX");
    assert_eq!(node.public_key(), "EOS5DK7HwLcw7aLi78PBcDJP8uLE54dQYAaVX9cDoW57qggM3WtNV");

    let same = seed_node().derive_path("m/44'/194'/0'/0/0").unwrap();
    assert_eq!(same.private_key().unwrap(), node.private_key().unwrap());
}

#[test]
fn test_mnemonic_derivation() {
    let root = KeyNode::from_mnemonic(TEST_MNEMONIC, None).unwrap();
    assert_eq!(root.origin(), KeyOrigin::Seed);

    let first = root.derive_account(0, 0, 0).unwrap();
    assert_eq!(first.private_key().unwrap(), "5K2VtCafACZx6iiN5xyBb67UszFQa6yVLR8UquZU2x6aPmbQnU6");
    assert_eq!(first.public_key(), "EOS6zpSNY1YoLxNt2VsvJjoDfBueU6xC1M1ERJw1UoekL1NHn8KNA");

    let second = root.derive_account(0, 0, 1).unwrap();
    assert_eq!(second.public_key(), "EOS62cPUiWnLqbUjiBMxbEU4pm4Hp5X3RGk4KMTadvZNygjX72yHW");

    let with_passphrase =
        KeyNode::from_mnemonic_with_passphrase(TEST_MNEMONIC, "TREZOR", None).unwrap();
    assert_eq!(
        with_passphrase.derive_account(0, 0, 0).unwrap().public_key(),
        "EOS7YdA9ojvvMHZw2Q3JpADc6sqaKB5s2Zwn1tXwHXHWaavP2dE7k"
    );
}

#[test]
fn test_invalid_mnemonic() {
    let err = KeyNode::from_mnemonic("abandon abandon abandon", None).unwrap_err();
    assert!(err.is(SignerErrorCode::InvalidMnemonic));

    let err = KeyNode::generate_mnemonic(13).unwrap_err();
    assert!(err.is(SignerErrorCode::InvalidMnemonic));
}

#[test]
fn test_generated_mnemonic_is_usable() {
    let words = KeyNode::generate_mnemonic(24).unwrap();
    assert_eq!(words.split_whitespace().count(), 24);
    let node = KeyNode::from_mnemonic(&words, None).unwrap();
    assert!(node.derive_account(0, 0, 0).is_ok());
}

#[test]
fn test_private_key_node_is_terminal() {
    let node = dev_node();
    assert_eq!(node.state(), NodeState::RawKeypair);

    let err = node.derive_path("m/0").unwrap_err();
    assert!(err.is(SignerErrorCode::NotDerivable));
    let err = node.derive_child(0).unwrap_err();
    assert!(err.is(SignerErrorCode::NotDerivable));

    let err = node.public_extended_key().unwrap_err();
    assert!(err.is(SignerErrorCode::KeyUnavailable));
    let err = node.private_extended_key().unwrap_err();
    assert!(err.is(SignerErrorCode::KeyUnavailable));
}

#[test]
fn test_public_only_node() {
    let xpub = seed_node().public_extended_key().unwrap();
    let node = KeyNode::from_extended_key(&xpub, None).unwrap();

    assert_eq!(node.state(), NodeState::ExtendedKeyRooted { private: false });
    assert_eq!(node.public_key(), "EOS7GcpX9L7wA2qFjkhyTakxTkcKt3FZAUwdr5CxcTGWVSREEBq2Q");
    assert_eq!(node.public_extended_key().unwrap(), xpub);

    assert!(node.private_key().unwrap_err().is(SignerErrorCode::KeyUnavailable));
    assert!(node.private_extended_key().unwrap_err().is(SignerErrorCode::KeyUnavailable));
    assert!(node.derive_path("m/0").unwrap_err().is(SignerErrorCode::NotDerivable));
}

#[test]
fn test_invalid_inputs() {
    let err = KeyNode::from_extended_key("xprvnotakey", None).unwrap_err();
    assert!(err.is(SignerErrorCode::InvalidExtendedKey));

    let err = KeyNode::from_seed("not hex", None).unwrap_err();
    assert!(err.is(SignerErrorCode::InvalidSeed));

    let err = seed_node().derive_path("m/44'/x").unwrap_err();
    assert!(err.is(SignerErrorCode::InvalidPath));
}

#[test]
fn test_chain_id_propagates() {
    let testnet =
        ChainId::from_hex("e70aaab8997e1dfce58fbfac80cbbb8fecec7b99cf982a9444273cbc64c41473")
            .unwrap();
    let root = KeyNode::from_seed(TEST_SEED, Some(testnet)).unwrap();
    let leaf = root.derive_account(1, 0, 3).unwrap();
    assert_eq!(leaf.chain_id(), testnet);

    assert_eq!(seed_node().chain_id(), ChainId::mainnet());
}

#[test]
fn test_parent_reusable_across_threads() {
    let root = std::sync::Arc::new(seed_node());
    let handles: Vec<_> = (0..4u32)
        .map(|i| {
            let root = root.clone();
            std::thread::spawn(move || root.derive_account(0, 0, i).unwrap().public_key())
        })
        .collect();
    let keys: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(keys[0], "EOS5DK7HwLcw7aLi78PBcDJP8uLE54dQYAaVX9cDoW57qggM3WtNV");
    assert_eq!(root.depth(), Some(0));
}
