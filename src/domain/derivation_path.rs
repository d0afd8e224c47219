//! BIP32 派生路径解析与 BIP44 标准路径
//!
//! 路径相对于当前节点解析：前导 `m` 可选，`'`、`h`、`H` 均表示硬化索引

use bitcoin::bip32::{ChildNumber, DerivationPath};

use crate::domain::chain_config::COIN_TYPE;
use crate::error::{Result, SignerError};

/// 标准账户路径：m/44'/194'/account'/change/index
pub fn bip44_path(account: u32, change: u32, index: u32) -> String {
    format!("m/44'/{}'/{}'/{}/{}", COIN_TYPE, account, change, index)
}

/// 解析路径字符串
pub fn parse_path(path: &str) -> Result<DerivationPath> {
    let path = path.trim();
    if path.is_empty() {
        return Err(SignerError::invalid_path("Derivation path is empty"));
    }

    let mut children = Vec::new();
    for (i, component) in path.split('/').enumerate() {
        if i == 0 && (component == "m" || component == "M") {
            continue;
        }
        children.push(parse_component(path, component)?);
    }

    Ok(DerivationPath::from(children))
}

fn parse_component(path: &str, component: &str) -> Result<ChildNumber> {
    let (digits, hardened) = match component.strip_suffix(['\'', 'h', 'H']) {
        Some(digits) => (digits, true),
        None => (component, false),
    };

    let index = digits.parse::<u32>().map_err(|_| {
        SignerError::invalid_path(format!(
            "Invalid component '{}' in path '{}'",
            component, path
        ))
    })?;

    let child = if hardened {
        ChildNumber::from_hardened_idx(index)
    } else {
        ChildNumber::from_normal_idx(index)
    };
    child.map_err(|_| {
        SignerError::invalid_path(format!(
            "Index {} in path '{}' must be below 2^31",
            index, path
        ))
    })
}

/// 校验绝对路径是否遵循本链的 BIP44 约定
///
/// # 返回
/// - Ok(true): 路径为 m/44'/194'/…
/// - Ok(false): 格式正确但 purpose 或 coin type 不同
/// - Err: 路径格式错误
pub fn is_standard_path(path: &str) -> Result<bool> {
    let parsed = parse_path(path)?;
    let components: &[ChildNumber] = parsed.as_ref();

    let expected = [
        ChildNumber::Hardened { index: 44 },
        ChildNumber::Hardened { index: COIN_TYPE },
    ];
    Ok(components.len() >= 2 && components[..2] == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignerErrorCode;

    #[test]
    fn test_parse_standard_path() {
        let path = parse_path("m/44'/194'/0'/0/0").unwrap();
        let components: &[ChildNumber] = path.as_ref();
        assert_eq!(components.len(), 5);
        assert_eq!(components[0], ChildNumber::Hardened { index: 44 });
        assert_eq!(components[1], ChildNumber::Hardened { index: 194 });
        assert_eq!(components[4], ChildNumber::Normal { index: 0 });
    }

    #[test]
    fn test_hardened_markers() {
        let a = parse_path("m/44'/194'/0'").unwrap();
        let b = parse_path("m/44h/194H/0h").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_relative_and_root_paths() {
        let root = parse_path("m").unwrap();
        let root: &[ChildNumber] = root.as_ref();
        assert!(root.is_empty());

        let relative = parse_path("0/1").unwrap();
        let relative: &[ChildNumber] = relative.as_ref();
        assert_eq!(relative.len(), 2);
    }

    #[test]
    fn test_invalid_paths() {
        for bad in ["", "m/", "m/abc", "m/2147483648", "m/0/m", "m//0"] {
            let err = parse_path(bad).unwrap_err();
            assert!(err.is(SignerErrorCode::InvalidPath), "{}", bad);
        }
    }

    #[test]
    fn test_standard_path_detection() {
        assert!(is_standard_path(&bip44_path(0, 0, 0)).unwrap());
        assert!(is_standard_path("m/44'/194'/3'/1/9").unwrap());
        assert!(!is_standard_path("m/44'/60'/0'/0/0").unwrap());
        assert!(!is_standard_path("m/0").unwrap());
        assert!(is_standard_path("m/x").is_err());
    }
}
