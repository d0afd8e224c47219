//! 账户名 / 动作名编码
//!
//! 链上名称为 64 位整数：前 12 个字符各占 5 位，第 13 个字符占低 4 位

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SignerError};

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// 名称最大长度
pub const MAX_NAME_LEN: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name(u64);

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl Name {
    /// 空名称（如投票时的 proxy 字段）
    pub const EMPTY: Name = Name(0);

    pub const fn from_raw(value: u64) -> Self {
        Name(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// 解析并校验名称
    ///
    /// 拒绝非法字符、超长名称、第 13 位超出 `.1-5a-j` 以及末尾的 `.`
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() > MAX_NAME_LEN {
            return Err(SignerError::invalid_account_name(format!(
                "Name '{}' is longer than {} characters",
                s, MAX_NAME_LEN
            )));
        }

        let mut value = 0u64;
        for (i, c) in s.bytes().enumerate() {
            let symbol = char_to_symbol(c).ok_or_else(|| {
                SignerError::invalid_account_name(format!(
                    "Name '{}' contains invalid character '{}'",
                    s, c as char
                ))
            })?;

            if i < 12 {
                value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
            } else {
                if symbol > 0x0f {
                    return Err(SignerError::invalid_account_name(format!(
                        "Thirteenth character of '{}' must be one of .1-5a-j",
                        s
                    )));
                }
                value |= symbol;
            }
        }

        let name = Name(value);
        if name.to_string() != s {
            return Err(SignerError::invalid_account_name(format!(
                "Name '{}' is not in canonical form",
                s
            )));
        }
        Ok(name)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = [b'.'; MAX_NAME_LEN];
        let mut tmp = self.0;
        for i in 0..MAX_NAME_LEN {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            chars[MAX_NAME_LEN - 1 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }

        let end = chars
            .iter()
            .rposition(|&c| c != b'.')
            .map(|p| p + 1)
            .unwrap_or(0);
        // CHARMAP 全为 ASCII
        f.write_str(std::str::from_utf8(&chars[..end]).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for Name {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self> {
        Name::parse(s)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Name::parse(&s).map_err(serde::de::Error::custom)
    }
}
