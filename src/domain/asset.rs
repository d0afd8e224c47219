//! 资产数量
//!
//! 规范文本形式为定点小数加符号，例如 `1.0000 EOS`

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::abi::{AbiEncode, AbiWriter};
use crate::error::{Result, SignerError};

/// 未显式给出精度时使用的精度
pub const DEFAULT_PRECISION: u8 = 4;
/// 原生代币代码
pub const NATIVE_SYMBOL_CODE: &str = "EOS";
/// 链上支持的最大精度
pub const MAX_PRECISION: u8 = 18;

/// 代币符号：代码 + 精度
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    precision: u8,
    code: String,
}

impl Symbol {
    pub fn new(precision: u8, code: &str) -> Result<Self> {
        if precision > MAX_PRECISION {
            return Err(SignerError::invalid_symbol(format!(
                "Precision {} exceeds maximum {}",
                precision, MAX_PRECISION
            )));
        }
        if code.is_empty() || code.len() > 7 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(SignerError::invalid_symbol(format!(
                "Symbol code '{}' must be 1-7 uppercase letters",
                code
            )));
        }
        Ok(Self {
            precision,
            code: code.to_string(),
        })
    }

    /// 原生代币 `4,EOS`
    pub fn native() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            code: NATIVE_SYMBOL_CODE.to_string(),
        }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// 解析调用方给出的符号
    ///
    /// - 未给出：使用链原生符号
    /// - 仅代码且与原生代码相同：沿用原生精度
    /// - 仅代码：精度取 [`DEFAULT_PRECISION`]
    /// - `精度,代码`：显式精度
    pub fn resolve(input: Option<&str>, native: &Symbol) -> Result<Self> {
        match input.map(str::trim) {
            None | Some("") => Ok(native.clone()),
            Some(s) if !s.contains(',') && s == native.code => Ok(native.clone()),
            Some(s) => s.parse(),
        }
    }

    /// 链上 u64 表示：低字节为精度，其后为代码字符
    pub fn raw(&self) -> u64 {
        self.code
            .bytes()
            .enumerate()
            .fold(self.precision as u64, |acc, (i, b)| {
                acc | ((b as u64) << (8 * (i + 1)))
            })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl FromStr for Symbol {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once(',') {
            Some((precision, code)) => {
                let precision = precision.trim().parse::<u8>().map_err(|_| {
                    SignerError::invalid_symbol(format!("Invalid precision in symbol '{}'", s))
                })?;
                Symbol::new(precision, code.trim())
            }
            None => Symbol::new(DEFAULT_PRECISION, s),
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 资产：最小单位数量 + 符号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    amount: i64,
    symbol: Symbol,
}

impl Asset {
    /// 十进制数量转换为资产
    ///
    /// 拒绝负数、小数位超过精度以及超出 i64 范围的数量
    pub fn from_decimal(value: Decimal, symbol: &Symbol) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(SignerError::invalid_amount(format!(
                "Amount must not be negative: {}",
                value
            )));
        }

        let precision = symbol.precision as u32;
        let mut scaled = value.normalize();
        if scaled.scale() > precision {
            return Err(SignerError::invalid_amount(format!(
                "Amount {} has more than {} decimal places for {}",
                value, precision, symbol.code
            )));
        }
        scaled.rescale(precision);
        if scaled.scale() != precision {
            return Err(SignerError::invalid_amount(format!(
                "Amount {} is out of range",
                value
            )));
        }

        let amount = i64::try_from(scaled.mantissa().abs()).map_err(|_| {
            SignerError::invalid_amount(format!("Amount {} is out of range", value))
        })?;

        Ok(Self {
            amount,
            symbol: symbol.clone(),
        })
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.symbol.precision as usize;
        let divisor = 10i128.pow(precision as u32);
        let amount = self.amount as i128;
        let whole = amount / divisor;

        if precision == 0 {
            write!(f, "{} {}", whole, self.symbol.code)
        } else {
            let fraction = amount % divisor;
            write!(
                f,
                "{}.{:0width$} {}",
                whole,
                fraction,
                self.symbol.code,
                width = precision
            )
        }
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl AbiEncode for Asset {
    fn encode(&self, writer: &mut AbiWriter) {
        writer.write_i64(self.amount);
        writer.write_u64(self.symbol.raw());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignerErrorCode;

    fn eos() -> Symbol {
        Symbol::native()
    }

    #[test]
    fn test_integer_amount() {
        let asset = Asset::from_decimal(Decimal::from(1), &eos()).unwrap();
        assert_eq!(asset.to_string(), "1.0000 EOS");
        assert_eq!(asset.amount(), 10_000);
    }

    #[test]
    fn test_fractional_amount() {
        let asset = Asset::from_decimal("0.1".parse().unwrap(), &eos()).unwrap();
        assert_eq!(asset.to_string(), "0.1000 EOS");

        let asset = Asset::from_decimal("12.34560".parse().unwrap(), &eos()).unwrap();
        assert_eq!(asset.to_string(), "12.3456 EOS");
    }

    #[test]
    fn test_negative_rejected() {
        let err = Asset::from_decimal(Decimal::from(-1), &eos()).unwrap_err();
        assert!(err.is(SignerErrorCode::InvalidAmount));
    }

    #[test]
    fn test_precision_exceeded() {
        let err = Asset::from_decimal("0.00001".parse().unwrap(), &eos()).unwrap_err();
        assert!(err.is(SignerErrorCode::InvalidAmount));
    }

    #[test]
    fn test_zero_precision() {
        let symbol: Symbol = "0,VOTE".parse().unwrap();
        let asset = Asset::from_decimal(Decimal::from(42), &symbol).unwrap();
        assert_eq!(asset.to_string(), "42 VOTE");

        let err = Asset::from_decimal("1.5".parse().unwrap(), &symbol).unwrap_err();
        assert!(err.is(SignerErrorCode::InvalidAmount));
    }

    #[test]
    fn test_symbol_resolution() {
        let native = eos();
        assert_eq!(Symbol::resolve(None, &native).unwrap(), native);
        assert_eq!(Symbol::resolve(Some("EOS"), &native).unwrap(), native);

        let custom = Symbol::resolve(Some("8,BTC"), &native).unwrap();
        assert_eq!(custom.precision(), 8);
        assert_eq!(custom.code(), "BTC");

        let implied = Symbol::resolve(Some("SYS"), &native).unwrap();
        assert_eq!(implied.precision(), DEFAULT_PRECISION);
    }

    #[test]
    fn test_invalid_symbols() {
        for bad in ["eos", "TOOLONGX", "", "x,EOS", "19,EOS"] {
            let err = bad.parse::<Symbol>().unwrap_err();
            assert!(err.is(SignerErrorCode::InvalidSymbol), "{}", bad);
        }
    }

    #[test]
    fn test_abi_encoding() {
        let asset = Asset::from_decimal(Decimal::from(1), &eos()).unwrap();
        let bytes = crate::abi::pack(&asset);
        assert_eq!(
            hex::encode(bytes),
            "102700000000000004454f5300000000"
        );
    }
}
