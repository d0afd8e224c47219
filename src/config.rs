//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::chain_config::ChainConfig;

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub resources: ResourceDefaults,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 注册账户时的默认资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefaults {
    /// 购买的 RAM 字节数
    pub ram_bytes: u32,
    /// 抵押 CPU 数量（原生代币单位）
    pub stake_cpu: Decimal,
    /// 抵押 NET 数量（原生代币单位）
    pub stake_net: Decimal,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// 交易构建器配置：链参数 + 资源默认值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub resources: ResourceDefaults,
}

impl ResourceDefaults {
    pub const RAM_BYTES: u32 = 4000;
    pub const STAKE_AMOUNT: i64 = 1000;
}

impl ResourceDefaults {
    /// 读取 `DEFAULT_RAM_BYTES`、`DEFAULT_STAKE_CPU`、`DEFAULT_STAKE_NET`，缺失或无效时取内置常量
    pub fn from_env() -> Self {
        Self {
            ram_bytes: std::env::var("DEFAULT_RAM_BYTES")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .filter(|&v: &u32| v > 0)
                .unwrap_or(Self::RAM_BYTES),
            stake_cpu: std::env::var("DEFAULT_STAKE_CPU")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(|| Decimal::from(Self::STAKE_AMOUNT)),
            stake_net: std::env::var("DEFAULT_STAKE_NET")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(|| Decimal::from(Self::STAKE_AMOUNT)),
        }
    }
}

impl Default for ResourceDefaults {
    fn default() -> Self {
        Self {
            ram_bytes: Self::RAM_BYTES,
            stake_cpu: Decimal::from(Self::STAKE_AMOUNT),
            stake_net: Decimal::from(Self::STAKE_AMOUNT),
        }
    }
}

impl LoggingConfig {
    /// 读取 `LOG_LEVEL`、`LOG_FORMAT`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or(defaults.level),
            format: std::env::var("LOG_FORMAT").unwrap_or(defaults.format),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            resources: ResourceDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置（先读取 .env）
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(Self {
            chain: ChainConfig::from_env(),
            resources: ResourceDefaults::from_env(),
            logging: LoggingConfig::from_env(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                // 文件中缺失的段落取内置默认值
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if self.chain.key_prefix.trim().is_empty() {
            anyhow::bail!("KEY_PREFIX must not be empty");
        }

        if self.resources.ram_bytes == 0 {
            anyhow::bail!("DEFAULT_RAM_BYTES must be greater than 0");
        }

        // 抵押数量需能以原生精度表示
        for (name, value) in [
            ("DEFAULT_STAKE_CPU", self.resources.stake_cpu),
            ("DEFAULT_STAKE_NET", self.resources.stake_net),
        ] {
            crate::domain::asset::Asset::from_decimal(value, &self.chain.symbol)
                .with_context(|| format!("{} is not a valid {} amount", name, self.chain.symbol))?;
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }

    /// 构建器所需部分
    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            chain: self.chain.clone(),
            resources: self.resources.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::domain::chain_config::{ChainId, MAINNET_CHAIN_ID};

    #[test]
    fn test_config_from_env() {
        let config = Config::from_env().unwrap();
        assert!(config.resources.ram_bytes > 0);
        assert!(!config.chain.key_prefix.is_empty());
    }

    #[test]
    fn test_defaults_are_constants() {
        let config = Config::default();
        assert_eq!(config.chain, ChainConfig::mainnet());
        assert_eq!(config.resources.ram_bytes, ResourceDefaults::RAM_BYTES);
        assert_eq!(config.resources.stake_cpu, Decimal::from(1000));
        assert_eq!(config.resources.stake_net, Decimal::from(1000));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[chain]
chain_id = "{}"
symbol = "4,SYS"
key_prefix = "EOS"

[resources]
ram_bytes = 8192
stake_cpu = "0.5"
stake_net = "0.25"

[logging]
level = "debug"
format = "json"
"#,
            MAINNET_CHAIN_ID
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.chain.chain_id, ChainId::mainnet());
        assert_eq!(config.chain.symbol.code(), "SYS");
        assert_eq!(config.resources.ram_bytes, 8192);
        assert_eq!(config.resources.stake_cpu, "0.5".parse::<Decimal>().unwrap());
        assert_eq!(config.logging.format, "json");
        assert!(config.validate().is_ok());

        let builder = config.builder_config();
        assert_eq!(builder.resources.ram_bytes, 8192);
    }

    #[test]
    fn test_config_from_missing_file_uses_env() {
        let config =
            Config::from_env_and_file(Some("/nonexistent/ironsign.toml")).unwrap();
        assert!(config.resources.ram_bytes > 0);
    }

    #[test]
    fn test_config_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[resources\nram_bytes = ").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.logging = LoggingConfig {
            level: "info".into(),
            format: "text".into(),
        };
        config.resources = ResourceDefaults {
            ram_bytes: 4000,
            stake_cpu: Decimal::from(1000),
            stake_net: Decimal::from(1000),
        };
        config.chain = ChainConfig::mainnet();
        assert!(config.validate().is_ok());

        config.logging.format = "xml".into();
        assert!(config.validate().is_err());
        config.logging.format = "text".into();

        config.resources.stake_net = "0.00001".parse().unwrap();
        assert!(config.validate().is_err());
        config.resources.stake_net = Decimal::from(1);

        config.resources.ram_bytes = 0;
        assert!(config.validate().is_err());
    }
}
