use crate::core::types::{AutomationError, Result};
use crate::strategy::budget::DEFAULT_MAX_GAS_COST_USD;
use crate::strategy::catalog::SupportedChain;
use crate::strategy::pacing::SkipPause;
use crate::utils::validation::{is_valid_private_key, is_valid_rpc_url};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// 报告输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// 通过 `FromStr` 解析枚举值，与命令行别名保持一致
fn parse_str<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

fn default_mode() -> String {
    "catalog".to_string()
}

fn default_max_gas_cost_usd() -> f64 {
    DEFAULT_MAX_GAS_COST_USD
}

/// 完整的应用配置
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// 目标链
    #[serde(deserialize_with = "parse_str")]
    pub chain: SupportedChain,
    /// 私钥 (从环境变量读取)
    pub private_key: String,
    /// `catalog` 或单个合约 key
    #[serde(default = "default_mode")]
    pub mode: String,
    /// 交易次数
    pub iterations: u64,
    /// 覆盖默认RPC
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default, deserialize_with = "parse_str")]
    pub skip_pause: SkipPause,
    #[serde(default)]
    pub report_format: ReportFormat,
    /// 费用上限 (美元)
    #[serde(default = "default_max_gas_cost_usd")]
    pub max_gas_cost_usd: f64,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("chain", &self.chain)
            .field("private_key", &"<redacted>")
            .field("mode", &self.mode)
            .field("iterations", &self.iterations)
            .field("rpc_url", &self.rpc_url)
            .field("skip_pause", &self.skip_pause)
            .field("report_format", &self.report_format)
            .field("max_gas_cost_usd", &self.max_gas_cost_usd)
            .finish()
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 从 `.env`、可选的 `automation.toml` 和环境变量加载配置，环境变量优先
    pub fn load() -> Result<AppConfig> {
        dotenv::dotenv().ok(); // 加载.env文件，如果存在的话

        let builder = Config::builder()
            .add_source(File::with_name("automation").required(false))
            .add_source(Environment::default());

        Self::load_from(builder)
    }

    pub fn load_from(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// 验证配置的有效性
    fn validate_config(config: &AppConfig) -> Result<()> {
        if !is_valid_private_key(&config.private_key) {
            return Err(AutomationError::ConfigError("Invalid private key format".to_string()));
        }

        if config.iterations == 0 {
            return Err(AutomationError::ConfigError("ITERATIONS must be greater than 0".to_string()));
        }

        if let Some(rpc_url) = &config.rpc_url {
            if !is_valid_rpc_url(rpc_url) {
                return Err(AutomationError::ConfigError(format!("Invalid RPC_URL: {}", rpc_url)));
            }
        }

        if !(config.max_gas_cost_usd > 0.0) {
            return Err(AutomationError::ConfigError(
                "MAX_GAS_COST_USD must be positive".to_string(),
            ));
        }

        if config.mode.trim().is_empty() {
            return Err(AutomationError::ConfigError("MODE cannot be empty".to_string()));
        }

        Ok(())
    }

    /// 打印配置摘要 (不包含敏感信息)
    pub fn print_config_summary(config: &AppConfig) {
        log::info!("=== Configuration ===");
        log::info!("Chain: {}", config.chain);
        if let Some(rpc_url) = &config.rpc_url {
            log::info!("RPC URL: {}", rpc_url);
        }
        log::info!("Mode: {}", config.mode);
        log::info!("Iterations: {}", config.iterations);
        log::info!("Gas ceiling: ${}", config.max_gas_cost_usd);
        log::info!("Skip pause: {:?}", config.skip_pause);
        log::info!("=====================");
    }
}
