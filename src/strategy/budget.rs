//! 费用估算与预算闸门

use crate::core::executor::{calls, GasEstimate, LedgerClient, SkipReason};
use crate::core::types::{AutomationError, CandidateOperation, ChainProfile, Result};
use ethers::{types::U256, utils::parse_ether};
use log::debug;

/// 默认费用上限：$0.05
pub const DEFAULT_MAX_GAS_COST_USD: f64 = 0.05;

/// Gas 预算
///
/// 原生单位上限只在创建时根据固定价格计算一次，运行中不再重算。
#[derive(Debug, Clone, PartialEq)]
pub struct GasBudget {
    ceiling_usd: f64,
    native_price_usd: f64,
    ceiling_wei: U256,
}

impl GasBudget {
    pub fn new(ceiling_usd: f64, native_price_usd: f64) -> Result<Self> {
        if !(ceiling_usd > 0.0) || !(native_price_usd > 0.0) {
            return Err(AutomationError::ConfigError(format!(
                "gas ceiling (${}) and native price (${}) must be positive",
                ceiling_usd, native_price_usd
            )));
        }

        let ceiling_native = ceiling_usd / native_price_usd;
        let ceiling_wei = parse_ether(format!("{:.18}", ceiling_native))
            .map_err(|e| AutomationError::ConfigError(format!("gas ceiling: {}", e)))?;

        Ok(Self {
            ceiling_usd,
            native_price_usd,
            ceiling_wei,
        })
    }

    pub fn ceiling_usd(&self) -> f64 {
        self.ceiling_usd
    }

    pub fn ceiling_native(&self) -> f64 {
        self.ceiling_usd / self.native_price_usd
    }

    pub fn ceiling_wei(&self) -> U256 {
        self.ceiling_wei
    }
}

/// 估算结果：可以进入闸门，或在估算前就已确定跳过
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Estimation {
    Ready(GasEstimate),
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Skip,
}

pub struct CostEstimator<'a> {
    client: &'a dyn LedgerClient,
    chain: &'a ChainProfile,
}

impl<'a> CostEstimator<'a> {
    pub fn new(client: &'a dyn LedgerClient, chain: &'a ChainProfile) -> Self {
        Self { client, chain }
    }

    /// 查询 gas 单价和预计 gas 用量
    ///
    /// withdraw 先查包装资产余额，余额为0直接跳过，不发起任何 gas 估算请求。
    pub async fn estimate(&self, candidate: &CandidateOperation) -> Result<Estimation> {
        let sender = self.client.address();

        if candidate.kind.requires_balance_check() {
            let balance = self
                .client
                .token_balance(candidate.action.address, sender)
                .await?;
            debug!("{} balance of {:?}: {}", candidate.action.name, sender, balance);
            if balance.is_zero() {
                return Ok(Estimation::Skip(SkipReason::EmptyTokenBalance));
            }
        }

        let fee_price = self.client.fee_price().await?;
        let tx = calls::build_transaction(self.chain, candidate, sender)?;
        let gas_units = self.client.estimate_gas(&tx).await?;

        Ok(Estimation::Ready(GasEstimate { gas_units, fee_price }))
    }
}

/// 预计费用严格大于上限时跳过
pub fn gate(estimate: &GasEstimate, budget: &GasBudget) -> Decision {
    if estimate.cost() > budget.ceiling_wei() {
        Decision::Skip
    } else {
        Decision::Proceed
    }
}
