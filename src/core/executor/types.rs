//! 执行器相关类型定义

use ethers::types::{H256, U256, U64};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gas 估算结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasEstimate {
    pub gas_units: U256,
    pub fee_price: U256,
}

impl GasEstimate {
    /// 预计费用 (wei)
    pub fn cost(&self) -> U256 {
        self.gas_units.saturating_mul(self.fee_price)
    }
}

/// 交易收据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: H256,
    pub status: Option<U64>,
    pub gas_used: U256,
    pub effective_gas_price: U256,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == Some(U64::one())
    }

    /// 实际花费 = gasUsed × effectiveGasPrice
    pub fn realized_cost(&self) -> U256 {
        self.gas_used.saturating_mul(self.effective_gas_price)
    }
}

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 预计费用超过上限
    OverBudget { estimated: U256, ceiling: U256 },
    /// 包装资产余额为0，withdraw 必然回滚
    EmptyTokenBalance,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OverBudget { estimated, ceiling } => {
                write!(f, "estimated cost {} wei exceeds ceiling {} wei", estimated, ceiling)
            }
            SkipReason::EmptyTokenBalance => write!(f, "wrapped balance is zero"),
        }
    }
}

/// 失败分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// 余额 / gas 价格 / gas 估算查询失败
    Estimation,
    /// 上链但执行失败
    Reverted,
    Unclassified,
}

/// 单次迭代结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success { hash: H256, cost: U256 },
    Skipped { reason: SkipReason },
    Failed { class: FailureClass, note: String },
    /// 余额不足，终止整个运行
    FatalAbort { note: String },
}

impl ExecutionOutcome {
    pub fn realized_cost(&self) -> U256 {
        match self {
            ExecutionOutcome::Success { cost, .. } => *cost,
            _ => U256::zero(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecutionOutcome::FatalAbort { .. })
    }
}
