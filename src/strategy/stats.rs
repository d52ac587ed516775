//! 运行统计

use crate::core::executor::ExecutionOutcome;
use crate::core::types::ChainProfile;
use crate::utils::coin::{format_native, format_native_with_usd};
use chrono::{DateTime, Utc};
use ethers::types::U256;
use log::info;
use serde::Serialize;
use uuid::Uuid;

/// 最终运行报告
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub requested: u64,
    pub success_count: u64,
    pub fail_count: u64,
    /// 成功交易的实际 gas 花费 (wei)
    pub total_realized_cost: U256,
    pub starting_balance: U256,
    /// 结束时查询失败则为空
    pub ending_balance: Option<U256>,
    pub abort_reason: Option<String>,
}

impl RunSummary {
    pub fn attempted(&self) -> u64 {
        self.success_count + self.fail_count
    }

    pub fn aborted(&self) -> bool {
        self.abort_reason.is_some()
    }

    /// 打印最终报告
    pub fn log_report(&self, chain: &ChainProfile) {
        let symbol = chain.native_symbol.as_str();

        info!("===========================================");
        info!("            FINAL SUMMARY                  ");
        info!("===========================================");
        info!("[RUN] {}", self.run_id);
        info!("[SUCCESS] {}/{}", self.success_count, self.requested);
        info!("[FAIL] {}/{}", self.fail_count, self.requested);
        if self.aborted() {
            info!(
                "[STOP] Aborted after {} iterations: {}",
                self.attempted(),
                self.abort_reason.as_deref().unwrap_or_default()
            );
        }
        info!("[BALANCE] Initial: {}", format_native(self.starting_balance, symbol));
        match self.ending_balance {
            Some(balance) => info!("[BALANCE] Final: {}", format_native(balance, symbol)),
            None => info!("[BALANCE] Final: unavailable"),
        }
        info!(
            "[USED] Gas total: {}",
            format_native_with_usd(self.total_realized_cost, symbol, chain.native_price_usd)
        );
        info!(
            "[TIME] {}s",
            (self.finished_at - self.started_at).num_seconds()
        );
    }
}

/// 运行记账
///
/// 每次迭代恰好记录一次；跳过和失败都计入失败数，只有成功累加费用。
#[derive(Debug, Clone)]
pub struct RunAccountant {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    requested: u64,
    success_count: u64,
    fail_count: u64,
    total_realized_cost: U256,
    abort_reason: Option<String>,
}

impl RunAccountant {
    pub fn new(requested: u64) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            requested,
            success_count: 0,
            fail_count: 0,
            total_realized_cost: U256::zero(),
            abort_reason: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn record(&mut self, outcome: &ExecutionOutcome) {
        if outcome.is_success() {
            self.success_count += 1;
            self.total_realized_cost = self.total_realized_cost.saturating_add(outcome.realized_cost());
            return;
        }

        self.fail_count += 1;
        if let ExecutionOutcome::FatalAbort { note } = outcome {
            self.abort_reason = Some(note.clone());
        }
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn fail_count(&self) -> u64 {
        self.fail_count
    }

    pub fn total_realized_cost(&self) -> U256 {
        self.total_realized_cost
    }

    /// 循环结束后调用一次
    pub fn finalize(self, starting_balance: U256, ending_balance: Option<U256>) -> RunSummary {
        RunSummary {
            run_id: self.run_id.to_string(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            requested: self.requested,
            success_count: self.success_count,
            fail_count: self.fail_count,
            total_realized_cost: self.total_realized_cost,
            starting_balance,
            ending_balance,
            abort_reason: self.abort_reason,
        }
    }
}
