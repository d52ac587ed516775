//! 交易执行器
//!
//! 严格串行：每次提交后阻塞等待收据，下一笔交易不会在上一笔收据之前发出。

use super::{
    calls,
    traits::LedgerClient,
    types::{ExecutionOutcome, FailureClass, GasEstimate, Receipt},
};
use crate::core::types::{CandidateOperation, ChainProfile, Result};
use log::info;
use std::sync::Arc;

pub struct TransactionExecutor {
    client: Arc<dyn LedgerClient>,
    chain: ChainProfile,
}

impl TransactionExecutor {
    pub fn new(client: Arc<dyn LedgerClient>, chain: ChainProfile) -> Self {
        Self { client, chain }
    }

    /// 以估算的 gas 作为显式 gas limit 提交，然后等待收据
    pub async fn execute(&self, candidate: &CandidateOperation, estimate: &GasEstimate) -> Result<Receipt> {
        let mut tx = calls::build_transaction(&self.chain, candidate, self.client.address())?;
        tx.set_gas(estimate.gas_units);

        let hash = self.client.submit(tx).await?;
        info!("   [SENT] Hash: {:?}", hash);
        info!("   [WAIT] Confirmation...");

        self.client.await_receipt(hash).await
    }
}

/// 收据分类：status=1 计入成功和实际费用，其余一律失败且费用为0
pub fn classify_receipt(receipt: &Receipt) -> ExecutionOutcome {
    if receipt.succeeded() {
        ExecutionOutcome::Success {
            hash: receipt.transaction_hash,
            cost: receipt.realized_cost(),
        }
    } else {
        ExecutionOutcome::Failed {
            class: FailureClass::Reverted,
            note: format!(
                "{:?} finalized with status {:?}",
                receipt.transaction_hash, receipt.status
            ),
        }
    }
}
