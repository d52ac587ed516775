use crate::core::executor::{
    calls::UNISWAP_V3_ROUTER, classify_receipt, ExecutionOutcome, FailureClass, LedgerClient,
    SkipReason, TransactionExecutor,
};
use crate::core::types::{
    ArgumentShape, AutomationError, CandidateOperation, ChainProfile, ContractAction, Result,
};
use crate::strategy::budget::{gate, CostEstimator, Decision, Estimation, GasBudget};
use crate::strategy::pacing::{BackoffController, SkipPause, Sleeper};
use crate::strategy::selector::{select_candidate, SelectionMode};
use crate::strategy::stats::{RunAccountant, RunSummary};
use crate::utils::coin::{format_native, format_native_with_usd};
use log::{debug, error, info, warn};
use rand::Rng;
use std::sync::Arc;

/// 自动化引擎 - 串行驱动 选择 → 估算/闸门 → 执行 → 记账 → 停顿
pub struct AutomationEngine<R> {
    client: Arc<dyn LedgerClient>,
    sleeper: Arc<dyn Sleeper>,
    executor: TransactionExecutor,
    chain: ChainProfile,
    catalog: Vec<ContractAction>,
    mode: SelectionMode,
    budget: GasBudget,
    skip_pause: SkipPause,
    rng: R,
}

impl<R: Rng> AutomationEngine<R> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Arc<dyn LedgerClient>,
        sleeper: Arc<dyn Sleeper>,
        chain: ChainProfile,
        catalog: Vec<ContractAction>,
        mode: SelectionMode,
        budget: GasBudget,
        skip_pause: SkipPause,
        rng: R,
    ) -> Self {
        Self {
            executor: TransactionExecutor::new(client.clone(), chain.clone()),
            client,
            sleeper,
            chain,
            catalog,
            mode,
            budget,
            skip_pause,
            rng,
        }
    }

    /// 执行 `iterations` 次迭代并返回最终报告
    ///
    /// 只有启动阶段的错误会返回 `Err`；循环开始后总会产出报告。
    pub async fn run(&mut self, iterations: u64) -> Result<RunSummary> {
        if iterations == 0 {
            return Err(AutomationError::ConfigError("iteration count must be positive".to_string()));
        }
        if self.catalog.is_empty() && self.mode == SelectionMode::Catalog {
            return Err(AutomationError::CatalogError("catalog is empty".to_string()));
        }

        let wallet = self.client.address();
        let starting_balance = self.client.get_balance(wallet).await?;
        info!(
            "[BALANCE] {}",
            format_native(starting_balance, &self.chain.native_symbol)
        );
        if starting_balance.is_zero() {
            return Err(AutomationError::EmptyWallet(wallet));
        }

        let mut accountant = RunAccountant::new(iterations);
        let mut pacer = BackoffController::new(iterations, self.skip_pause);
        info!("[RUN] {} started on {}", accountant.run_id(), self.chain.name);

        for iteration in 1..=iterations {
            let outcome = self.run_iteration(iteration, iterations).await;
            accountant.record(&outcome);
            debug!(
                "[STATS] {} succeeded, {} failed, {} wei spent",
                accountant.success_count(),
                accountant.fail_count(),
                accountant.total_realized_cost()
            );

            if let Some(pause) = pacer.after(&outcome, iteration, &mut self.rng) {
                info!("   [PAUSE] {} seconds...", pause.as_secs());
                self.sleeper.sleep(pause).await;
                pacer.resume();
            }

            if pacer.is_finished() {
                debug!("Run finished in state {:?}", pacer.state());
                break;
            }
        }

        let ending_balance = match self.client.get_balance(wallet).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!("Failed to read final balance: {}", e);
                None
            }
        };

        Ok(accountant.finalize(starting_balance, ending_balance))
    }

    async fn run_iteration(&mut self, iteration: u64, total: u64) -> ExecutionOutcome {
        let candidate = match select_candidate(&self.mode, &self.catalog, &mut self.rng) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("   [ERROR] {}", e);
                return ExecutionOutcome::Failed {
                    class: FailureClass::Unclassified,
                    note: e.to_string(),
                };
            }
        };

        info!("==========================================");
        info!("[TX {}/{}] {} on {}", iteration, total, candidate.action.name, self.chain.name);
        info!("   Function: {}", candidate.kind);
        info!(
            "   Amount: {}",
            format_native(candidate.amount, &self.chain.native_symbol)
        );
        match candidate.kind.argument_shape() {
            ArgumentShape::SpenderAmount => info!("   Spender: {:?}", *UNISWAP_V3_ROUTER),
            ArgumentShape::Token => info!("   Token: {:?}", self.chain.wrapped_asset),
            ArgumentShape::None | ArgumentShape::Amount => {}
        }

        let outcome = self.attempt(&candidate).await;
        match &outcome {
            ExecutionOutcome::Success { hash, cost } => {
                info!("   [SUCCESS] Confirmed!");
                info!(
                    "   [COST] Actual: {}",
                    format_native_with_usd(*cost, &self.chain.native_symbol, self.chain.native_price_usd)
                );
                if let Some(link) = self.chain.explorer_link(hash) {
                    info!("   [LINK] {}", link);
                }
            }
            ExecutionOutcome::Skipped { reason } => warn!("   [SKIP] {}", reason),
            ExecutionOutcome::Failed { class, note } => warn!("   [FAIL] {:?}: {}", class, note),
            ExecutionOutcome::FatalAbort { note } => {
                error!("   [ERROR] {}", note);
                error!("   [STOP] Insufficient balance, aborting run");
            }
        }
        outcome
    }

    async fn attempt(&self, candidate: &CandidateOperation) -> ExecutionOutcome {
        let estimator = CostEstimator::new(self.client.as_ref(), &self.chain);
        let estimate = match estimator.estimate(candidate).await {
            Ok(Estimation::Ready(estimate)) => estimate,
            Ok(Estimation::Skip(reason)) => return ExecutionOutcome::Skipped { reason },
            Err(e) => return failure(FailureClass::Estimation, e),
        };

        info!("   [GAS] Estimated: {}", estimate.gas_units);
        info!(
            "   [COST] Estimated: {}",
            format_native_with_usd(estimate.cost(), &self.chain.native_symbol, self.chain.native_price_usd)
        );

        if gate(&estimate, &self.budget) == Decision::Skip {
            return ExecutionOutcome::Skipped {
                reason: SkipReason::OverBudget {
                    estimated: estimate.cost(),
                    ceiling: self.budget.ceiling_wei(),
                },
            };
        }

        match self.executor.execute(candidate, &estimate).await {
            Ok(receipt) => classify_receipt(&receipt),
            Err(e) => failure(FailureClass::Unclassified, e),
        }
    }
}

/// 余额不足升级为致命错误，其余错误在循环内恢复
fn failure(class: FailureClass, err: AutomationError) -> ExecutionOutcome {
    if err.is_insufficient_funds() {
        ExecutionOutcome::FatalAbort { note: err.to_string() }
    } else {
        ExecutionOutcome::Failed { class, note: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::{MockLedgerClient, Receipt};
    use crate::core::types::OperationKind;
    use async_trait::async_trait;
    use ethers::types::{Address, H256, U256, U64};
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const ONE_GWEI: u64 = 1_000_000_000;

    #[derive(Default)]
    struct RecordingSleeper {
        pauses: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn pauses(&self) -> Vec<Duration> {
            self.pauses.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.pauses.lock().unwrap().push(duration);
        }
    }

    fn chain() -> ChainProfile {
        ChainProfile {
            name: "Test Chain".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 8453,
            wrapped_asset: Address::from_low_u64_be(6),
            native_symbol: "ETH".to_string(),
            native_price_usd: 3500.0,
            explorer_tx_url: Some("https://basescan.org/tx/".to_string()),
        }
    }

    fn action(kinds: Vec<OperationKind>) -> ContractAction {
        ContractAction {
            key: "weth".to_string(),
            address: Address::from_low_u64_be(6),
            name: "WETH".to_string(),
            kinds,
            description: String::new(),
        }
    }

    fn receipt(hash: H256, status: u64) -> Receipt {
        Receipt {
            transaction_hash: hash,
            status: Some(U64::from(status)),
            gas_used: U256::from(28_000),
            effective_gas_price: U256::from(ONE_GWEI),
        }
    }

    fn base_client() -> MockLedgerClient {
        let mut client = MockLedgerClient::new();
        client.expect_address().return_const(Address::from_low_u64_be(42));
        client.expect_get_balance().returning(|_| Ok(U256::exp10(18)));
        client
    }

    fn engine(
        client: MockLedgerClient,
        sleeper: Arc<RecordingSleeper>,
        kinds: Vec<OperationKind>,
        budget: GasBudget,
    ) -> AutomationEngine<StdRng> {
        let action = action(kinds);
        AutomationEngine::new(
            Arc::new(client),
            sleeper,
            chain(),
            vec![action.clone()],
            SelectionMode::Single(action),
            budget,
            SkipPause::Activity,
            StdRng::seed_from_u64(2024),
        )
    }

    #[tokio::test]
    async fn test_single_deposit_succeeds() {
        let mut client = base_client();
        client.expect_fee_price().times(1).returning(|| Ok(U256::from(ONE_GWEI)));
        client.expect_estimate_gas().times(1).returning(|_| Ok(U256::from(30_000)));
        client.expect_submit().times(1).returning(|_| Ok(H256::from_low_u64_be(1)));
        client.expect_await_receipt().times(1).returning(|hash| Ok(receipt(hash, 1)));

        let sleeper = Arc::new(RecordingSleeper::default());
        // $0.05 @ $1 => 0.05 ETH ceiling
        let budget = GasBudget::new(0.05, 1.0).unwrap();
        let mut engine = engine(client, sleeper.clone(), vec![OperationKind::Deposit], budget);

        let summary = engine.run(1).await.unwrap();

        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.fail_count, 0);
        assert_eq!(summary.total_realized_cost, U256::from(28_000u64 * ONE_GWEI));
        assert!(summary.total_realized_cost > U256::zero());
        assert!(summary.abort_reason.is_none());
        assert!(sleeper.pauses().is_empty());
    }

    #[tokio::test]
    async fn test_over_budget_never_submits() {
        let mut client = base_client();
        client.expect_fee_price().times(3).returning(|| Ok(U256::from(ONE_GWEI)));
        client.expect_estimate_gas().times(3).returning(|_| Ok(U256::from(10_000_000)));
        client.expect_submit().times(0);
        client.expect_await_receipt().times(0);

        let sleeper = Arc::new(RecordingSleeper::default());
        let budget = GasBudget::new(0.05, 3500.0).unwrap();
        let mut engine = engine(client, sleeper.clone(), vec![OperationKind::Deposit], budget);

        let summary = engine.run(3).await.unwrap();

        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.fail_count, 3);
        assert!(summary.total_realized_cost.is_zero());

        let pauses = sleeper.pauses();
        assert_eq!(pauses.len(), 2);
        assert!(pauses.iter().all(|p| (15..121).contains(&p.as_secs())));
    }

    #[tokio::test]
    async fn test_insufficient_funds_aborts_run() {
        let submissions = Arc::new(AtomicUsize::new(0));
        let counter = submissions.clone();

        let mut client = base_client();
        client.expect_fee_price().returning(|| Ok(U256::from(ONE_GWEI)));
        client.expect_estimate_gas().returning(|_| Ok(U256::from(30_000)));
        client.expect_submit().times(2).returning(move |_| {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(H256::from_low_u64_be(1)),
                _ => Err(AutomationError::RpcError(
                    "sendTransaction: insufficient funds for gas * price + value".to_string(),
                )),
            }
        });
        // 第一笔上链但回滚
        client.expect_await_receipt().times(1).returning(|hash| Ok(receipt(hash, 0)));

        let sleeper = Arc::new(RecordingSleeper::default());
        let budget = GasBudget::new(0.05, 1.0).unwrap();
        let mut engine = engine(client, sleeper.clone(), vec![OperationKind::Deposit], budget);

        let summary = engine.run(5).await.unwrap();

        assert_eq!(submissions.load(Ordering::SeqCst), 2);
        assert_eq!(summary.attempted(), 2);
        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.fail_count, 2);
        assert!(summary.abort_reason.as_deref().unwrap().contains("insufficient funds"));

        // 只有第一次失败后的短停顿，终止时不再停顿
        let pauses = sleeper.pauses();
        assert_eq!(pauses.len(), 1);
        assert!((15..31).contains(&pauses[0].as_secs()));
    }

    #[tokio::test]
    async fn test_insufficient_funds_during_estimation_aborts() {
        let mut client = base_client();
        client.expect_fee_price().times(1).returning(|| Ok(U256::from(ONE_GWEI)));
        client.expect_estimate_gas().times(1).returning(|_| {
            Err(AutomationError::RpcError(
                "estimateGas: insufficient funds for transfer".to_string(),
            ))
        });
        client.expect_submit().times(0);
        client.expect_await_receipt().times(0);

        let sleeper = Arc::new(RecordingSleeper::default());
        let budget = GasBudget::new(0.05, 3500.0).unwrap();
        let mut engine = engine(client, sleeper.clone(), vec![OperationKind::Deposit], budget);

        let summary = engine.run(4).await.unwrap();

        assert_eq!(summary.attempted(), 1);
        assert_eq!(summary.fail_count, 1);
        assert!(summary.abort_reason.is_some());
        assert!(sleeper.pauses().is_empty());
    }

    #[tokio::test]
    async fn test_empty_withdraw_skips_without_estimation() {
        let mut client = base_client();
        client.expect_token_balance().times(1).returning(|_, _| Ok(U256::zero()));
        client.expect_fee_price().times(0);
        client.expect_estimate_gas().times(0);
        client.expect_submit().times(0);

        let sleeper = Arc::new(RecordingSleeper::default());
        let budget = GasBudget::new(0.05, 3500.0).unwrap();
        let mut engine = engine(client, sleeper, vec![OperationKind::Withdraw], budget);

        let summary = engine.run(1).await.unwrap();

        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.fail_count, 1);
    }

    #[tokio::test]
    async fn test_estimation_error_uses_short_pause_and_continues() {
        let mut client = base_client();
        client
            .expect_fee_price()
            .times(3)
            .returning(|| Err(AutomationError::RpcError("gasPrice: 502 Bad Gateway".to_string())));
        client.expect_submit().times(0);

        let sleeper = Arc::new(RecordingSleeper::default());
        let budget = GasBudget::new(0.05, 3500.0).unwrap();
        let mut engine = engine(client, sleeper.clone(), vec![OperationKind::Approve], budget);

        let summary = engine.run(3).await.unwrap();

        assert_eq!(summary.fail_count, 3);
        assert!(summary.abort_reason.is_none());
        let pauses = sleeper.pauses();
        assert_eq!(pauses.len(), 2);
        assert!(pauses.iter().all(|p| (15..31).contains(&p.as_secs())));
    }

    #[tokio::test]
    async fn test_cost_accumulates_only_on_success() {
        let receipts = Arc::new(AtomicUsize::new(0));
        let counter = receipts.clone();

        let mut client = base_client();
        client.expect_fee_price().returning(|| Ok(U256::from(ONE_GWEI)));
        client.expect_estimate_gas().returning(|_| Ok(U256::from(30_000)));
        client.expect_submit().times(4).returning(|_| Ok(H256::random()));
        client.expect_await_receipt().times(4).returning(move |hash| {
            let status = if counter.fetch_add(1, Ordering::SeqCst) % 2 == 0 { 1 } else { 0 };
            Ok(receipt(hash, status))
        });

        let sleeper = Arc::new(RecordingSleeper::default());
        let budget = GasBudget::new(0.05, 1.0).unwrap();
        let mut engine = engine(client, sleeper, vec![OperationKind::Revoke], budget);

        let summary = engine.run(4).await.unwrap();

        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.fail_count, 2);
        assert_eq!(summary.attempted(), 4);
        assert_eq!(summary.total_realized_cost, U256::from(2 * 28_000u64 * ONE_GWEI));
    }

    #[tokio::test]
    async fn test_zero_starting_balance_is_setup_error() {
        let mut client = MockLedgerClient::new();
        client.expect_address().return_const(Address::from_low_u64_be(42));
        client.expect_get_balance().times(1).returning(|_| Ok(U256::zero()));
        client.expect_submit().times(0);

        let sleeper = Arc::new(RecordingSleeper::default());
        let budget = GasBudget::new(0.05, 3500.0).unwrap();
        let mut engine = engine(client, sleeper, vec![OperationKind::Deposit], budget);

        assert!(matches!(engine.run(2).await, Err(AutomationError::EmptyWallet(_))));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_setup_error() {
        let client = MockLedgerClient::new();
        let mut engine = AutomationEngine::new(
            Arc::new(client),
            Arc::new(RecordingSleeper::default()),
            chain(),
            Vec::new(),
            SelectionMode::Catalog,
            GasBudget::new(0.05, 3500.0).unwrap(),
            SkipPause::Activity,
            StdRng::seed_from_u64(1),
        );

        assert!(matches!(engine.run(1).await, Err(AutomationError::CatalogError(_))));
    }
}
