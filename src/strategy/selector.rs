//! 操作选择器

use crate::core::types::{AutomationError, CandidateOperation, ContractAction, Result};
use ethers::types::U256;
use rand::{seq::SliceRandom, Rng};

/// 随机金额下限 0.000001 原生单位 (gwei)
pub const MIN_AMOUNT_GWEI: u64 = 1_000;
/// 随机金额上限 0.000005 原生单位 (gwei)
pub const MAX_AMOUNT_GWEI: u64 = 5_000;

const WEI_PER_GWEI: u64 = 1_000_000_000;

/// 运行模式
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionMode {
    /// 每次从整个目录中随机选择
    Catalog,
    /// 固定一个合约
    Single(ContractAction),
}

/// 选择本次迭代的候选操作
///
/// 先等概率选合约 (与其函数数量无关)，再等概率选函数；金额独立抽取。
pub fn select_candidate<R: Rng + ?Sized>(
    mode: &SelectionMode,
    catalog: &[ContractAction],
    rng: &mut R,
) -> Result<CandidateOperation> {
    let action = match mode {
        SelectionMode::Single(action) => action,
        SelectionMode::Catalog => catalog
            .choose(rng)
            .ok_or_else(|| AutomationError::CatalogError("catalog is empty".to_string()))?,
    };

    let kind = *action.kinds.choose(rng).ok_or_else(|| {
        AutomationError::CatalogError(format!("action '{}' has no callable functions", action.key))
    })?;

    Ok(CandidateOperation {
        action: action.clone(),
        kind,
        amount: random_amount(rng),
    })
}

/// [0.000001, 0.000005] 原生单位内均匀分布，gwei 精度
pub fn random_amount<R: Rng + ?Sized>(rng: &mut R) -> U256 {
    let gwei = rng.gen_range(MIN_AMOUNT_GWEI..=MAX_AMOUNT_GWEI);
    U256::from(gwei) * U256::from(WEI_PER_GWEI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::OperationKind;
    use ethers::types::Address;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashMap;

    fn action(key: &str, kinds: Vec<OperationKind>) -> ContractAction {
        ContractAction {
            key: key.to_string(),
            address: Address::random(),
            name: key.to_uppercase(),
            kinds,
            description: String::new(),
        }
    }

    #[test]
    fn test_single_mode_draws_from_own_kinds() {
        let weth = action("weth", vec![OperationKind::Deposit, OperationKind::Withdraw]);
        let mode = SelectionMode::Single(weth.clone());
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let candidate = select_candidate(&mode, &[], &mut rng).unwrap();
            assert_eq!(candidate.action, weth);
            assert!(weth.kinds.contains(&candidate.kind));
        }
    }

    #[test]
    fn test_catalog_mode_is_uniform_per_action() {
        // 一个合约有 1 个函数，另一个有 5 个：两者被选中的概率仍应接近
        let catalog = vec![
            action("weth", vec![OperationKind::Deposit]),
            action(
                "uniswap",
                vec![
                    OperationKind::RefundEth,
                    OperationKind::ApproveMax,
                    OperationKind::ApproveMaxMinusOne,
                    OperationKind::ApproveZeroThenMax,
                    OperationKind::ApproveZeroThenMaxMinusOne,
                ],
            ),
        ];
        let mut rng = StdRng::seed_from_u64(42);
        let mut hits: HashMap<String, usize> = HashMap::new();

        for _ in 0..4_000 {
            let candidate = select_candidate(&SelectionMode::Catalog, &catalog, &mut rng).unwrap();
            *hits.entry(candidate.action.key).or_default() += 1;
        }

        let weth = hits["weth"] as f64 / 4_000.0;
        assert!((0.45..0.55).contains(&weth), "weth share {}", weth);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let catalog = vec![
            action("a", vec![OperationKind::Deposit, OperationKind::Approve]),
            action("b", vec![OperationKind::Revoke]),
        ];
        let mut first = StdRng::seed_from_u64(99);
        let mut second = StdRng::seed_from_u64(99);

        for _ in 0..20 {
            let x = select_candidate(&SelectionMode::Catalog, &catalog, &mut first).unwrap();
            let y = select_candidate(&SelectionMode::Catalog, &catalog, &mut second).unwrap();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_amount_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let min = U256::from(1_000_000_000_000u64);
        let max = U256::from(5_000_000_000_000u64);

        for _ in 0..1_000 {
            let amount = random_amount(&mut rng);
            assert!(amount >= min && amount <= max);
        }
    }

    #[test]
    fn test_empty_inputs_are_errors() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(select_candidate(&SelectionMode::Catalog, &[], &mut rng).is_err());

        let empty = SelectionMode::Single(action("x", vec![]));
        assert!(select_candidate(&empty, &[], &mut rng).is_err());
    }
}
