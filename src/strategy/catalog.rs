//! 链与合约操作目录

use crate::core::types::{AutomationError, ChainProfile, ContractAction, OperationKind, Result};
use crate::core::executor::calls::UNISWAP_V3_ROUTER;
use crate::strategy::selector::SelectionMode;
use ethers::types::Address;
use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;

/// 支持的链
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedChain {
    Base,
    HyperEvm,
}

impl FromStr for SupportedChain {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "base" | "1" => Ok(SupportedChain::Base),
            "hyperevm" | "hyper-evm" | "2" => Ok(SupportedChain::HyperEvm),
            other => Err(AutomationError::ConfigError(format!("Unsupported chain: {}", other))),
        }
    }
}

impl fmt::Display for SupportedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportedChain::Base => write!(f, "Base Mainnet"),
            SupportedChain::HyperEvm => write!(f, "HyperEVM"),
        }
    }
}

/// Base WETH
static BASE_WETH: Lazy<Address> = Lazy::new(|| {
    "0x4200000000000000000000000000000000000006"
        .parse()
        .expect("WETH address is valid")
});

/// HyperEVM WHYPE
static HYPEREVM_WHYPE: Lazy<Address> = Lazy::new(|| {
    "0x5555555555555555555555555555555555555555"
        .parse()
        .expect("WHYPE address is valid")
});

impl SupportedChain {
    pub fn profile(&self) -> ChainProfile {
        match self {
            SupportedChain::Base => ChainProfile {
                name: self.to_string(),
                rpc_url: "https://mainnet.base.org".to_string(),
                chain_id: 8453,
                wrapped_asset: *BASE_WETH,
                native_symbol: "ETH".to_string(),
                native_price_usd: 3500.0,
                explorer_tx_url: Some("https://basescan.org/tx/".to_string()),
            },
            SupportedChain::HyperEvm => ChainProfile {
                name: self.to_string(),
                rpc_url: "https://rpc.hyperliquid.xyz/evm".to_string(),
                chain_id: 999,
                wrapped_asset: *HYPEREVM_WHYPE,
                native_symbol: "HYPE".to_string(),
                native_price_usd: 35.0,
                explorer_tx_url: Some("https://hyperevmscan.io/tx/".to_string()),
            },
        }
    }

    /// 该链可用的合约操作
    pub fn contract_actions(&self) -> Vec<ContractAction> {
        let wrapped_kinds = vec![
            OperationKind::Deposit,
            OperationKind::Withdraw,
            OperationKind::Approve,
            OperationKind::Revoke,
        ];
        let profile = self.profile();

        match self {
            SupportedChain::Base => vec![
                ContractAction {
                    key: "weth".to_string(),
                    address: profile.wrapped_asset,
                    name: "WETH (Wrapped ETH)".to_string(),
                    kinds: wrapped_kinds,
                    description: "Wrap/Unwrap ETH + approve/revoke".to_string(),
                },
                ContractAction {
                    key: "uniswap".to_string(),
                    address: *UNISWAP_V3_ROUTER,
                    name: "Uniswap V3 Router".to_string(),
                    kinds: vec![
                        OperationKind::RefundEth,
                        OperationKind::ApproveMax,
                        OperationKind::ApproveMaxMinusOne,
                        OperationKind::ApproveZeroThenMax,
                        OperationKind::ApproveZeroThenMaxMinusOne,
                    ],
                    description: "Uniswap V3 - refund ETH + approve functions".to_string(),
                },
            ],
            SupportedChain::HyperEvm => vec![ContractAction {
                key: "whype".to_string(),
                address: profile.wrapped_asset,
                name: "WHYPE (Wrapped HYPE)".to_string(),
                kinds: wrapped_kinds,
                description: "Wrap/Unwrap HYPE + approve/revoke".to_string(),
            }],
        }
    }
}

/// 解析运行模式：`catalog` 或者某个操作的 key
pub fn resolve_mode(mode: &str, actions: &[ContractAction]) -> Result<SelectionMode> {
    if actions.is_empty() {
        return Err(AutomationError::CatalogError("catalog is empty".to_string()));
    }

    let mode = mode.trim();
    if mode.eq_ignore_ascii_case("catalog") || mode.eq_ignore_ascii_case("multi") {
        return Ok(SelectionMode::Catalog);
    }

    let action = actions
        .iter()
        .find(|action| action.key.eq_ignore_ascii_case(mode))
        .ok_or_else(|| {
            let keys: Vec<&str> = actions.iter().map(|a| a.key.as_str()).collect();
            AutomationError::CatalogError(format!(
                "unknown action '{}', expected 'catalog' or one of {:?}",
                mode, keys
            ))
        })?;

    if action.kinds.is_empty() {
        return Err(AutomationError::CatalogError(format!(
            "action '{}' has no callable functions",
            action.key
        )));
    }

    Ok(SelectionMode::Single(action.clone()))
}
