use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 链配置
///
/// 整个运行期间不可变，启动时选定一次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainProfile {
    pub name: String,
    pub rpc_url: String,
    pub chain_id: u64,
    /// 包装资产合约 (WETH / WHYPE)
    pub wrapped_asset: Address,
    pub native_symbol: String,
    /// 原生资产的固定美元价格，运行期间不更新
    pub native_price_usd: f64,
    /// 区块浏览器交易链接前缀
    pub explorer_tx_url: Option<String>,
}

impl ChainProfile {
    pub fn explorer_link(&self, hash: &ethers::types::H256) -> Option<String> {
        self.explorer_tx_url
            .as_ref()
            .map(|prefix| format!("{}{:?}", prefix, hash))
    }
}

/// 调用参数形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentShape {
    None,
    Amount,
    SpenderAmount,
    Token,
}

/// 可调用的合约函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Deposit,
    Withdraw,
    Approve,
    Revoke,
    RefundEth,
    ApproveMax,
    ApproveMaxMinusOne,
    ApproveZeroThenMax,
    ApproveZeroThenMaxMinusOne,
}

impl OperationKind {
    pub fn argument_shape(&self) -> ArgumentShape {
        match self {
            OperationKind::Deposit | OperationKind::RefundEth => ArgumentShape::None,
            OperationKind::Withdraw => ArgumentShape::Amount,
            OperationKind::Approve | OperationKind::Revoke => ArgumentShape::SpenderAmount,
            OperationKind::ApproveMax
            | OperationKind::ApproveMaxMinusOne
            | OperationKind::ApproveZeroThenMax
            | OperationKind::ApproveZeroThenMaxMinusOne => ArgumentShape::Token,
        }
    }

    /// 是否随交易附带随机金额作为 msg.value
    pub fn carries_value(&self) -> bool {
        matches!(self, OperationKind::Deposit | OperationKind::RefundEth)
    }

    /// 执行前是否需要先检查包装资产余额 (unwrap 余额为0必然回滚)
    pub fn requires_balance_check(&self) -> bool {
        matches!(self, OperationKind::Withdraw)
    }

    /// ABI 中的函数名
    pub fn function_name(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Withdraw => "withdraw",
            OperationKind::Approve | OperationKind::Revoke => "approve",
            OperationKind::RefundEth => "refundETH",
            OperationKind::ApproveMax => "approveMax",
            OperationKind::ApproveMaxMinusOne => "approveMaxMinusOne",
            OperationKind::ApproveZeroThenMax => "approveZeroThenMax",
            OperationKind::ApproveZeroThenMaxMinusOne => "approveZeroThenMaxMinusOne",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Revoke => write!(f, "revoke"),
            other => write!(f, "{}", other.function_name()),
        }
    }
}

/// 目录中的合约操作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractAction {
    /// 链内唯一标识
    pub key: String,
    pub address: Address,
    pub name: String,
    pub kinds: Vec<OperationKind>,
    pub description: String,
}

/// 单次迭代的候选操作
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateOperation {
    pub action: ContractAction,
    pub kind: OperationKind,
    /// 随机金额 (wei)
    pub amount: U256,
}

impl fmt::Display for CandidateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.action.name, self.kind)
    }
}

/// 错误类型
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("RPC call failed: {0}")]
    RpcError(String),

    #[error("Transaction failed: {0}")]
    TransactionError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Starting balance is zero for {0:?}")]
    EmptyWallet(Address),
}

impl AutomationError {
    /// 节点报告签名账户无法支付 value + gas
    pub fn is_insufficient_funds(&self) -> bool {
        self.to_string().to_lowercase().contains("insufficient funds")
    }
}

impl From<config::ConfigError> for AutomationError {
    fn from(err: config::ConfigError) -> Self {
        AutomationError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AutomationError>;
