//! 调用数据编码
//!
//! 每种 `OperationKind` 对应一个固定的 ABI 函数和参数形态，固定参数
//! (spender、approve 数量、revoke 数量) 都是常量，不从链上推导。

use crate::core::types::{AutomationError, CandidateOperation, ChainProfile, OperationKind, Result};
use ethers::{
    abi::parse_abi,
    contract::BaseContract,
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256},
};
use once_cell::sync::Lazy;

/// WETH / WHYPE
static WRAPPED_NATIVE: Lazy<BaseContract> = Lazy::new(|| {
    BaseContract::from(
        parse_abi(&[
            "function deposit() external payable",
            "function withdraw(uint256 amount) external",
            "function approve(address spender, uint256 amount) external returns (bool)",
            "function balanceOf(address account) external view returns (uint256)",
        ])
        .expect("wrapped native abi is valid"),
    )
});

/// Uniswap V3 SwapRouter02
static SWAP_ROUTER: Lazy<BaseContract> = Lazy::new(|| {
    BaseContract::from(
        parse_abi(&[
            "function refundETH() external payable",
            "function approveMax(address token) external payable",
            "function approveMaxMinusOne(address token) external payable",
            "function approveZeroThenMax(address token) external payable",
            "function approveZeroThenMaxMinusOne(address token) external payable",
        ])
        .expect("swap router abi is valid"),
    )
});

/// approve / revoke 的 spender：Base 上的 Uniswap V3 Router
pub static UNISWAP_V3_ROUTER: Lazy<Address> = Lazy::new(|| {
    "0x2626664c2603336E57B271c5C0b26F421741e481"
        .parse()
        .expect("router address is valid")
});

/// approve 固定数量：1 个完整代币
pub fn approve_amount() -> U256 {
    U256::exp10(18)
}

fn encoding_error(kind: OperationKind) -> impl FnOnce(ethers::contract::AbiError) -> AutomationError {
    move |e| AutomationError::EncodingError(format!("{}: {}", kind, e))
}

/// 编码调用数据
pub fn encode_call(kind: OperationKind, amount: U256, token: Address) -> Result<Bytes> {
    let name = kind.function_name();
    match kind {
        OperationKind::Deposit => WRAPPED_NATIVE.encode(name, ()),
        OperationKind::Withdraw => WRAPPED_NATIVE.encode(name, amount),
        OperationKind::Approve => WRAPPED_NATIVE.encode(name, (*UNISWAP_V3_ROUTER, approve_amount())),
        OperationKind::Revoke => WRAPPED_NATIVE.encode(name, (*UNISWAP_V3_ROUTER, U256::zero())),
        OperationKind::RefundEth => SWAP_ROUTER.encode(name, ()),
        OperationKind::ApproveMax
        | OperationKind::ApproveMaxMinusOne
        | OperationKind::ApproveZeroThenMax
        | OperationKind::ApproveZeroThenMaxMinusOne => SWAP_ROUTER.encode(name, token),
    }
    .map_err(encoding_error(kind))
}

/// 构建未签名交易，gas limit 由调用方按估算值设置
pub fn build_transaction(
    chain: &ChainProfile,
    candidate: &CandidateOperation,
    sender: Address,
) -> Result<TypedTransaction> {
    let data = encode_call(candidate.kind, candidate.amount, chain.wrapped_asset)?;
    let value = if candidate.kind.carries_value() {
        candidate.amount
    } else {
        U256::zero()
    };

    let tx = TransactionRequest::new()
        .from(sender)
        .to(candidate.action.address)
        .value(value)
        .data(data)
        .chain_id(chain.chain_id);

    Ok(tx.into())
}

pub fn encode_balance_of(owner: Address) -> Result<Bytes> {
    WRAPPED_NATIVE
        .encode("balanceOf", owner)
        .map_err(|e| AutomationError::EncodingError(format!("balanceOf: {}", e)))
}

pub fn decode_balance_of(output: &Bytes) -> Result<U256> {
    WRAPPED_NATIVE
        .decode_output("balanceOf", output)
        .map_err(|e| AutomationError::EncodingError(format!("balanceOf output: {}", e)))
}
