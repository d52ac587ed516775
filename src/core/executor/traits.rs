//! 链上访问trait定义

use super::types::Receipt;
use crate::core::types::Result;
use async_trait::async_trait;
use ethers::types::{transaction::eip2718::TypedTransaction, Address, H256, U256};

/// 远端账本客户端
///
/// 私钥只存在于实现内部，核心逻辑只能通过 `submit` 间接签名发送。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// 签名账户地址
    fn address(&self) -> Address;

    /// 原生资产余额
    async fn get_balance(&self, owner: Address) -> Result<U256>;

    /// ERC20 `balanceOf`
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;

    /// 当前 gas 单价
    async fn fee_price(&self) -> Result<U256>;

    async fn estimate_gas(&self, call: &TypedTransaction) -> Result<U256>;

    /// 签名并发送，返回交易哈希
    async fn submit(&self, call: TypedTransaction) -> Result<H256>;

    /// 阻塞等待交易上链
    async fn await_receipt(&self, hash: H256) -> Result<Receipt>;
}
