//! 公共内存池客户端实现

use super::{calls, traits::LedgerClient, types::Receipt};
use crate::core::types::{AutomationError, ChainProfile, Result};
use async_trait::async_trait;
use ethers::{
    middleware::signer::SignerMiddlewareError,
    prelude::*,
    types::{transaction::eip2718::TypedTransaction, TransactionRequest},
};
use log::{debug, warn};

/// 通过 HTTP RPC 直接提交交易到公共内存池
pub struct MempoolClient {
    client: SignerMiddleware<Provider<Http>, LocalWallet>,
}

impl MempoolClient {
    /// 连接节点并绑定签名钱包
    pub async fn connect(chain: &ChainProfile, private_key: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(chain.rpc_url.as_str())
            .map_err(|e| AutomationError::Connection(format!("Failed to connect to RPC: {}", e)))?;

        match provider.get_chainid().await {
            Ok(remote) if remote != U256::from(chain.chain_id) => {
                warn!(
                    "Chain id mismatch: {} reports {}, expected {}",
                    chain.rpc_url, remote, chain.chain_id
                );
            }
            Ok(_) => {}
            Err(e) => {
                return Err(AutomationError::Connection(format!(
                    "Failed to reach {}: {}",
                    chain.rpc_url, e
                )))
            }
        }

        let wallet = private_key
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| AutomationError::ConfigError(format!("Invalid private key: {}", e)))?
            .with_chain_id(chain.chain_id);

        Ok(Self {
            client: SignerMiddleware::new(provider, wallet),
        })
    }
}

fn rpc_error(context: &str) -> impl FnOnce(SignerMiddlewareError<Provider<Http>, LocalWallet>) -> AutomationError + '_ {
    move |e| AutomationError::RpcError(format!("{}: {}", context, e))
}

#[async_trait]
impl LedgerClient for MempoolClient {
    fn address(&self) -> Address {
        self.client.address()
    }

    async fn get_balance(&self, owner: Address) -> Result<U256> {
        self.client
            .get_balance(owner, None)
            .await
            .map_err(rpc_error("getBalance"))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(token)
            .data(calls::encode_balance_of(owner)?)
            .into();
        let output = self.client.call(&tx, None).await.map_err(rpc_error("balanceOf"))?;
        calls::decode_balance_of(&output)
    }

    async fn fee_price(&self) -> Result<U256> {
        self.client.get_gas_price().await.map_err(rpc_error("gasPrice"))
    }

    async fn estimate_gas(&self, call: &TypedTransaction) -> Result<U256> {
        self.client
            .estimate_gas(call, None)
            .await
            .map_err(rpc_error("estimateGas"))
    }

    async fn submit(&self, call: TypedTransaction) -> Result<H256> {
        let pending = self
            .client
            .send_transaction(call, None)
            .await
            .map_err(rpc_error("sendTransaction"))?;
        let hash = pending.tx_hash();
        debug!("Transaction broadcast: {:?}", hash);
        Ok(hash)
    }

    async fn await_receipt(&self, hash: H256) -> Result<Receipt> {
        let receipt = PendingTransaction::new(hash, self.client.provider())
            .await
            .map_err(|e| AutomationError::TransactionError(format!("{:?}: {}", hash, e)))?
            .ok_or_else(|| {
                AutomationError::TransactionError(format!("{:?} dropped from mempool", hash))
            })?;

        // 旧节点的收据没有 effectiveGasPrice，退回交易本身的 gasPrice
        let fallback_price = match receipt.effective_gas_price {
            Some(_) => None,
            None => match self.client.get_transaction(hash).await {
                Ok(tx) => tx.and_then(|tx| tx.gas_price),
                Err(e) => {
                    warn!("Failed to fetch {:?} for gas price: {}", hash, e);
                    None
                }
            },
        };

        Ok(Receipt {
            transaction_hash: receipt.transaction_hash,
            status: receipt.status,
            gas_used: resolve_gas_used(hash, receipt.gas_used),
            effective_gas_price: resolve_gas_price(hash, receipt.effective_gas_price, fallback_price),
        })
    }
}

fn resolve_gas_used(hash: H256, gas_used: Option<U256>) -> U256 {
    gas_used.unwrap_or_else(|| {
        warn!("{:?} receipt has no gasUsed, cost recorded as 0", hash);
        U256::zero()
    })
}

fn resolve_gas_price(hash: H256, effective: Option<U256>, fallback: Option<U256>) -> U256 {
    effective.or(fallback).unwrap_or_else(|| {
        warn!("{:?} has no gas price in receipt or transaction, cost recorded as 0", hash);
        U256::zero()
    })
}
