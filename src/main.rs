//! 链上交易自动化主程序
//!
//! 按配置的链和模式串行发送低成本交易，每笔交易前检查 gas 费用上限。

mod core;
mod strategy;
mod utils;

use crate::core::{
    executor::{LedgerClient, MempoolClient},
    AutomationEngine,
};
use eyre::Result;
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use strategy::{
    budget::GasBudget,
    catalog::resolve_mode,
    config::{ConfigManager, ReportFormat},
    pacing::TokioSleeper,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志系统
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("===========================================");
    info!("   TRANSACTION AUTOMATION                  ");
    info!("===========================================");

    let config = ConfigManager::load()?;
    ConfigManager::print_config_summary(&config);

    let mut chain = config.chain.profile();
    if let Some(rpc_url) = &config.rpc_url {
        chain.rpc_url = rpc_url.clone();
    }
    let catalog = config.chain.contract_actions();
    let mode = resolve_mode(&config.mode, &catalog)?;

    info!("[PRICE] {}: ${}", chain.native_symbol, chain.native_price_usd);
    let budget = GasBudget::new(config.max_gas_cost_usd, chain.native_price_usd)?;
    info!(
        "[GAS] Limit: ${} ({:.6} {})",
        budget.ceiling_usd(),
        budget.ceiling_native(),
        chain.native_symbol
    );

    info!("[CONNECT] Connecting to {}...", chain.name);
    let client = MempoolClient::connect(&chain, &config.private_key).await?;
    info!("[WALLET] Address: {:?}", client.address());

    let mut engine = AutomationEngine::new(
        Arc::new(client),
        Arc::new(TokioSleeper),
        chain.clone(),
        catalog,
        mode,
        budget,
        config.skip_pause,
        StdRng::from_entropy(),
    );

    let summary = engine.run(config.iterations).await?;
    match config.report_format {
        ReportFormat::Text => summary.log_report(&chain),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}
