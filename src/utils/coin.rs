use ethers::types::U256;

const WEI_PER_NATIVE: f64 = 1e18;

/// wei -> 原生资产数量 (展示用，精度有损失)
pub fn wei_to_native(wei: U256) -> f64 {
    wei.low_u128() as f64 / WEI_PER_NATIVE
}

pub fn wei_to_usd(wei: U256, native_price_usd: f64) -> f64 {
    wei_to_native(wei) * native_price_usd
}

pub fn format_native(wei: U256, symbol: &str) -> String {
    format!("{:.6} {}", wei_to_native(wei), symbol)
}

/// 例如 `0.000021 ETH ($0.0735)`
pub fn format_native_with_usd(wei: U256, symbol: &str, native_price_usd: f64) -> String {
    format!(
        "{} (${:.4})",
        format_native(wei, symbol),
        wei_to_usd(wei, native_price_usd)
    )
}
