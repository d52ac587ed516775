//! 验证工具

/// 验证私钥格式 (64位十六进制，可带 0x 前缀)
pub fn is_valid_private_key(private_key: &str) -> bool {
    let hex_part = private_key.strip_prefix("0x").unwrap_or(private_key);
    hex_part.len() == 64 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// 验证 HTTP(S) RPC URL
pub fn is_valid_rpc_url(url: &str) -> bool {
    if let Ok(parsed) = url::Url::parse(url) {
        matches!(parsed.scheme(), "http" | "https")
    } else {
        false
    }
}
