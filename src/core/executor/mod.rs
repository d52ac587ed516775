//! 执行器模块
//!
//! 负责交易编码、签名提交和收据确认

pub mod calls;
pub mod mempool;
pub mod submitter;
pub mod traits;
pub mod types;

// 重新导出主要的公共接口
pub use mempool::*;
pub use submitter::*;
pub use traits::*;
pub use types::*;
