//! 通用工具模块

pub mod coin;
pub mod validation;
