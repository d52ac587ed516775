//! 选择、预算、节奏和统计策略

pub mod budget;
pub mod catalog;
pub mod config;
pub mod pacing;
pub mod selector;
pub mod stats;
