pub mod engine;
pub mod executor;
pub mod types;

pub use engine::*;
pub use types::*;
