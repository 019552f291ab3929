pub mod aop;
pub mod components;
pub mod engine;
pub mod types;

pub use components::*;
pub use engine::RuleDesk;
pub use types::*;
